use ledlink_core::{Channel, DeviceConfig, OutputSink};
use ledlink_server::{spawn_control_loop, Controller};
use ledlink_web::{serve, WebState};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Host port; 80 needs privileges on most systems.
const HOST_HTTP_PORT: u16 = 8080;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,ledlink_server=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("ledlink starting...");

    // Configuration
    let config = DeviceConfig {
        http_port: HOST_HTTP_PORT,
        ..Default::default()
    };
    config.validate()?;

    let http_addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.http_port));
    let controller = Arc::new(Controller::new(config.pins));

    // Control loop: reaping sweep + pin writes
    let loop_handle = spawn_control_loop(
        controller.clone(),
        SimulatedPins::default(),
        Duration::from_millis(config.loop_interval_ms),
    );

    // Page + socket server
    let listener = tokio::net::TcpListener::bind(http_addr).await?;
    tracing::info!("HTTP server listening on {}", http_addr);
    let state = WebState::new(controller, config.client_queue).with_ws_path(config.ws_path.clone());
    let http_handle = tokio::spawn(async move {
        if let Err(e) = serve(listener, state).await {
            tracing::error!("HTTP server error: {}", e);
        }
    });

    tracing::info!("ledlink ready!");
    tracing::info!("   Page:   http://localhost:{}/", config.http_port);
    tracing::info!("   Socket: ws://localhost:{}{}", config.http_port, config.ws_path);

    // Wait for shutdown signal
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        _ = loop_handle => {
            tracing::warn!("Control loop stopped");
        }
        _ = http_handle => {
            tracing::warn!("HTTP server stopped");
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Stand-in for GPIO on a host: logs level changes, writes nothing.
#[derive(Default)]
struct SimulatedPins {
    last: [Option<bool>; Channel::COUNT],
}

impl OutputSink for SimulatedPins {
    type Error = std::convert::Infallible;

    fn set_level(&mut self, channel: Channel, pin: u8, level: bool) -> Result<(), Self::Error> {
        let slot = &mut self.last[channel.index()];
        if *slot != Some(level) {
            tracing::info!(
                "GPIO{} ({}) -> {}",
                pin,
                channel,
                if level { "HIGH" } else { "LOW" }
            );
            *slot = Some(level);
        }
        Ok(())
    }
}
