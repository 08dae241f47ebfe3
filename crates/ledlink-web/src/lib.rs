//! # ledlink-web
//!
//! HTTP page server and socket endpoint for ledlink.
//!
//! This crate provides:
//! - `GET /` - the embedded control page
//! - `GET /ws` - the socket endpoint (WebSocket upgrade)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ledlink_web::{serve, WebState};
//!
//! let state = WebState::new(controller, config.client_queue);
//! let listener = TcpListener::bind("0.0.0.0:80").await?;
//! serve(listener, state).await?;
//! ```

pub mod routes;

// Re-exports
pub use routes::create_router;

use std::sync::Arc;

use ledlink_server::{Channel, Controller};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// Controller whose clients are tokio `mpsc` queues.
pub type SharedController = Arc<Controller<mpsc::Sender<String>>>;

/// Shared state for all route handlers.
#[derive(Clone)]
pub struct WebState {
    pub controller: SharedController,
    /// Outbound frames buffered per client; never less than one snapshot.
    pub client_queue: usize,
    /// Path of the socket endpoint.
    pub ws_path: String,
}

impl WebState {
    pub fn new(controller: SharedController, client_queue: usize) -> Self {
        Self {
            controller,
            client_queue: client_queue.max(Channel::COUNT),
            ws_path: routes::WS_PATH.to_string(),
        }
    }

    /// Serve the socket endpoint somewhere other than `/ws`.
    pub fn with_ws_path(mut self, path: impl Into<String>) -> Self {
        self.ws_path = path.into();
        self
    }
}

/// Serve the page and socket endpoint until the listener fails.
pub async fn serve(listener: TcpListener, state: WebState) -> std::io::Result<()> {
    let app = create_router(state);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
}
