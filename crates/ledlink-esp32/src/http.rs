//! HTTP page and socket handlers for the ESP32 build.
//!
//! `EspHttpServer` calls the ws handler once per event on a connection: first
//! with `is_new()`, then once per received frame, finally with `is_closed()`.
//! Each call is translated into one `SocketEvent` for the shared controller.

use std::sync::Arc;

use anyhow::Result;
use esp_idf_svc::{
    http::{
        server::{
            ws::{EspHttpWsConnection, EspHttpWsDetachedSender},
            Configuration, EspHttpServer,
        },
        Method,
    },
    io::Write,
    sys::{EspError, ESP_ERR_INVALID_SIZE},
};
use embedded_svc::ws::FrameType;
use log::{info, warn};

use ledlink_core::DeviceConfig;
use ledlink_protocol::{index_page, INDEX_CONTENT_TYPE};
use ledlink_server::{
    ClientId, ClientSink, Controller, Frame, FrameKind, SendError, SocketEvent, MAX_FRAME_LEN,
};

/// Largest frame read off the socket. Frames above [`MAX_FRAME_LEN`] are read
/// and then discarded by the controller; only frames that cannot be buffered
/// at all end the session.
const MAX_DRAIN_LEN: usize = 4096;

/// Controller whose clients are esp-idf detached ws senders.
pub type EspController = Controller<EspWsSink>;

/// Outbound half of one ws connection.
pub struct EspWsSink {
    sender: EspHttpWsDetachedSender,
}

impl ClientSink for EspWsSink {
    fn try_send_text(&mut self, text: &str) -> Result<(), SendError> {
        if self.sender.is_closed() {
            return Err(SendError::Closed);
        }
        // httpd queues the frame; a failure here means its work queue is full
        self.sender
            .send(FrameType::Text(false), text.as_bytes())
            .map_err(|_| SendError::Full)
    }

    fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }
}

/// Start the HTTP server with the page at `/` and the socket at
/// `config.ws_path`.
///
/// The returned server must be kept alive.
pub fn start_http_server(
    controller: Arc<EspController>,
    config: &DeviceConfig,
) -> Result<EspHttpServer<'static>> {
    let mut server = EspHttpServer::new(&Configuration {
        http_port: config.http_port,
        ..Default::default()
    })?;

    let page = index_page(&config.ws_path);
    server.fn_handler("/", Method::Get, move |req| -> anyhow::Result<()> {
        req.into_response(200, Some("OK"), &[("Content-Type", INDEX_CONTENT_TYPE)])?
            .write_all(page.as_bytes())?;
        Ok(())
    })?;

    server.ws_handler(&config.ws_path, move |ws: &mut EspHttpWsConnection| {
        handle_ws_event(&controller, ws)
    })?;

    info!(
        "HTTP server on port {} (socket at {})",
        config.http_port, config.ws_path
    );
    Ok(server)
}

fn handle_ws_event(controller: &EspController, ws: &mut EspHttpWsConnection) -> Result<(), EspError> {
    let id = ClientId(ws.session() as u32);

    if ws.is_new() {
        let sink = EspWsSink {
            sender: ws.create_detached_sender()?,
        };
        controller.dispatch(SocketEvent::Connect {
            id,
            peer: None,
            sink,
        });
        return Ok(());
    }

    if ws.is_closed() {
        controller.dispatch(SocketEvent::Disconnect { id });
        return Ok(());
    }

    let (frame_type, len) = ws.recv(&mut [])?;
    if len > MAX_DRAIN_LEN {
        warn!("Client {} sent a {} byte frame, closing", id, len);
        controller.dispatch(SocketEvent::Error {
            id,
            reason: format!("frame of {} bytes", len),
        });
        return Err(EspError::from_infallible::<ESP_ERR_INVALID_SIZE>());
    }

    let mut small = [0u8; MAX_FRAME_LEN];
    let mut large = Vec::new();
    let buf: &mut [u8] = if len <= MAX_FRAME_LEN {
        &mut small[..len]
    } else {
        large.resize(len, 0);
        large.as_mut_slice()
    };
    if len > 0 {
        ws.recv(buf)?;
    }
    let payload: &[u8] = buf;

    let frame = match frame_type {
        FrameType::Text(fragmented) => Frame::new(FrameKind::Text, !fragmented, payload),
        FrameType::Binary(fragmented) => Frame::new(FrameKind::Binary, !fragmented, payload),
        FrameType::Continue(last) => Frame::new(FrameKind::Continuation, last, payload),
        FrameType::Pong => {
            controller.dispatch(SocketEvent::Pong { id });
            return Ok(());
        }
        FrameType::Close | FrameType::SocketClose => {
            controller.dispatch(SocketEvent::Disconnect { id });
            return Ok(());
        }
        // answered by httpd
        FrameType::Ping => return Ok(()),
    };

    controller.dispatch(SocketEvent::Data { id, frame });
    Ok(())
}
