//! Socket endpoint.
//!
//! Each upgraded connection gets a bounded outbound queue registered with the
//! controller as its sink. The session task forwards inbound frames to the
//! controller and drains the queue into the socket. When the controller drops
//! a client (error or sweep) the queue closes and the session ends.

use std::net::SocketAddr;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::debug;

use ledlink_server::{ClientId, Frame, SocketEvent};

use crate::{SharedController, WebState};

/// Handler for `GET /ws`.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    State(state): State<WebState>,
) -> impl IntoResponse {
    let peer = connect_info.map(|ConnectInfo(addr)| addr);
    ws.on_upgrade(move |socket| handle_socket(socket, peer, state))
}

/// Run one client session until either side goes away.
async fn handle_socket(socket: WebSocket, peer: Option<SocketAddr>, state: WebState) {
    let controller = state.controller;
    let id = controller.next_client_id();
    let (tx, mut rx) = mpsc::channel::<String>(state.client_queue);
    let (mut ws_tx, mut ws_rx) = socket.split();

    controller.dispatch(SocketEvent::Connect { id, peer, sink: tx });

    loop {
        tokio::select! {
            outbound = rx.recv() => {
                match outbound {
                    Some(text) => {
                        if let Err(e) = ws_tx.send(Message::Text(text)).await {
                            controller.dispatch(SocketEvent::Error { id, reason: e.to_string() });
                            break;
                        }
                    }
                    None => {
                        debug!("Client {} dropped by controller", id);
                        break;
                    }
                }
            }

            inbound = ws_rx.next() => {
                if !handle_inbound(&controller, id, inbound) {
                    break;
                }
            }
        }
    }

    ws_tx.close().await.ok();
}

/// Translate one inbound socket item. Returns false once the session is over.
fn handle_inbound(
    controller: &SharedController,
    id: ClientId,
    inbound: Option<Result<Message, axum::Error>>,
) -> bool {
    match inbound {
        Some(Ok(Message::Text(text))) => {
            controller.dispatch(SocketEvent::Data {
                id,
                frame: Frame::text(&text),
            });
            true
        }
        Some(Ok(Message::Binary(data))) => {
            controller.dispatch(SocketEvent::Data {
                id,
                frame: Frame::binary(&data),
            });
            true
        }
        Some(Ok(Message::Pong(_))) => {
            controller.dispatch(SocketEvent::Pong { id });
            true
        }
        // answered by the transport
        Some(Ok(Message::Ping(_))) => true,
        Some(Ok(Message::Close(_))) | None => {
            controller.dispatch(SocketEvent::Disconnect { id });
            false
        }
        Some(Err(e)) => {
            controller.dispatch(SocketEvent::Error {
                id,
                reason: e.to_string(),
            });
            false
        }
    }
}
