//! Integration tests for the ledlink web server.
//!
//! These tests start an actual server and connect with WebSocket clients
//! to verify end-to-end functionality.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::MaybeTlsStream;
use tokio_tungstenite::WebSocketStream;

use ledlink_core::PinMap;
use ledlink_server::Controller;
use ledlink_web::{serve, SharedController, WebState};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Start a test server on an ephemeral port.
async fn start_test_server() -> (SocketAddr, SharedController, tokio::task::JoinHandle<()>) {
    start_server_with_queue(32).await
}

async fn start_server_with_queue(
    client_queue: usize,
) -> (SocketAddr, SharedController, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let controller: SharedController = Arc::new(Controller::new(PinMap::default()));
    let state = WebState::new(controller.clone(), client_queue);

    let handle = tokio::spawn(async move {
        let _ = serve(listener, state).await;
    });

    (addr, controller, handle)
}

async fn connect_client(addr: SocketAddr) -> Client {
    let url = format!("ws://{}/ws", addr);
    let (ws_stream, _) = tokio_tungstenite::connect_async(&url)
        .await
        .expect("Failed to connect");
    ws_stream
}

/// Wait for a text message with timeout.
async fn recv_text(ws: &mut Client) -> Result<String, &'static str> {
    match timeout(Duration::from_secs(5), ws.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => Ok(text),
        Ok(Some(Ok(_))) => Err("Unexpected message type"),
        Ok(Some(Err(_))) => Err("WebSocket error"),
        Ok(None) => Err("Connection closed"),
        Err(_) => Err("Timeout"),
    }
}

/// Receive one three-message snapshot as parsed JSON values.
async fn recv_snapshot(ws: &mut Client) -> Vec<serde_json::Value> {
    let mut messages = Vec::new();
    for _ in 0..3 {
        let text = recv_text(ws).await.expect("Should receive status");
        messages.push(serde_json::from_str(&text).expect("Valid JSON"));
    }
    messages
}

fn expected(levels: [u8; 3]) -> Vec<serde_json::Value> {
    levels
        .iter()
        .enumerate()
        .map(|(i, state)| serde_json::json!({ "id": i + 1, "state": state }))
        .collect()
}

/// Assert nothing arrives within a short window.
async fn assert_silent(ws: &mut Client) {
    let result = timeout(Duration::from_millis(200), ws.next()).await;
    assert!(result.is_err(), "Expected no message, got {:?}", result);
}

async fn send_json(ws: &mut Client, value: serde_json::Value) {
    ws.send(Message::Text(value.to_string()))
        .await
        .expect("Should send");
}

#[tokio::test]
async fn test_initial_state_on_connect() {
    let (addr, _controller, handle) = start_test_server().await;

    let mut ws = connect_client(addr).await;

    assert_eq!(recv_snapshot(&mut ws).await, expected([0, 0, 0]));
    assert_silent(&mut ws).await;

    ws.close(None).await.ok();
    handle.abort();
}

#[tokio::test]
async fn test_tiny_queue_still_delivers_full_snapshot() {
    let (addr, _controller, handle) = start_server_with_queue(1).await;

    let mut ws = connect_client(addr).await;

    assert_eq!(recv_snapshot(&mut ws).await, expected([0, 0, 0]));

    ws.close(None).await.ok();
    handle.abort();
}

#[tokio::test]
async fn test_toggle_round_trip() {
    let (addr, controller, handle) = start_test_server().await;

    let mut ws = connect_client(addr).await;
    let _ = recv_snapshot(&mut ws).await;

    send_json(&mut ws, serde_json::json!({ "id": 2 })).await;

    assert_eq!(recv_snapshot(&mut ws).await, expected([0, 1, 0]));
    assert!(controller.snapshot()[1].1);

    ws.close(None).await.ok();
    handle.abort();
}

#[tokio::test]
async fn test_toggle_reaches_every_client() {
    let (addr, _controller, handle) = start_test_server().await;

    let mut a = connect_client(addr).await;
    assert_eq!(recv_snapshot(&mut a).await, expected([0, 0, 0]));

    // B's connect is broadcast to A as well
    let mut b = connect_client(addr).await;
    assert_eq!(recv_snapshot(&mut b).await, expected([0, 0, 0]));
    assert_eq!(recv_snapshot(&mut a).await, expected([0, 0, 0]));

    send_json(&mut a, serde_json::json!({ "id": 1 })).await;

    assert_eq!(recv_snapshot(&mut a).await, expected([1, 0, 0]));
    assert_eq!(recv_snapshot(&mut b).await, expected([1, 0, 0]));

    a.close(None).await.ok();
    b.close(None).await.ok();
    handle.abort();
}

#[tokio::test]
async fn test_invalid_messages_are_ignored() {
    let (addr, controller, handle) = start_test_server().await;

    let mut ws = connect_client(addr).await;
    let _ = recv_snapshot(&mut ws).await;

    ws.send(Message::Text("not json".to_string())).await.unwrap();
    send_json(&mut ws, serde_json::json!({ "led": 1 })).await;
    send_json(&mut ws, serde_json::json!({ "id": 0 })).await;
    send_json(&mut ws, serde_json::json!({ "id": 4 })).await;
    ws.send(Message::Binary(br#"{"id":1}"#.to_vec())).await.unwrap();

    assert_silent(&mut ws).await;
    assert_eq!(
        controller.snapshot().map(|(_, level)| level),
        [false, false, false]
    );

    // the next valid request proves nothing was queued in between
    send_json(&mut ws, serde_json::json!({ "id": 3 })).await;
    assert_eq!(recv_snapshot(&mut ws).await, expected([0, 0, 1]));

    ws.close(None).await.ok();
    handle.abort();
}

#[tokio::test]
async fn test_closed_client_removed() {
    let (addr, controller, handle) = start_test_server().await;

    let mut a = connect_client(addr).await;
    let _ = recv_snapshot(&mut a).await;
    let mut b = connect_client(addr).await;
    let _ = recv_snapshot(&mut b).await;
    let _ = recv_snapshot(&mut a).await;
    assert_eq!(controller.client_count(), 2);

    b.close(None).await.ok();
    drop(b);

    // wait for the close to be processed
    for _ in 0..50 {
        if controller.client_count() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(controller.client_count(), 1);

    send_json(&mut a, serde_json::json!({ "id": 2 })).await;
    assert_eq!(recv_snapshot(&mut a).await, expected([0, 1, 0]));

    a.close(None).await.ok();
    handle.abort();
}

#[tokio::test]
async fn test_index_page_over_http() {
    let (addr, _controller, handle) = start_test_server().await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();

    let mut response = String::new();
    timeout(Duration::from_secs(5), stream.read_to_string(&mut response))
        .await
        .expect("Timeout")
        .unwrap();

    assert!(response.starts_with("HTTP/1.1 200 OK"));
    assert!(response.contains("text/html"));
    assert!(response.contains("new WebSocket("));

    handle.abort();
}
