//! Socket events delivered by a network runtime.
//!
//! Each runtime (axum on Linux, esp-idf on ESP32) translates its own callbacks
//! into [`SocketEvent`]s and hands them to [`crate::Controller::dispatch`].

use std::net::SocketAddr;

use crate::connection::ClientId;

/// Largest payload handed to the message handler; toggle requests are a few
/// bytes.
pub const MAX_FRAME_LEN: usize = 256;

/// Frame opcode as reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Text,
    Binary,
    Continuation,
}

/// One received data frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    pub kind: FrameKind,
    /// Set on the last (or only) fragment of a message.
    pub fin: bool,
    pub payload: &'a [u8],
}

impl<'a> Frame<'a> {
    pub fn new(kind: FrameKind, fin: bool, payload: &'a [u8]) -> Self {
        Self { kind, fin, payload }
    }

    /// A complete text message.
    pub fn text(text: &'a str) -> Self {
        Self::new(FrameKind::Text, true, text.as_bytes())
    }

    /// A complete binary message.
    pub fn binary(payload: &'a [u8]) -> Self {
        Self::new(FrameKind::Binary, true, payload)
    }

    pub fn is_oversized(&self) -> bool {
        self.payload.len() > MAX_FRAME_LEN
    }

    /// Whether this frame carries a whole text message on its own.
    pub fn is_complete_text(&self) -> bool {
        self.kind == FrameKind::Text && self.fin
    }
}

/// Something that happened on a client socket.
#[derive(Debug)]
pub enum SocketEvent<'a, S> {
    /// Handshake finished; `sink` is the client's outbound half.
    Connect {
        id: ClientId,
        peer: Option<SocketAddr>,
        sink: S,
    },
    /// The client closed the connection.
    Disconnect { id: ClientId },
    /// A data frame arrived.
    Data { id: ClientId, frame: Frame<'a> },
    /// Keep-alive answer; carries no state.
    Pong { id: ClientId },
    /// The transport reported a protocol or I/O error.
    Error { id: ClientId, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_text_only() {
        assert!(Frame::text("{}").is_complete_text());
        assert!(!Frame::binary(b"{}").is_complete_text());
        assert!(!Frame::new(FrameKind::Text, false, b"{").is_complete_text());
        assert!(!Frame::new(FrameKind::Continuation, true, b"}").is_complete_text());
    }

    #[test]
    fn test_oversized() {
        let at_limit = "x".repeat(MAX_FRAME_LEN);
        let over = "x".repeat(MAX_FRAME_LEN + 1);
        assert!(!Frame::text(&at_limit).is_oversized());
        assert!(Frame::text(&over).is_oversized());
    }
}
