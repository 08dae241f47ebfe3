//! Text-frame codec for the ledlink protocol.
//!
//! Frames are JSON text. This module turns inbound frame payloads into
//! [`ToggleRequest`]s and channel snapshots into outbound frames.

use serde_json::Value;
use thiserror::Error;

use ledlink_core::Snapshot;

use crate::messages::{ChannelStatus, ToggleRequest};

/// Errors that can occur during message encoding/decoding.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Payload is not valid UTF-8.
    #[error("Frame is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// Payload is valid JSON but not an object.
    #[error("Expected a JSON object")]
    NotAnObject,

    /// Payload is not JSON, or the object has no integer `id`.
    #[error("Malformed message: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decode a toggle request from a text frame payload.
///
/// Only a JSON object is accepted; `[2]` is rejected even though serde would
/// read it as a one-field struct.
pub fn decode_toggle(payload: &[u8]) -> Result<ToggleRequest, CodecError> {
    let text = std::str::from_utf8(payload)?;
    match serde_json::from_str::<Value>(text)? {
        object @ Value::Object(_) => serde_json::from_value(object).map_err(CodecError::from),
        _ => Err(CodecError::NotAnObject),
    }
}

/// Encode one channel status for transmission.
pub fn encode_status(status: &ChannelStatus) -> Result<String, CodecError> {
    serde_json::to_string(status).map_err(CodecError::from)
}

/// Encode a full snapshot: one frame per channel, in channel order.
pub fn snapshot_messages(snapshot: &Snapshot) -> Result<Vec<String>, CodecError> {
    ChannelStatus::from_snapshot(snapshot)
        .iter()
        .map(encode_status)
        .collect()
}
