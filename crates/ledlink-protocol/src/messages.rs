//! Protocol message types for socket communication.
//!
//! Two messages exist, both JSON over text frames:
//! - Client → Server: [`ToggleRequest`] `{"id": 2}`
//! - Server → Client: [`ChannelStatus`] `{"id": 2, "state": 1}`
//!
//! The server never answers a toggle directly. Every successful toggle and
//! every new connection produces one `ChannelStatus` per channel, sent to all
//! connected clients.

use serde::{Deserialize, Serialize};

use ledlink_core::{Channel, Snapshot};

/// Request to flip one channel.
///
/// `id` is kept as a raw integer so that unknown channels survive decoding and
/// can be reported separately from malformed payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleRequest {
    pub id: i64,
}

/// Current level of one channel.
///
/// # Example
/// ```json
/// {"id":1,"state":0}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelStatus {
    pub id: Channel,
    #[serde(with = "level")]
    pub state: bool,
}

impl ChannelStatus {
    pub fn new(channel: Channel, state: bool) -> Self {
        Self { id: channel, state }
    }

    /// One status per channel, in channel order.
    pub fn from_snapshot(snapshot: &Snapshot) -> [ChannelStatus; Channel::COUNT] {
        snapshot.map(|(channel, state)| ChannelStatus::new(channel, state))
    }
}

/// Levels travel as `0`/`1`, not as JSON booleans.
mod level {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(state: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*state))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match u8::deserialize(deserializer)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(de::Error::invalid_value(
                de::Unexpected::Unsigned(u64::from(other)),
                &"0 or 1",
            )),
        }
    }
}
