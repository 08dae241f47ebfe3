//! Channel model.
//!
//! A channel is one of the three independently switchable outputs. Channel ids
//! are what travels over the wire; the mapping to physical pins lives in
//! [`crate::config::PinMap`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::store::StoreError;

/// One switchable output channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub enum Channel {
    One,
    Two,
    Three,
}

/// Levels of every channel, in channel order.
pub type Snapshot = [(Channel, bool); Channel::COUNT];

impl Channel {
    /// Number of defined channels.
    pub const COUNT: usize = 3;

    /// All channels in notification order (1, 2, 3).
    pub const ALL: [Channel; Channel::COUNT] = [Channel::One, Channel::Two, Channel::Three];

    /// Wire identifier of this channel.
    pub fn id(self) -> u8 {
        match self {
            Channel::One => 1,
            Channel::Two => 2,
            Channel::Three => 3,
        }
    }

    /// Zero-based slot used for fixed-size per-channel arrays.
    pub fn index(self) -> usize {
        usize::from(self.id() - 1)
    }
}

impl TryFrom<i64> for Channel {
    type Error = StoreError;

    fn try_from(id: i64) -> Result<Self, Self::Error> {
        match id {
            1 => Ok(Channel::One),
            2 => Ok(Channel::Two),
            3 => Ok(Channel::Three),
            other => Err(StoreError::InvalidChannel(other)),
        }
    }
}

impl From<Channel> for u8 {
    fn from(channel: Channel) -> Self {
        channel.id()
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "channel {}", self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_follow_channel_order() {
        let ids: Vec<u8> = Channel::ALL.iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_try_from_valid() {
        assert_eq!(Channel::try_from(1).unwrap(), Channel::One);
        assert_eq!(Channel::try_from(3).unwrap(), Channel::Three);
    }

    #[test]
    fn test_try_from_out_of_range() {
        for id in [0, 4, -1, i64::MAX] {
            match Channel::try_from(id) {
                Err(StoreError::InvalidChannel(got)) => assert_eq!(got, id),
                other => panic!("expected InvalidChannel for {}, got {:?}", id, other),
            }
        }
    }

    #[test]
    fn test_serde_as_integer() {
        assert_eq!(serde_json::to_string(&Channel::Two).unwrap(), "2");
        let channel: Channel = serde_json::from_str("3").unwrap();
        assert_eq!(channel, Channel::Three);
        assert!(serde_json::from_str::<Channel>("7").is_err());
    }
}
