//! Device state store.
//!
//! The store holds the current level of every channel. It is mutated only by
//! the message handler and read by the broadcaster and the output writer.
//! Levels are never persisted: every boot starts with all channels off.

use thiserror::Error;

use crate::model::{Channel, Snapshot};

/// Errors reported by the state store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The id does not name a defined channel.
    #[error("Invalid channel id: {0}")]
    InvalidChannel(i64),
}

/// Trait for channel state storage implementations.
pub trait ChannelStore: Send + Sync {
    /// Current level of the channel with the given wire id.
    fn get(&self, id: i64) -> Result<bool, StoreError>;

    /// Flip a known channel and return its new level.
    fn flip(&mut self, channel: Channel) -> bool;

    /// Flip the channel with the given wire id and return its new level.
    ///
    /// Unknown ids leave the store untouched.
    fn toggle(&mut self, id: i64) -> Result<bool, StoreError> {
        let channel = Channel::try_from(id)?;
        Ok(self.flip(channel))
    }

    /// Current level of a known channel.
    fn level(&self, channel: Channel) -> bool;

    /// Levels of all channels in channel order.
    fn snapshot(&self) -> Snapshot;
}

/// In-memory store with one level per channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    levels: [bool; Channel::COUNT],
}

impl MemoryStore {
    /// Create a store with every channel off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of channels currently on.
    pub fn active_count(&self) -> usize {
        self.levels.iter().filter(|on| **on).count()
    }
}

impl ChannelStore for MemoryStore {
    fn get(&self, id: i64) -> Result<bool, StoreError> {
        let channel = Channel::try_from(id)?;
        Ok(self.level(channel))
    }

    fn flip(&mut self, channel: Channel) -> bool {
        let slot = &mut self.levels[channel.index()];
        *slot = !*slot;
        *slot
    }

    fn level(&self, channel: Channel) -> bool {
        self.levels[channel.index()]
    }

    fn snapshot(&self) -> Snapshot {
        Channel::ALL.map(|channel| (channel, self.level(channel)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_store_all_off() {
        let store = MemoryStore::new();
        assert_eq!(
            store.snapshot(),
            [
                (Channel::One, false),
                (Channel::Two, false),
                (Channel::Three, false)
            ]
        );
        assert_eq!(store.active_count(), 0);
    }

    #[test]
    fn test_toggle_negates_each_channel() {
        let mut store = MemoryStore::new();

        for id in 1..=3 {
            let before = store.get(id).unwrap();
            let returned = store.toggle(id).unwrap();
            assert_eq!(returned, !before);
            assert_eq!(store.get(id).unwrap(), !before);
        }
        assert_eq!(store.active_count(), 3);
    }

    #[test]
    fn test_double_toggle_restores_level() {
        let mut store = MemoryStore::new();
        store.toggle(2).unwrap();
        let original = store.clone();

        store.toggle(2).unwrap();
        store.toggle(2).unwrap();

        assert_eq!(store, original);
    }

    #[test]
    fn test_toggle_only_touches_target() {
        let mut store = MemoryStore::new();
        store.toggle(2).unwrap();

        assert_eq!(
            store.snapshot(),
            [
                (Channel::One, false),
                (Channel::Two, true),
                (Channel::Three, false)
            ]
        );
    }

    #[test]
    fn test_unknown_channel_is_rejected_without_mutation() {
        let mut store = MemoryStore::new();
        store.toggle(1).unwrap();
        let before = store.clone();

        assert_eq!(store.toggle(0), Err(StoreError::InvalidChannel(0)));
        assert_eq!(store.toggle(4), Err(StoreError::InvalidChannel(4)));
        assert_eq!(store.get(-5), Err(StoreError::InvalidChannel(-5)));
        assert_eq!(store, before);
    }
}
