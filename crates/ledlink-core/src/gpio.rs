//! Output pin abstraction.
//!
//! The control loop writes every channel's level to its bound pin on every
//! iteration. Writes are unconditional and idempotent; nothing is read back.
//! Platforms provide an [`OutputSink`]: `PinDriver`s on ESP32, a logging
//! simulation on Linux.

use std::fmt;

use thiserror::Error;

use crate::config::PinMap;
use crate::model::{Channel, Snapshot};

/// A set of digital outputs that can be driven high or low.
pub trait OutputSink {
    /// Error reported by a single pin write.
    type Error: fmt::Debug;

    /// Drive the pin bound to `channel` to `level`.
    fn set_level(&mut self, channel: Channel, pin: u8, level: bool) -> Result<(), Self::Error>;
}

/// Result of one pass over all outputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputReport {
    /// Pins written successfully.
    pub written: usize,
    /// Channels whose pin write failed.
    pub failed: Vec<Channel>,
}

impl OutputReport {
    pub fn is_ok(&self) -> bool {
        self.failed.is_empty()
    }
}

/// A pin named by the [`PinMap`] that the board cannot drive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{channel} is bound to pin {pin}, which is not an available output")]
pub struct PinUnavailable {
    pub channel: Channel,
    pub pin: u8,
}

/// Take the outputs bound by `map` out of the board's `available` pins.
///
/// Returns `(pin, output)` pairs in channel order.
pub fn select_outputs<P>(
    map: &PinMap,
    mut available: Vec<(u8, P)>,
) -> Result<Vec<(u8, P)>, PinUnavailable> {
    let mut selected = Vec::with_capacity(Channel::COUNT);
    for channel in Channel::ALL {
        let pin = map.pin(channel);
        let index = available
            .iter()
            .position(|(candidate, _)| *candidate == pin)
            .ok_or(PinUnavailable { channel, pin })?;
        selected.push(available.swap_remove(index));
    }
    Ok(selected)
}

/// Write every level in `snapshot` to its pin.
///
/// A failing pin does not stop the remaining writes.
pub fn apply_levels<S: OutputSink>(snapshot: &Snapshot, pins: &PinMap, sink: &mut S) -> OutputReport {
    let mut report = OutputReport::default();

    for &(channel, level) in snapshot {
        match sink.set_level(channel, pins.pin(channel), level) {
            Ok(()) => report.written += 1,
            Err(_) => report.failed.push(channel),
        }
    }

    report
}
