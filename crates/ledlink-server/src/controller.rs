//! The shared device controller.
//!
//! This module ties the pieces together:
//! - Connection events (connect, disconnect, error)
//! - Toggle messages and the state store
//! - Full-snapshot broadcast to every client
//! - The periodic sweep and output writes driven by the control loop
//!
//! Network callbacks and the control loop run in different contexts, so the
//! store and the connection set sit behind one mutex. Every operation takes
//! the lock once and never holds it across I/O on the output pins.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info, warn};

use ledlink_core::{
    apply_levels, Channel, ChannelStore, MemoryStore, OutputReport, OutputSink, PinMap, Snapshot,
    StoreError,
};
use ledlink_protocol::{decode_toggle, snapshot_messages};

use crate::connection::{BroadcastReport, ClientId, ClientSink, Connection, ConnectionRegistry};
use crate::events::{Frame, FrameKind, SocketEvent};

/// Why an inbound frame produced no state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// Binary or continuation frame.
    NotText,
    /// Text frame that is not the whole message.
    Fragmented,
    /// Payload longer than [`crate::MAX_FRAME_LEN`].
    Oversized(usize),
    /// Not a JSON object with an integer `id`.
    Malformed,
    /// `id` names no channel.
    UnknownChannel(i64),
}

/// Result of handling one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleOutcome {
    Toggled { channel: Channel, level: bool },
    Discarded(DiscardReason),
}

/// Work done by one control-loop iteration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub reaped: usize,
    pub outputs: OutputReport,
}

struct Inner<S> {
    store: MemoryStore,
    connections: ConnectionRegistry<S>,
}

/// Device state plus connected clients, shared by the network runtime and the
/// control loop.
pub struct Controller<S> {
    inner: Mutex<Inner<S>>,
    pins: PinMap,
    next_id: AtomicU32,
}

impl<S: ClientSink> Controller<S> {
    /// Create a controller with every channel off and no clients.
    pub fn new(pins: PinMap) -> Self {
        Self {
            inner: Mutex::new(Inner {
                store: MemoryStore::new(),
                connections: ConnectionRegistry::new(),
            }),
            pins,
            next_id: AtomicU32::new(1),
        }
    }

    /// Allocate a fresh client id for runtimes that have none of their own.
    pub fn next_client_id(&self) -> ClientId {
        ClientId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Poisoned locks are recovered; nothing after boot is fatal.
    fn lock(&self) -> MutexGuard<'_, Inner<S>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Route a socket event to its handler.
    pub fn dispatch(&self, event: SocketEvent<'_, S>) {
        match event {
            SocketEvent::Connect { id, peer, sink } => {
                self.on_connect(id, peer, sink);
            }
            SocketEvent::Disconnect { id } => self.on_disconnect(id),
            SocketEvent::Data { id, frame } => {
                self.on_data(id, frame);
            }
            SocketEvent::Pong { id } => debug!("Pong from client {}", id),
            SocketEvent::Error { id, reason } => self.on_error(id, &reason),
        }
    }

    /// Register a client and broadcast the full snapshot to everyone.
    pub fn on_connect(&self, id: ClientId, peer: Option<SocketAddr>, sink: S) -> BroadcastReport {
        match peer {
            Some(addr) => info!("Client {} connected from {}", id, addr),
            None => info!("Client {} connected", id),
        }

        let mut inner = self.lock();
        inner.connections.insert(Connection::new(id, peer, sink));
        inner.connections.open(id);
        Self::notify_locked(&mut inner)
    }

    pub fn on_disconnect(&self, id: ClientId) {
        if self.lock().connections.remove(id).is_some() {
            info!("Client {} disconnected", id);
        }
    }

    /// Transport failure: the connection is closed like an explicit disconnect.
    pub fn on_error(&self, id: ClientId, reason: &str) {
        warn!("Client {} error: {}", id, reason);
        self.lock().connections.remove(id);
    }

    /// Forward a data frame to the message handler if it is a whole text
    /// message of acceptable size. The connection stays open either way.
    pub fn on_data(&self, id: ClientId, frame: Frame<'_>) -> HandleOutcome {
        let outcome = if frame.is_oversized() {
            HandleOutcome::Discarded(DiscardReason::Oversized(frame.payload.len()))
        } else if frame.is_complete_text() {
            debug!(
                "Client {} sent: {}",
                id,
                String::from_utf8_lossy(frame.payload)
            );
            self.handle_message(frame.payload)
        } else if frame.kind == FrameKind::Text {
            HandleOutcome::Discarded(DiscardReason::Fragmented)
        } else {
            HandleOutcome::Discarded(DiscardReason::NotText)
        };

        if let HandleOutcome::Discarded(reason) = outcome {
            warn!("Discarded frame from client {}: {:?}", id, reason);
        }
        outcome
    }

    /// Parse a toggle request, flip the channel and broadcast.
    ///
    /// Malformed payloads and unknown channels change nothing and send
    /// nothing.
    pub fn handle_message(&self, payload: &[u8]) -> HandleOutcome {
        let request = match decode_toggle(payload) {
            Ok(request) => request,
            Err(_) => return HandleOutcome::Discarded(DiscardReason::Malformed),
        };

        let channel = match Channel::try_from(request.id) {
            Ok(channel) => channel,
            Err(StoreError::InvalidChannel(id)) => {
                return HandleOutcome::Discarded(DiscardReason::UnknownChannel(id))
            }
        };

        let mut inner = self.lock();
        let level = inner.store.flip(channel);
        let report = Self::notify_locked(&mut inner);
        debug!(
            "{} -> {} ({} of {} on), broadcast {:?}",
            channel,
            if level { "on" } else { "off" },
            inner.store.active_count(),
            Channel::COUNT,
            report
        );
        HandleOutcome::Toggled { channel, level }
    }

    /// Send the current level of every channel to every client.
    pub fn notify_all(&self) -> BroadcastReport {
        Self::notify_locked(&mut self.lock())
    }

    fn notify_locked(inner: &mut Inner<S>) -> BroadcastReport {
        if inner.connections.is_empty() {
            return BroadcastReport::default();
        }
        let messages = match snapshot_messages(&inner.store.snapshot()) {
            Ok(messages) => messages,
            Err(e) => {
                warn!("Failed to encode snapshot: {}", e);
                return BroadcastReport::default();
            }
        };

        let mut report = BroadcastReport::default();
        for message in &messages {
            report += inner.connections.broadcast(message);
        }
        report
    }

    /// Remove connections that dropped without a close event.
    pub fn reap(&self) -> usize {
        self.lock().connections.reap()
    }

    /// Write every channel level to its pin.
    pub fn write_outputs<O: OutputSink>(&self, outputs: &mut O) -> OutputReport {
        let snapshot = self.snapshot();
        let report = apply_levels(&snapshot, &self.pins, outputs);
        for channel in &report.failed {
            warn!("Failed to drive pin {} for {}", self.pins.pin(*channel), channel);
        }
        report
    }

    /// One control-loop iteration: reaping sweep, then output writes.
    pub fn tick<O: OutputSink>(&self, outputs: &mut O) -> TickReport {
        let reaped = self.reap();
        let outputs = self.write_outputs(outputs);
        TickReport { reaped, outputs }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.lock().store.snapshot()
    }

    /// Registered clients, including ones awaiting the next sweep.
    pub fn client_count(&self) -> usize {
        self.lock().connections.len()
    }
}
