//! # ledlink-server
//!
//! Connection management, message handling and state broadcast for ledlink.
//!
//! The [`Controller`] is the single shared context: it owns the channel store
//! and the set of connected clients behind one lock. Network runtimes feed it
//! [`SocketEvent`]s; the control loop calls [`Controller::tick`].
//!
//! Enable features based on target platform:
//! - `tokio-runtime` (default) - For Linux/desktop
//! - no default features - For ESP32 (sinks provided by `ledlink-esp32`)

pub mod connection;
pub mod controller;
pub mod events;

#[cfg(feature = "tokio-runtime")]
pub mod runtime;

#[cfg(test)]
mod test_support;

pub use connection::{
    BroadcastReport, ClientId, ClientSink, Connection, ConnectionRegistry, ConnectionState,
    SendError,
};
pub use controller::{Controller, DiscardReason, HandleOutcome, TickReport};
pub use events::{Frame, FrameKind, SocketEvent, MAX_FRAME_LEN};
pub use ledlink_core::{Channel, ChannelStore, MemoryStore};

#[cfg(feature = "tokio-runtime")]
pub use runtime::spawn_control_loop;
