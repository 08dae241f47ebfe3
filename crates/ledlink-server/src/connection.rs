//! Client connections.
//!
//! A connection moves through `Connecting → Open → Closed`. Only open
//! connections receive broadcasts. Closed connections stay in the registry
//! until the next reaping sweep removes them.

use std::collections::BTreeMap;
use std::fmt;
use std::net::SocketAddr;

use thiserror::Error;
use tracing::{debug, info};

/// Opaque client identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub u32);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Why a single write to a client did not go through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendError {
    /// The client's outbound buffer is full.
    #[error("Client queue full")]
    Full,

    /// The client is gone.
    #[error("Client closed")]
    Closed,
}

/// Outbound half of one client connection.
///
/// Implementations must not block: a write that cannot be queued right away
/// fails with [`SendError::Full`].
pub trait ClientSink: Send {
    /// Queue one text frame.
    fn try_send_text(&mut self, text: &str) -> Result<(), SendError>;

    /// Whether the peer can still receive frames.
    fn is_open(&self) -> bool;
}

/// Connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

/// One connected peer.
#[derive(Debug)]
pub struct Connection<S> {
    pub id: ClientId,
    pub peer: Option<SocketAddr>,
    pub state: ConnectionState,
    sink: S,
}

impl<S: ClientSink> Connection<S> {
    pub fn new(id: ClientId, peer: Option<SocketAddr>, sink: S) -> Self {
        Self {
            id,
            peer,
            state: ConnectionState::Connecting,
            sink,
        }
    }

    /// Whether this connection should stay in the active set.
    pub fn is_alive(&self) -> bool {
        self.state != ConnectionState::Closed && self.sink.is_open()
    }
}

/// Delivery counts of one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Frames queued successfully.
    pub delivered: usize,
    /// Frames skipped because a client could not accept them.
    pub skipped: usize,
}

impl std::ops::AddAssign for BroadcastReport {
    fn add_assign(&mut self, other: Self) {
        self.delivered += other.delivered;
        self.skipped += other.skipped;
    }
}

/// The set of active connections, ordered by client id.
#[derive(Debug)]
pub struct ConnectionRegistry<S> {
    connections: BTreeMap<ClientId, Connection<S>>,
}

impl<S> Default for ConnectionRegistry<S> {
    fn default() -> Self {
        Self {
            connections: BTreeMap::new(),
        }
    }
}

impl<S: ClientSink> ConnectionRegistry<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection in the `Connecting` state.
    ///
    /// A connection already registered under the same id is replaced.
    pub fn insert(&mut self, connection: Connection<S>) {
        self.connections.insert(connection.id, connection);
    }

    /// Move a connection to `Open`. Returns false if it is unknown or closed.
    pub fn open(&mut self, id: ClientId) -> bool {
        match self.connections.get_mut(&id) {
            Some(conn) if conn.state == ConnectionState::Connecting => {
                conn.state = ConnectionState::Open;
                true
            }
            Some(conn) => conn.state == ConnectionState::Open,
            None => false,
        }
    }

    /// Remove a connection; nothing more is delivered to it.
    pub fn remove(&mut self, id: ClientId) -> Option<Connection<S>> {
        self.connections.remove(&id).map(|mut conn| {
            conn.state = ConnectionState::Closed;
            conn
        })
    }

    pub fn get(&self, id: ClientId) -> Option<&Connection<S>> {
        self.connections.get(&id)
    }

    /// Number of registered connections, including ones awaiting reaping.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Send one text frame to every open connection.
    ///
    /// Clients that cannot accept the frame are skipped. A client found closed
    /// is marked `Closed` and left for the next sweep.
    pub fn broadcast(&mut self, text: &str) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        for conn in self.connections.values_mut() {
            if conn.state != ConnectionState::Open {
                continue;
            }
            match conn.sink.try_send_text(text) {
                Ok(()) => report.delivered += 1,
                Err(SendError::Full) => {
                    debug!("Client {} queue full, skipping frame", conn.id);
                    report.skipped += 1;
                }
                Err(SendError::Closed) => {
                    debug!("Client {} gone, marking closed", conn.id);
                    conn.state = ConnectionState::Closed;
                    report.skipped += 1;
                }
            }
        }

        report
    }

    /// Drop connections that closed without an explicit close event.
    ///
    /// Returns the number removed.
    pub fn reap(&mut self) -> usize {
        let before = self.connections.len();
        self.connections.retain(|id, conn| {
            let keep = conn.is_alive();
            if !keep {
                info!("Reaped stale client {}", id);
            }
            keep
        });
        before - self.connections.len()
    }
}
