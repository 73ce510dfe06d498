//! Connection Registry implementation.
//!
//! Tracks active chat connections by an opaque server-assigned id so the
//! broadcast router can reach every live peer.

use std::fmt;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::RealtimeError;

/// Capacity of each connection's outbound queue.
///
/// A full queue means the peer is not draining its socket; the delivery is
/// dropped rather than stalling the broadcast.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// Opaque identifier for one live connection.
///
/// Assigned by the registry on accept and unique for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// An event to be written to a connection's transport.
///
/// Carries the opaque payload verbatim; the transport layer decides how to
/// frame it on the wire.
#[derive(Debug, Clone)]
pub struct OutboundEvent {
    /// The payload to deliver, echoed exactly as the sender issued it.
    pub payload: String,
}

impl OutboundEvent {
    /// Create a new outbound event.
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
        }
    }
}

/// Connection state stored in the registry.
#[derive(Debug)]
pub struct ConnectionEntry {
    /// Channel to deliver events to this connection
    pub sender: mpsc::Sender<OutboundEvent>,
}

impl ConnectionEntry {
    fn new(sender: mpsc::Sender<OutboundEvent>) -> Self {
        Self { sender }
    }
}

/// Registry for tracking active chat connections.
///
/// Thread-safe map from [`ConnectionId`] to the connection's outbound
/// channel. Uses DashMap for concurrent access without explicit locking;
/// the broadcast router iterates a point-in-time snapshot, so a connection
/// that disconnects mid-broadcast may still receive (or miss) that one
/// message.
///
/// ## Usage
///
/// ```ignore
/// let registry = ConnectionRegistry::new(10_000);
///
/// // When a connection is accepted:
/// let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
/// let id = registry.register(tx)?;
///
/// // When the connection closes:
/// registry.unregister(&id);
/// ```
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, ConnectionEntry>,
    max_connections: usize,
}

impl ConnectionRegistry {
    /// Create a new registry with the given connection cap.
    pub fn new(max_connections: usize) -> Self {
        info!(max_connections, "Creating connection registry");
        Self {
            connections: DashMap::new(),
            max_connections,
        }
    }

    /// Register a connection with its outbound channel.
    ///
    /// Assigns and returns a fresh [`ConnectionId`]. Refuses the connection
    /// when the registry is at capacity.
    #[instrument(skip_all)]
    pub fn register(
        &self,
        sender: mpsc::Sender<OutboundEvent>,
    ) -> Result<ConnectionId, RealtimeError> {
        if self.connections.len() >= self.max_connections {
            return Err(RealtimeError::AtCapacity {
                limit: self.max_connections,
            });
        }

        let id = ConnectionId::new();
        self.connections.insert(id, ConnectionEntry::new(sender));
        debug!(connection = %id, "Registered new connection");
        Ok(id)
    }

    /// Unregister a connection.
    ///
    /// Idempotent: removing an id that is not registered is a no-op and
    /// returns `None`.
    #[instrument(skip(self), fields(connection = %id))]
    pub fn unregister(&self, id: &ConnectionId) -> Option<ConnectionEntry> {
        let removed = self.connections.remove(id);
        if removed.is_some() {
            debug!("Unregistered connection");
        } else {
            debug!("Connection was not registered");
        }
        removed.map(|(_, entry)| entry)
    }

    /// Check if a connection id is currently registered.
    pub fn is_connected(&self, id: &ConnectionId) -> bool {
        self.connections.contains_key(id)
    }

    /// Get the number of active connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Take a point-in-time snapshot of the membership set.
    ///
    /// The broadcast router delivers against this snapshot rather than the
    /// live map, so membership changes during a broadcast cannot corrupt
    /// iteration.
    pub fn snapshot(&self) -> Vec<(ConnectionId, mpsc::Sender<OutboundEvent>)> {
        self.connections
            .iter()
            .map(|entry| (*entry.key(), entry.value().sender.clone()))
            .collect()
    }

    /// Remove all stale connections (those with closed channels).
    ///
    /// This can be called periodically to clean up connections that were
    /// not properly unregistered.
    pub fn cleanup_stale(&self) -> usize {
        let stale: Vec<ConnectionId> = self
            .connections
            .iter()
            .filter(|entry| entry.value().sender.is_closed())
            .map(|entry| *entry.key())
            .collect();

        let mut removed = 0;
        for id in stale {
            if self.connections.remove(&id).is_some() {
                debug!(connection = %id, "Removed stale connection");
                removed += 1;
            }
        }

        if removed > 0 {
            info!(count = removed, "Cleaned up stale connections");
        }

        removed
    }
}

impl fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("connection_count", &self.connections.len())
            .field("max_connections", &self.max_connections)
            .finish()
    }
}
