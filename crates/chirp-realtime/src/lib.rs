//! Real-time fan-out core for the Chirp backend.
//!
//! This crate owns the two pieces of the chat feature that involve any
//! multi-party interaction: the [`ConnectionRegistry`], which tracks live
//! connections and their outbound queues, and the [`BroadcastRouter`], which
//! re-delivers a message from any connection to every registered connection.
//!
//! The payload is opaque to this crate. Whatever text a client sends is
//! echoed verbatim to all peers; no parsing, validation, or persistence
//! happens here.

mod registry;
mod router;

use thiserror::Error;

pub use registry::{
    ConnectionEntry, ConnectionId, ConnectionRegistry, OutboundEvent, OUTBOUND_QUEUE_CAPACITY,
};
pub use router::{BroadcastReport, BroadcastRouter};

/// Errors surfaced by the realtime layer.
///
/// Delivery failures on the broadcast path are deliberately absent: a send
/// to a peer that dropped mid-broadcast is logged and skipped, never
/// propagated.
#[derive(Error, Debug)]
pub enum RealtimeError {
    #[error("connection registry is at capacity ({limit} connections)")]
    AtCapacity { limit: usize },
}
