//! Broadcast Router implementation.
//!
//! Re-delivers a message event from any connection to every connection
//! registered at the time of the call, the sender included.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};

use crate::registry::{ConnectionId, ConnectionRegistry, OutboundEvent};

/// Outcome of one broadcast, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Deliveries queued on a peer's outbound channel
    pub delivered: usize,
    /// Deliveries skipped (peer closed mid-broadcast or queue full)
    pub skipped: usize,
}

/// Router that fans a message out to all registered connections.
///
/// Delivery is best-effort: a peer that closed mid-broadcast or whose
/// outbound queue is full is skipped, and the remaining peers still receive
/// the message. There is no acknowledgment, retry, or persistence.
#[derive(Clone)]
pub struct BroadcastRouter {
    registry: Arc<ConnectionRegistry>,
}

impl BroadcastRouter {
    /// Create a router over the given registry.
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// The registry this router delivers against.
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Deliver `payload` to every connection currently registered,
    /// including `sender_id` itself.
    ///
    /// Operates on a snapshot of the membership set taken at call time, so
    /// a connection that disconnects while the broadcast runs may still
    /// receive (or miss) this one message. Ordering across concurrent
    /// broadcasts is not guaranteed; a single sender's messages reach each
    /// peer in issue order because each peer has one FIFO outbound queue.
    #[instrument(skip(self, payload), fields(sender = %sender_id))]
    pub fn broadcast(&self, sender_id: ConnectionId, payload: &str) -> BroadcastReport {
        let recipients = self.registry.snapshot();
        let mut report = BroadcastReport {
            delivered: 0,
            skipped: 0,
        };

        for (id, sender) in recipients {
            let event = OutboundEvent::new(payload);
            match sender.try_send(event) {
                Ok(()) => {
                    report.delivered += 1;
                }
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(connection = %id, "Outbound queue full, dropping delivery");
                    report.skipped += 1;
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!(connection = %id, "Peer closed mid-broadcast, skipping");
                    // Remove the stale entry so later broadcasts skip the lookup
                    self.registry.unregister(&id);
                    report.skipped += 1;
                }
            }
        }

        debug!(
            delivered = report.delivered,
            skipped = report.skipped,
            "Broadcast complete"
        );
        report
    }
}
