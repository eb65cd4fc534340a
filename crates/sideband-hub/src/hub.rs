//! The hub: one explicitly owned instance tying the pieces together.
//!
//! The embedding process constructs a [`Hub`] from a built
//! [`DispatchTable`], wraps it in an [`Arc`], and calls
//! [`Hub::start`] to launch the broadcast loop. Transports share the
//! same instance for registration and request dispatch. Tests construct
//! isolated instances; there is no process-wide singleton.

use std::sync::Arc;
use std::time::Duration;

use sideband_types::SnapshotMessage;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::broadcast;
use crate::clients::ClientRegistry;
use crate::dispatch::DispatchTable;
use crate::error::HubError;
use crate::queue::UpdateQueue;

/// The snapshot broadcast hub.
///
/// Owns the only shared mutable state in the system (the update queue
/// and the client registry) plus the immutable dispatch table. All
/// methods take `&self`; internal synchronization makes them safe to
/// call from any task.
pub struct Hub {
    table: DispatchTable,
    queue: UpdateQueue,
    clients: ClientRegistry,
}

impl Hub {
    /// Create a hub around a built dispatch table.
    #[must_use]
    pub fn new(table: DispatchTable) -> Self {
        Self {
            table,
            queue: UpdateQueue::new(),
            clients: ClientRegistry::new(),
        }
    }

    /// The shared dispatch table.
    pub const fn table(&self) -> &DispatchTable {
        &self.table
    }

    /// The pending-broadcast queue.
    ///
    /// Exposed for the broadcast loop and for tests; ordinary callers
    /// only touch it through [`Self::invalidate`].
    pub const fn queue(&self) -> &UpdateQueue {
        &self.queue
    }

    /// The registry of connected push listeners.
    pub const fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    /// Signal that a named snapshot changed.
    ///
    /// The producer is invoked *now* (broadcast content reflects the
    /// state at invalidation time, not at delivery time) and the
    /// resulting message is appended to the queue for the next tick.
    ///
    /// An unrecognized name still enqueues a message with null data, so
    /// misspelled invalidation calls surface on the wire instead of
    /// vanishing.
    pub fn invalidate(&self, name: &str) {
        let message = self.table.capture(name).unwrap_or_else(|| {
            debug!(snapshot = name, "invalidate for unregistered snapshot");
            SnapshotMessage::empty(name.trim().to_lowercase())
        });
        self.queue.push(message);
        debug!(snapshot = name, pending = self.queue.len(), "snapshot invalidated");
    }

    /// Resolve a raw request token to a freshly computed message.
    ///
    /// Used by both transports for on-demand lookups. Never touches the
    /// update queue and never affects broadcast ordering.
    pub fn resolve(&self, raw: &str) -> SnapshotMessage {
        self.table.resolve(raw)
    }

    /// Spawn the periodic broadcast loop.
    ///
    /// Each tick drains the queue and fans every pending message out to
    /// every registered client, isolating per-client failures. The task
    /// runs until the process shuts down; if it ever returns, the value
    /// is an internal error that the embedding binary must treat as
    /// fatal -- a silently stalled loop would be indistinguishable from
    /// "no updates".
    pub fn start(self: &Arc<Self>, period: Duration) -> JoinHandle<Result<(), HubError>> {
        let hub = Arc::clone(self);
        tokio::spawn(broadcast::run(hub, period))
    }
}
