//! Registry of connected push listeners.
//!
//! Each push connection registers one [`ClientHandle`] for its lifetime.
//! The handle wraps the sending half of an unbounded channel whose
//! receiving half is owned by the connection's writer task, so the
//! broadcast loop never blocks on a slow socket: it either hands the
//! frame off or observes that the client is gone.
//!
//! A client is removed exactly once -- either by the transport's own
//! teardown or by a failed hand-off during a broadcast, whichever comes
//! first. Both paths go through [`ClientRegistry::unregister`], which is
//! idempotent.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use uuid::Uuid;

/// Opaque identifier for one push connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(Uuid);

impl ClientId {
    /// Generate a fresh client id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Error returned when a frame cannot be handed to a client.
///
/// This means the connection's writer task has gone away; the caller
/// should unregister the client.
#[derive(Debug, thiserror::Error)]
#[error("push client channel closed")]
pub struct ClientGone;

/// Handle to one open push connection.
///
/// Cloning the handle clones the channel sender; all clones share the
/// same [`ClientId`].
#[derive(Debug, Clone)]
pub struct ClientHandle {
    id: ClientId,
    tx: mpsc::UnboundedSender<Arc<str>>,
}

impl ClientHandle {
    /// Create a handle together with the frame receiver for the
    /// connection's writer task.
    #[must_use]
    pub fn connected() -> (Self, mpsc::UnboundedReceiver<Arc<str>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                id: ClientId::new(),
                tx,
            },
            rx,
        )
    }

    /// This connection's id.
    #[must_use]
    pub const fn id(&self) -> ClientId {
        self.id
    }

    /// Hand a serialized frame to the connection's writer task.
    ///
    /// # Errors
    ///
    /// Returns [`ClientGone`] if the writer task has dropped its
    /// receiver (the connection is closed or closing).
    pub fn send(&self, frame: Arc<str>) -> Result<(), ClientGone> {
        self.tx.send(frame).map_err(|_| ClientGone)
    }
}

/// The set of currently connected push listeners.
///
/// Internally synchronized; registration and removal may race with a
/// concurrent broadcast. A client added mid-broadcast may or may not
/// receive that broadcast -- no ordering is guaranteed across membership
/// changes and concurrent fan-outs.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    inner: Mutex<HashMap<ClientId, ClientHandle>>,
}

impl ClientRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a client handle. Idempotent if the id is already present.
    pub fn register(&self, handle: ClientHandle) {
        self.lock().insert(handle.id(), handle);
    }

    /// Remove a client by id. Returns `true` if the client was present.
    ///
    /// Idempotent: removing an absent client is a no-op.
    pub fn unregister(&self, id: ClientId) -> bool {
        self.lock().remove(&id).is_some()
    }

    /// Clone the current set of handles for lock-free iteration.
    ///
    /// The registry may grow or shrink while the caller iterates; the
    /// returned set is a point-in-time view.
    pub fn snapshot(&self) -> Vec<ClientHandle> {
        self.lock().values().cloned().collect()
    }

    /// Whether a client id is currently registered.
    pub fn contains(&self, id: ClientId) -> bool {
        self.lock().contains_key(&id)
    }

    /// Number of currently connected clients.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no clients are connected.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Acquire the inner lock, ignoring poisoning.
    ///
    /// Critical sections are single map operations; a panicking holder
    /// cannot leave the map torn.
    fn lock(&self) -> MutexGuard<'_, HashMap<ClientId, ClientHandle>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn register_then_unregister_removes_handle() {
        let registry = ClientRegistry::new();
        let (handle, _rx) = ClientHandle::connected();
        let id = handle.id();

        registry.register(handle);
        assert!(registry.contains(id));

        assert!(registry.unregister(id));
        assert!(!registry.contains(id));
        assert!(registry.snapshot().is_empty());
    }

    #[test]
    fn unregister_absent_client_is_noop() {
        let registry = ClientRegistry::new();
        assert!(!registry.unregister(ClientId::new()));
    }

    #[test]
    fn register_is_idempotent_per_id() {
        let registry = ClientRegistry::new();
        let (handle, _rx) = ClientHandle::connected();

        registry.register(handle.clone());
        registry.register(handle);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn send_fails_after_receiver_dropped() {
        let (handle, rx) = ClientHandle::connected();
        drop(rx);
        assert!(handle.send(Arc::from("{}")).is_err());
    }

    #[test]
    fn snapshot_is_point_in_time() {
        let registry = ClientRegistry::new();
        let (a, _rx_a) = ClientHandle::connected();
        registry.register(a);

        let view = registry.snapshot();

        let (b, _rx_b) = ClientHandle::connected();
        registry.register(b);

        assert_eq!(view.len(), 1);
        assert_eq!(registry.len(), 2);
    }
}
