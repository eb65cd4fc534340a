//! FIFO buffer of pending broadcast messages.
//!
//! Messages enter the queue at invalidation time (already captured and
//! formatted) and leave it in insertion order on the next broadcast
//! tick. The queue is unbounded; it is fully drained on every tick, so
//! no message starves and none survives a drain cycle.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use sideband_types::SnapshotMessage;

/// An ordered, internally synchronized buffer of pending broadcasts.
///
/// Insertion order is broadcast order. Concurrent [`push`](Self::push)
/// calls may interleave with [`drain_all`](Self::drain_all), but each
/// message is returned by exactly one drain.
#[derive(Debug, Default)]
pub struct UpdateQueue {
    inner: Mutex<VecDeque<SnapshotMessage>>,
}

impl UpdateQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a captured message to the back of the queue.
    pub fn push(&self, message: SnapshotMessage) {
        self.lock().push_back(message);
    }

    /// Atomically remove and return every queued message in FIFO order,
    /// leaving the queue empty.
    pub fn drain_all(&self) -> Vec<SnapshotMessage> {
        self.lock().drain(..).collect()
    }

    /// Number of messages currently pending.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the queue is currently empty.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Acquire the inner lock, ignoring poisoning.
    ///
    /// Every critical section here is a single `VecDeque` operation, so
    /// a panicking holder cannot leave the buffer in a torn state.
    fn lock(&self) -> MutexGuard<'_, VecDeque<SnapshotMessage>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn msg(kind: &str) -> SnapshotMessage {
        SnapshotMessage::new(kind, serde_json::json!({"k": kind}))
    }

    #[test]
    fn drains_in_fifo_order() {
        let queue = UpdateQueue::new();
        queue.push(msg("trainer"));
        queue.push(msg("party"));
        queue.push(msg("stats"));

        let drained = queue.drain_all();
        let kinds: Vec<&str> = drained.iter().map(|m| m.kind.as_str()).collect();
        assert_eq!(kinds, vec!["trainer", "party", "stats"]);
    }

    #[test]
    fn drain_is_destructive() {
        let queue = UpdateQueue::new();
        queue.push(msg("party"));

        assert_eq!(queue.drain_all().len(), 1);
        assert!(queue.drain_all().is_empty());
        assert!(queue.is_empty());
    }

    #[test]
    fn push_after_drain_starts_fresh() {
        let queue = UpdateQueue::new();
        queue.push(msg("trainer"));
        let _ = queue.drain_all();

        queue.push(msg("stats"));
        let drained = queue.drain_all();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].kind, "stats");
    }

    #[test]
    fn len_tracks_pending_messages() {
        let queue = UpdateQueue::new();
        assert!(queue.is_empty());
        queue.push(msg("party"));
        queue.push(msg("party"));
        assert_eq!(queue.len(), 2);
    }
}
