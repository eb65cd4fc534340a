//! The periodic broadcast loop.
//!
//! One task per hub. Each tick drains the update queue and writes every
//! pending message to every registered client. Per-client write
//! failures are logged and cause that client's removal only; they never
//! abort delivery to the remaining clients or the remaining messages.
//!
//! Delivery order across distinct clients within one tick is
//! unspecified (the registry snapshot is iterated in map order). Test
//! writers should only rely on per-client FIFO ordering.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::error::HubError;
use crate::hub::Hub;

/// Drive the broadcast loop until the process shuts down.
///
/// # Errors
///
/// Returns [`HubError`] only on an internal failure of the loop itself
/// (not a per-client write failure). Callers must treat that as fatal.
pub(crate) async fn run(hub: Arc<Hub>, period: Duration) -> Result<(), HubError> {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        tick(&hub)?;
    }
}

/// Run one drain-and-fan-out cycle.
///
/// Split out from [`run`] so tests can drive ticks deterministically.
///
/// # Errors
///
/// Returns [`HubError::Serialize`] if a queued message cannot be
/// serialized. That is loop-fatal: it indicates a corrupt message
/// rather than a transport problem.
pub(crate) fn tick(hub: &Hub) -> Result<(), HubError> {
    let pending = hub.queue().drain_all();
    if pending.is_empty() {
        return Ok(());
    }

    for message in pending {
        let frame: Arc<str> = serde_json::to_string(&message)
            .map_err(|source| HubError::Serialize {
                kind: message.kind.clone(),
                source,
            })?
            .into();

        let clients = hub.clients().snapshot();
        debug!(
            snapshot = %message.kind,
            clients = clients.len(),
            "broadcasting snapshot"
        );

        for client in clients {
            if client.send(Arc::clone(&frame)).is_err() {
                warn!(
                    client = %client.id(),
                    snapshot = %message.kind,
                    "push client write failed, removing from registry"
                );
                hub.clients().unregister(client.id());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sideband_types::{producer_fn, SnapshotMessage};
    use tokio::sync::mpsc::UnboundedReceiver;

    use crate::clients::ClientHandle;
    use crate::dispatch::DispatchTable;

    fn hub() -> Arc<Hub> {
        let table = DispatchTable::builder()
            .register(
                "trainer",
                &["tr"],
                producer_fn(|| Ok(Some(serde_json::json!({"name": "MAY", "badges": 3})))),
            )
            .unwrap()
            .register(
                "party",
                &["pa"],
                producer_fn(|| Ok(Some(serde_json::json!([{"species": "Treecko"}])))),
            )
            .unwrap()
            .build();
        Arc::new(Hub::new(table))
    }

    fn connect(hub: &Hub) -> UnboundedReceiver<Arc<str>> {
        let (handle, rx) = ClientHandle::connected();
        hub.clients().register(handle);
        rx
    }

    fn collect(rx: &mut UnboundedReceiver<Arc<str>>) -> Vec<SnapshotMessage> {
        let mut frames = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            frames.push(serde_json::from_str(&frame).unwrap());
        }
        frames
    }

    #[test]
    fn tick_delivers_each_message_to_every_client() {
        let hub = hub();
        let mut rx_a = connect(&hub);
        let mut rx_b = connect(&hub);

        hub.invalidate("trainer");
        hub.invalidate("party");
        tick(&hub).unwrap();

        for rx in [&mut rx_a, &mut rx_b] {
            let frames = collect(rx);
            let kinds: Vec<&str> = frames.iter().map(|m| m.kind.as_str()).collect();
            assert_eq!(kinds, vec!["trainer", "party"]);
        }
    }

    #[test]
    fn tick_with_empty_queue_sends_nothing() {
        let hub = hub();
        let mut rx = connect(&hub);

        tick(&hub).unwrap();
        assert!(collect(&mut rx).is_empty());
    }

    #[test]
    fn queue_is_empty_after_a_tick() {
        let hub = hub();
        let _rx = connect(&hub);

        hub.invalidate("trainer");
        tick(&hub).unwrap();
        assert!(hub.queue().is_empty());

        // A second tick delivers nothing: fire-and-forget, no retry.
        tick(&hub).unwrap();
    }

    #[test]
    fn failed_client_is_removed_and_others_still_receive() {
        let hub = hub();
        let mut rx_a = connect(&hub);
        let rx_dead = connect(&hub);
        let mut rx_c = connect(&hub);
        drop(rx_dead);

        hub.invalidate("trainer");
        tick(&hub).unwrap();

        assert_eq!(collect(&mut rx_a).len(), 1);
        assert_eq!(collect(&mut rx_c).len(), 1);
        assert_eq!(hub.clients().len(), 2);
    }

    #[test]
    fn resolve_during_broadcast_does_not_reorder_queue() {
        let hub = hub();
        let mut rx = connect(&hub);

        hub.invalidate("trainer");
        let direct = hub.resolve("party");
        assert_eq!(direct.kind, "party");

        hub.invalidate("party");
        tick(&hub).unwrap();

        let kinds: Vec<String> = collect(&mut rx).into_iter().map(|m| m.kind).collect();
        assert_eq!(kinds, vec!["trainer", "party"]);
    }

    #[tokio::test(start_paused = true)]
    async fn started_loop_drains_on_its_period() {
        let hub = hub();
        let mut rx = connect(&hub);

        let handle = hub.start(Duration::from_secs(1));
        // Let the first (immediate) interval tick pass.
        tokio::task::yield_now().await;

        hub.invalidate("trainer");
        tokio::time::sleep(Duration::from_millis(1100)).await;

        let frames = collect(&mut rx);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].kind, "trainer");

        handle.abort();
    }
}
