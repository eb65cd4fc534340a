//! The producer interface through which the hub reads snapshot data.
//!
//! The embedding process registers one [`SnapshotProducer`] per snapshot
//! name. Producers are zero-argument callables invoked synchronously by
//! both the broadcast path (at invalidation time) and the request
//! dispatcher (at lookup time), so they must not block indefinitely.
//!
//! A producer returns `Ok(None)` when the snapshot has no current value
//! (for example, no emulator session is attached); the hub turns that
//! into a null-data message rather than an error.

use std::collections::HashMap;

use serde_json::Value;

/// Error type producers may fail with.
///
/// Producer failures are caught at the hub boundary and substituted with
/// a null-data message, so a boxed error is sufficient here.
pub type ProducerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Query parameters forwarded to [`SnapshotProducer::produce_with`] by
/// the pull transport.
pub type QueryParams = HashMap<String, String>;

/// A read-only source for one named snapshot.
///
/// Implementations must be cheap enough to call once per invalidation
/// and once per on-demand request. They are shared between the broadcast
/// loop and per-connection tasks, hence `Send + Sync`.
pub trait SnapshotProducer: Send + Sync {
    /// Capture the current value of this snapshot.
    ///
    /// Returns `Ok(None)` when no value is currently available.
    ///
    /// # Errors
    ///
    /// Implementations may fail with any boxed error; the hub logs the
    /// failure and substitutes null data.
    fn produce(&self) -> Result<Option<Value>, ProducerError>;

    /// Capture a parameterized variant of this snapshot.
    ///
    /// Used by the pull transport to pass query parameters through (for
    /// example `?flag=<NAME>` on the event-flag endpoint). Producers
    /// that support filtering override this; an unrecognized parameter
    /// value must fall back to the default (unfiltered) result rather
    /// than an error. The default implementation ignores the parameters.
    ///
    /// # Errors
    ///
    /// Same contract as [`Self::produce`].
    fn produce_with(&self, params: &QueryParams) -> Result<Option<Value>, ProducerError> {
        let _ = params;
        self.produce()
    }
}

/// Plain closures are producers, which keeps registry construction terse.
impl<F> SnapshotProducer for F
where
    F: Fn() -> Result<Option<Value>, ProducerError> + Send + Sync,
{
    fn produce(&self) -> Result<Option<Value>, ProducerError> {
        self()
    }
}

/// Wrap a closure as a shareable producer trait object.
///
/// This pins down the closure's signature so callers can write
/// `producer_fn(|| Ok(None))` without type annotations.
pub fn producer_fn<F>(f: F) -> std::sync::Arc<dyn SnapshotProducer>
where
    F: Fn() -> Result<Option<Value>, ProducerError> + Send + Sync + 'static,
{
    std::sync::Arc::new(f)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_producers() {
        let producer = producer_fn(|| Ok(Some(serde_json::json!({"badges": 3}))));
        let value = producer.produce().unwrap();
        assert_eq!(value, Some(serde_json::json!({"badges": 3})));
    }

    #[test]
    fn default_produce_with_ignores_params() {
        let producer = producer_fn(|| Ok(Some(Value::from(60))));
        let mut params = QueryParams::new();
        params.insert("flag".to_owned(), "BADGE01".to_owned());
        let value = producer.produce_with(&params).unwrap();
        assert_eq!(value, Some(Value::from(60)));
    }

    #[test]
    fn producers_can_report_absence() {
        let producer = producer_fn(|| Ok(None));
        assert_eq!(producer.produce().unwrap(), None);
    }
}
