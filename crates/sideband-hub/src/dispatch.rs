//! The shared dispatch table: snapshot names and aliases to producers.
//!
//! Both transports answer named requests through this one table, and
//! the invalidation path captures through it as well, so adding a
//! snapshot is a data change at registration time -- not a code change
//! in either transport.
//!
//! Lookups are case-insensitive (keys are stored folded, inputs are
//! folded before the lookup). A miss never raises: the request path
//! yields a well-defined `unknown` message instead.

use std::collections::HashMap;
use std::sync::Arc;

use sideband_types::{QueryParams, SnapshotMessage, SnapshotProducer};
use tracing::warn;

use crate::error::DispatchError;

/// One resolved registration: the canonical kind plus its producer.
///
/// Aliases share the producer and the canonical kind through `Arc`s, so
/// a request through `pa` yields a message of kind `party`.
#[derive(Clone)]
struct Entry {
    kind: Arc<str>,
    producer: Arc<dyn SnapshotProducer>,
}

impl Entry {
    /// Invoke the producer and wrap the outcome as a message.
    ///
    /// A producer failure is caught and logged here; the caller sees a
    /// null-data message, never an error.
    fn capture(&self) -> SnapshotMessage {
        match self.producer.produce() {
            Ok(Some(data)) => SnapshotMessage::new(self.kind.as_ref(), data),
            Ok(None) => SnapshotMessage::empty(self.kind.as_ref()),
            Err(error) => {
                warn!(snapshot = %self.kind, %error, "snapshot producer failed, substituting null");
                SnapshotMessage::empty(self.kind.as_ref())
            }
        }
    }

    /// Parameterized variant of [`Self::capture`] for the pull transport.
    fn capture_with(&self, params: &QueryParams) -> SnapshotMessage {
        match self.producer.produce_with(params) {
            Ok(Some(data)) => SnapshotMessage::new(self.kind.as_ref(), data),
            Ok(None) => SnapshotMessage::empty(self.kind.as_ref()),
            Err(error) => {
                warn!(snapshot = %self.kind, %error, "snapshot producer failed, substituting null");
                SnapshotMessage::empty(self.kind.as_ref())
            }
        }
    }
}

/// Immutable mapping from every recognized name and alias to a producer.
///
/// Built once at startup via [`DispatchTableBuilder`] and shared
/// read-only between the broadcast loop and all connection tasks; it
/// needs no synchronization.
pub struct DispatchTable {
    entries: HashMap<String, Entry>,
    canonical: Vec<String>,
}

impl DispatchTable {
    /// Start building a table.
    #[must_use]
    pub fn builder() -> DispatchTableBuilder {
        DispatchTableBuilder::default()
    }

    /// Case-fold a raw request token the way the table stores keys.
    fn fold(raw: &str) -> String {
        raw.trim().to_lowercase()
    }

    /// Capture a fresh snapshot for a recognized name.
    ///
    /// Returns `None` when the (folded) name matches no registration.
    pub fn capture(&self, name: &str) -> Option<SnapshotMessage> {
        self.entries.get(&Self::fold(name)).map(Entry::capture)
    }

    /// Capture a fresh, possibly parameter-filtered snapshot.
    ///
    /// Returns `None` when the (folded) name matches no registration.
    /// An unrecognized parameter value inside a recognized name falls
    /// back to the default result (producer contract), not an error.
    pub fn capture_with(&self, name: &str, params: &QueryParams) -> Option<SnapshotMessage> {
        self.entries
            .get(&Self::fold(name))
            .map(|entry| entry.capture_with(params))
    }

    /// Resolve a raw request token to a freshly computed message.
    ///
    /// On a hit the producer is invoked synchronously; on a miss the
    /// reply is an `unknown`-kind message carrying the raw input. This
    /// call has no effect on the update queue.
    pub fn resolve(&self, raw: &str) -> SnapshotMessage {
        self.capture(raw)
            .unwrap_or_else(|| SnapshotMessage::unknown(raw))
    }

    /// Canonical snapshot names in registration order.
    ///
    /// Used by the pull transport to generate one route per snapshot
    /// and by the discovery endpoint.
    pub fn canonical_names(&self) -> impl Iterator<Item = &str> {
        self.canonical.iter().map(String::as_str)
    }

    /// Whether a name or alias is registered (case-insensitive).
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&Self::fold(name))
    }

    /// Number of canonical snapshot names.
    pub fn len(&self) -> usize {
        self.canonical.len()
    }

    /// Whether the table has no registrations.
    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }
}

/// Builder for [`DispatchTable`].
///
/// Registrations are validated eagerly: empty names and duplicate
/// names/aliases are startup errors, not silent overwrites.
#[derive(Default)]
pub struct DispatchTableBuilder {
    entries: HashMap<String, Entry>,
    canonical: Vec<String>,
}

impl DispatchTableBuilder {
    /// Register a snapshot under its canonical name plus any aliases.
    ///
    /// All keys are case-folded; requests through an alias produce
    /// messages of the canonical kind.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::EmptyName`] if the name or an alias is
    /// empty after trimming, and [`DispatchError::Duplicate`] if any
    /// key was already registered.
    pub fn register(
        mut self,
        name: &str,
        aliases: &[&str],
        producer: Arc<dyn SnapshotProducer>,
    ) -> Result<Self, DispatchError> {
        let canonical = DispatchTable::fold(name);
        if canonical.is_empty() {
            return Err(DispatchError::EmptyName {
                canonical: name.to_owned(),
            });
        }

        let kind: Arc<str> = Arc::from(canonical.as_str());
        let entry = Entry { kind, producer };

        self.insert(canonical.clone(), entry.clone())?;
        self.canonical.push(canonical.clone());

        for alias in aliases {
            let key = DispatchTable::fold(alias);
            if key.is_empty() {
                return Err(DispatchError::EmptyName { canonical });
            }
            self.insert(key, entry.clone())?;
        }

        Ok(self)
    }

    /// Finish building the table.
    #[must_use]
    pub fn build(self) -> DispatchTable {
        DispatchTable {
            entries: self.entries,
            canonical: self.canonical,
        }
    }

    fn insert(&mut self, key: String, entry: Entry) -> Result<(), DispatchError> {
        if self.entries.contains_key(&key) {
            return Err(DispatchError::Duplicate { name: key });
        }
        self.entries.insert(key, entry);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::Value;
    use sideband_types::{producer_fn, ProducerError};

    fn table_with_party() -> DispatchTable {
        DispatchTable::builder()
            .register(
                "party",
                &["pa"],
                producer_fn(|| Ok(Some(serde_json::json!([{"species": "Treecko"}])))),
            )
            .unwrap()
            .build()
    }

    #[test]
    fn resolve_is_case_insensitive() {
        let table = table_with_party();
        assert_eq!(table.resolve("PARTY").kind, "party");
        assert_eq!(table.resolve("party").kind, "party");
        assert_eq!(table.resolve("  Party  ").kind, "party");
    }

    #[test]
    fn alias_resolves_to_canonical_kind() {
        let table = table_with_party();
        let via_alias = table.resolve("pa");
        let via_name = table.resolve("party");
        assert_eq!(via_alias.kind, via_name.kind);
        assert_eq!(via_alias.data, via_name.data);
    }

    #[test]
    fn miss_yields_unknown_with_raw_input() {
        let table = table_with_party();
        let reply = table.resolve("PARTYY");
        assert!(reply.is_unknown());
        assert_eq!(reply.data, Value::String("PARTYY".to_owned()));
    }

    #[test]
    fn failing_producer_substitutes_null() {
        let table = DispatchTable::builder()
            .register(
                "stats",
                &[],
                producer_fn(|| Err(ProducerError::from("memory read failed"))),
            )
            .unwrap()
            .build();

        let msg = table.resolve("stats");
        assert_eq!(msg.kind, "stats");
        assert_eq!(msg.data, Value::Null);
    }

    #[test]
    fn absent_value_substitutes_null() {
        let table = DispatchTable::builder()
            .register("emulator", &["em"], producer_fn(|| Ok(None)))
            .unwrap()
            .build();

        assert_eq!(table.resolve("em").data, Value::Null);
    }

    #[test]
    fn duplicate_alias_is_rejected() {
        let result = DispatchTable::builder()
            .register("party", &["pa"], producer_fn(|| Ok(None)))
            .unwrap()
            .register("passive", &["pa"], producer_fn(|| Ok(None)));

        assert!(matches!(result, Err(DispatchError::Duplicate { name }) if name == "pa"));
    }

    #[test]
    fn empty_name_is_rejected() {
        let result = DispatchTable::builder().register("  ", &[], producer_fn(|| Ok(None)));
        assert!(matches!(result, Err(DispatchError::EmptyName { .. })));
    }

    #[test]
    fn canonical_names_keep_registration_order() {
        let table = DispatchTable::builder()
            .register("trainer", &["tr"], producer_fn(|| Ok(None)))
            .unwrap()
            .register("party", &["pa"], producer_fn(|| Ok(None)))
            .unwrap()
            .build();

        let names: Vec<&str> = table.canonical_names().collect();
        assert_eq!(names, vec!["trainer", "party"]);
        assert_eq!(table.len(), 2);
        assert!(table.contains("TR"));
    }

    /// Producer that supports the `flag` query parameter, mirroring the
    /// event-flag endpoint contract: a known flag filters the map, an
    /// unknown flag falls back to the full map.
    struct Flags;

    impl SnapshotProducer for Flags {
        fn produce(&self) -> Result<Option<Value>, ProducerError> {
            Ok(Some(serde_json::json!({"BADGE01": true, "BADGE02": false})))
        }

        fn produce_with(&self, params: &QueryParams) -> Result<Option<Value>, ProducerError> {
            if let Some(flag) = params.get("flag") {
                if flag == "BADGE01" {
                    return Ok(Some(serde_json::json!({"BADGE01": true})));
                }
            }
            self.produce()
        }
    }

    #[test]
    fn capture_with_passes_parameters_through() {
        let table = DispatchTable::builder()
            .register("event_flags", &["flags", "ef"], Arc::new(Flags))
            .unwrap()
            .build();

        let mut params = QueryParams::new();
        params.insert("flag".to_owned(), "BADGE01".to_owned());
        let filtered = table.capture_with("event_flags", &params).unwrap();
        assert_eq!(filtered.data, serde_json::json!({"BADGE01": true}));

        params.insert("flag".to_owned(), "NO_SUCH_FLAG".to_owned());
        let fallback = table.capture_with("event_flags", &params).unwrap();
        assert_eq!(
            fallback.data,
            serde_json::json!({"BADGE01": true, "BADGE02": false})
        );
    }
}
