//! The default snapshot registry: names, aliases, and producers.
//!
//! Adding a snapshot is a data change here: one `register` call wiring
//! a session reader, and both transports pick it up (the pull route is
//! generated from the table, the push command resolves through it).
//!
//! Canonical names follow the pull-route names; the short command forms
//! observers historically typed on the push channel are aliases of the
//! same entries, so both transports agree on the `type` field.

use std::sync::Arc;

use serde_json::Value;
use sideband_hub::{DispatchError, DispatchTable};
use sideband_types::{producer_fn, ProducerError, QueryParams, SnapshotProducer};

use crate::session::BotSession;

/// Event-flag producer with support for the `?flag=<NAME>` filter on
/// the pull transport.
///
/// A known flag name yields a single-entry map; an unknown flag name
/// (or no parameter, as on the push transport) yields the full map.
struct EventFlagProducer {
    session: Arc<BotSession>,
}

impl SnapshotProducer for EventFlagProducer {
    fn produce(&self) -> Result<Option<Value>, ProducerError> {
        self.session.event_flags_snapshot()
    }

    fn produce_with(&self, params: &QueryParams) -> Result<Option<Value>, ProducerError> {
        if let Some(flag) = params.get("flag") {
            if let Some(value) = self.session.event_flag(flag) {
                let mut map = serde_json::Map::new();
                map.insert(flag.clone(), Value::Bool(value));
                return Ok(Some(Value::Object(map)));
            }
        }
        self.produce()
    }
}

/// Build the dispatch table for a bot session.
///
/// # Errors
///
/// Returns [`DispatchError`] only on a duplicate or empty name, which
/// would be a bug in this registration list.
pub fn build_dispatch_table(session: &Arc<BotSession>) -> Result<DispatchTable, DispatchError> {
    // Each producer owns its own Arc to the session.
    let trainer = Arc::clone(session);
    let party = Arc::clone(session);
    let items = Arc::clone(session);
    let emulator = Arc::clone(session);
    let fps = Arc::clone(session);
    let stats = Arc::clone(session);
    let encounter_log = Arc::clone(session);
    let shiny_log = Arc::clone(session);
    let encounter_rate = Arc::clone(session);

    let table = DispatchTable::builder()
        .register("trainer", &["tr"], producer_fn(move || trainer.trainer_snapshot()))?
        .register("party", &["pa"], producer_fn(move || party.party_snapshot()))?
        .register(
            "items",
            &["it", "bag", "bg"],
            producer_fn(move || items.items_snapshot()),
        )?
        .register(
            "emulator",
            &["em", "emu"],
            producer_fn(move || emulator.emulator_snapshot()),
        )?
        .register("fps", &[], producer_fn(move || fps.fps_snapshot()))?
        .register("stats", &["st"], producer_fn(move || stats.stats_snapshot()))?
        .register(
            "encounter_log",
            &["el", "enc log"],
            producer_fn(move || encounter_log.encounter_log_snapshot()),
        )?
        .register(
            "shiny_log",
            &["shiny", "sh", "shy"],
            producer_fn(move || shiny_log.shiny_log_snapshot()),
        )?
        .register(
            "encounter_rate",
            &["er", "enc rate"],
            producer_fn(move || encounter_rate.encounter_rate_snapshot()),
        )?
        .register(
            "event_flags",
            &["flags", "ef", "ev fl", "fl"],
            Arc::new(EventFlagProducer {
                session: Arc::clone(session),
            }),
        )?
        .build();

    Ok(table)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn table() -> DispatchTable {
        build_dispatch_table(&Arc::new(BotSession::new())).unwrap()
    }

    #[test]
    fn registers_the_full_snapshot_set() {
        let table = table();
        let names: Vec<&str> = table.canonical_names().collect();
        assert_eq!(
            names,
            vec![
                "trainer",
                "party",
                "items",
                "emulator",
                "fps",
                "stats",
                "encounter_log",
                "shiny_log",
                "encounter_rate",
                "event_flags",
            ]
        );
    }

    #[test]
    fn short_command_forms_resolve_to_canonical_kinds() {
        let table = table();
        assert_eq!(table.resolve("pa").kind, "party");
        assert_eq!(table.resolve("BAG").kind, "items");
        assert_eq!(table.resolve("enc rate").kind, "encounter_rate");
        assert_eq!(table.resolve("shiny").kind, "shiny_log");
        assert_eq!(table.resolve("fl").kind, "event_flags");
    }

    #[test]
    fn trainer_resolves_with_data() {
        let table = table();
        let msg = table.resolve("trainer");
        assert_eq!(msg.kind, "trainer");
        assert_eq!(msg.data["name"], "MAY");
    }

    #[test]
    fn emulator_is_null_until_attached() {
        let table = table();
        assert_eq!(table.resolve("emu").data, Value::Null);
    }

    #[test]
    fn flag_filter_passes_through_the_table() {
        let session = Arc::new(BotSession::new());
        let table = build_dispatch_table(&session).unwrap();

        let mut params = QueryParams::new();
        params.insert(String::from("flag"), String::from("HAS_POKEDEX"));
        let filtered = table.capture_with("event_flags", &params).unwrap();
        assert_eq!(filtered.data, serde_json::json!({"HAS_POKEDEX": true}));

        params.insert(String::from("flag"), String::from("NOT_A_FLAG"));
        let fallback = table.capture_with("event_flags", &params).unwrap();
        assert!(fallback.data.as_object().unwrap().len() > 1);
    }
}
