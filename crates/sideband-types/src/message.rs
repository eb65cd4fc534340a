//! The snapshot message exchanged with observers.
//!
//! A [`SnapshotMessage`] is an immutable `{type, data}` pair produced by
//! invoking a snapshot producer at a specific instant. The same shape is
//! used on both transports: WebSocket frames carry the whole structure,
//! the HTTP pull endpoints return the bare `data` value.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named snapshot of the observed process at a specific instant.
///
/// Serialized as `{"type": <name>, "data": <value-or-null>}`. Once
/// constructed a message is never mutated; `data` is `null` when no
/// value was available at capture time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMessage {
    /// The canonical snapshot name (or [`Self::UNKNOWN_KIND`]).
    #[serde(rename = "type")]
    pub kind: String,

    /// The captured value, or `null` when nothing was available.
    pub data: Value,
}

impl SnapshotMessage {
    /// The message kind used for requests that match no registered
    /// snapshot name.
    pub const UNKNOWN_KIND: &'static str = "unknown";

    /// Create a message from a kind and an already-captured value.
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }

    /// Create a message with `null` data (snapshot currently unavailable).
    pub fn empty(kind: impl Into<String>) -> Self {
        Self::new(kind, Value::Null)
    }

    /// Create the well-defined reply for an unrecognized request,
    /// carrying the original raw input as `data`.
    pub fn unknown(raw: &str) -> Self {
        Self::new(Self::UNKNOWN_KIND, Value::String(raw.to_owned()))
    }

    /// Whether this message is the unknown-name reply.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.kind == Self::UNKNOWN_KIND
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_field() {
        let msg = SnapshotMessage::new("party", serde_json::json!([{"species": "Mudkip"}]));
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "party");
        assert_eq!(json["data"][0]["species"], "Mudkip");
    }

    #[test]
    fn empty_message_has_null_data() {
        let msg = SnapshotMessage::empty("emulator");
        assert_eq!(msg.data, Value::Null);
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"type":"emulator","data":null}"#);
    }

    #[test]
    fn unknown_carries_raw_input() {
        let msg = SnapshotMessage::unknown("PARTYY");
        assert!(msg.is_unknown());
        assert_eq!(msg.data, Value::String("PARTYY".to_owned()));
    }

    #[test]
    fn round_trips_through_serde() {
        let msg = SnapshotMessage::new("stats", serde_json::json!({"encounters": 42}));
        let json = serde_json::to_string(&msg).unwrap();
        let back: SnapshotMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }
}
