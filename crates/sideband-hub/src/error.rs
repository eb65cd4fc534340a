//! Error types for the hub core.

/// Errors that can occur while building the dispatch table.
///
/// These are startup-time programmer errors; the table is built once and
/// never mutated afterwards.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// A snapshot name or alias was registered twice.
    #[error("duplicate snapshot name or alias: {name}")]
    Duplicate {
        /// The case-folded name that collided.
        name: String,
    },

    /// A snapshot name or alias was empty after trimming.
    #[error("empty snapshot name or alias (canonical name: {canonical})")]
    EmptyName {
        /// The canonical name the empty alias was registered under.
        canonical: String,
    },
}

/// Errors that terminate the broadcast loop.
///
/// Per-client delivery failures are *not* represented here -- they are
/// isolated to the failing client and handled inside the loop. An error
/// of this type means the loop itself can no longer make progress and
/// must be treated as fatal by the embedding process.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// A queued snapshot message could not be serialized for the wire.
    #[error("failed to serialize snapshot {kind:?} for broadcast: {source}")]
    Serialize {
        /// The snapshot kind that failed to serialize.
        kind: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}
