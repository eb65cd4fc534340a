//! Shared type definitions for the Sideband telemetry hub.
//!
//! This crate is the leaf of the workspace: it defines the wire-level
//! [`SnapshotMessage`] exchanged with observers and the
//! [`SnapshotProducer`] trait through which the hub reads snapshot data
//! from the embedding process. Everything else (the hub core, the
//! transports, the runner) depends on these types; this crate depends
//! only on serde.

pub mod message;
pub mod producer;

// Re-export primary types for convenience.
pub use message::SnapshotMessage;
pub use producer::{producer_fn, ProducerError, QueryParams, SnapshotProducer};
