//! Snapshot broadcast hub for the Sideband telemetry server.
//!
//! This crate is the core of the system: it accepts snapshot-invalidation
//! signals from the embedding process, queues the captured snapshots, and
//! fans them out to every connected push listener on a fixed period while
//! also answering synchronous named lookups for both transports through
//! one shared dispatch table.
//!
//! # Architecture
//!
//! ```text
//! invalidate(name) --> DispatchTable --> UpdateQueue --+
//!                                                      |  (1s tick)
//! resolve(raw) ------> DispatchTable                   v
//!                                            broadcast loop --> ClientRegistry
//! ```
//!
//! The [`Hub`] owns the only shared mutable state (the queue and the
//! client registry); both are internally synchronized, so many connection
//! tasks plus the single broadcast-loop task can call in without external
//! locking. The dispatch table is immutable after startup.
//!
//! Failure isolation: a producer failure or a single client's write
//! failure never disturbs the other snapshots or clients. Anything going
//! wrong inside the loop itself is fatal -- the loop task finishes with an
//! error, and the embedding binary is expected to treat that as a reason
//! to exit loudly rather than run with a silently stalled broadcast.

mod broadcast;

pub mod clients;
pub mod dispatch;
pub mod error;
pub mod hub;
pub mod queue;

// Re-export primary types for convenience.
pub use clients::{ClientHandle, ClientId, ClientRegistry};
pub use dispatch::{DispatchTable, DispatchTableBuilder};
pub use error::{DispatchError, HubError};
pub use hub::Hub;
pub use queue::UpdateQueue;
