//! Observer transports for the Sideband telemetry hub.
//!
//! This crate provides the Axum server that exposes a running hub to
//! external observers:
//!
//! - **`WebSocket` push endpoint** (`/ws`): a persistent duplex
//!   connection that receives every broadcast and answers single-line,
//!   case-insensitive snapshot commands (aliases included) with a
//!   `{"type", "data"}` frame.
//! - **HTTP pull endpoints** (`GET /<snapshot>`): one route per
//!   registered snapshot name, generated from the dispatch table,
//!   returning the bare data value as JSON.
//! - **Discovery route** (`GET /`): enumerates the generated routes.
//!
//! # Architecture
//!
//! Both transports are thin adapters: every request ends in a call on
//! the shared [`sideband_hub::Hub`], and the push connections register
//! with its client registry so the broadcast loop can reach them. No
//! transport holds logic of its own beyond framing and teardown.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{start_server, ServerConfig, ServerError};
pub use startup::spawn_observer;
pub use state::AppState;
