//! Startup helper for embedding the observer in the bot process.
//!
//! The observer normally runs inside the process whose state it
//! exposes. [`spawn_observer`] binds eagerly -- so a bad address or an
//! occupied port fails at startup, not silently on a background task --
//! and then serves on a spawned task whose handle the embedder can
//! watch alongside the hub's broadcast-loop handle.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::info;

use crate::server::{self, ServerConfig, ServerError};
use crate::state::AppState;

/// Bind the observer server and serve it on a background Tokio task.
///
/// Returns the join handle of the serving task. The task only finishes
/// on a fatal I/O error, so the embedder should treat its completion
/// the same way it treats the broadcast loop finishing: log and exit.
///
/// # Errors
///
/// Returns [`ServerError`] if the address is invalid or the port
/// cannot be bound.
pub async fn spawn_observer(
    config: &ServerConfig,
    state: Arc<AppState>,
) -> Result<JoinHandle<Result<(), ServerError>>, ServerError> {
    let listener = server::bind(config).await?;
    let addr = config.addr();

    let handle = tokio::spawn(server::serve(listener, state));
    info!(%addr, "observer server spawned on background task");

    Ok(handle)
}
