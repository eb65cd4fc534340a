//! HTTP pull endpoint handlers.
//!
//! Every registered snapshot gets one `GET /<name>` route (generated in
//! [`crate::router`]); the handler performs exactly one dispatch-table
//! lookup and one synchronous reply. The pull transport never touches
//! the client registry or the update queue.
//!
//! # Reply shape
//!
//! Pull replies carry the **bare data value** (not the `{type, data}`
//! envelope used on the push transport): the route path already names
//! the snapshot, so the envelope would be redundant. A snapshot with no
//! current value serializes as `null`.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde_json::Value;
use sideband_types::QueryParams;

use crate::error::ObserverError;
use crate::state::AppState;

/// Serve one pull lookup for the snapshot the route was generated for.
///
/// Query parameters are forwarded to the producer: recognized values
/// filter the result (for example `/event_flags?flag=BADGE01`), while
/// unrecognized values fall back to the default result rather than an
/// error. Producer failures surface as `null`, matching the push
/// transport.
///
/// # Errors
///
/// Returns [`ObserverError::NotFound`] only if the router and the
/// dispatch table disagree, which would be a wiring bug.
pub async fn pull_snapshot(
    name: String,
    state: Arc<AppState>,
    params: QueryParams,
) -> Result<Json<Value>, ObserverError> {
    let message = state
        .hub
        .table()
        .capture_with(&name, &params)
        .ok_or_else(|| ObserverError::NotFound(name))?;
    Ok(Json(message.data))
}

/// Serve `GET /`: enumerate the generated pull routes and the push
/// endpoint with their allowed methods.
pub async fn discovery(State(state): State<Arc<AppState>>) -> Json<Value> {
    let mut routes = serde_json::Map::new();
    for name in state.hub.table().canonical_names() {
        routes.insert(
            format!("/{name}"),
            serde_json::json!({"methods": ["GET"]}),
        );
    }
    routes.insert(
        "/ws".to_owned(),
        serde_json::json!({"methods": ["GET"], "protocol": "websocket"}),
    );
    Json(Value::Object(routes))
}
