//! Axum router construction for the observer server.
//!
//! The pull routes are generated from the dispatch table, so adding a
//! snapshot to the registry adds its endpoint without touching this
//! crate. Requests to paths outside the generated set are a
//! routing-level 404 handled by Axum's fallback, not by the hub.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::Router;
use sideband_types::QueryParams;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the observer server.
///
/// The router includes:
/// - `GET /` -- discovery: enumerate generated routes
/// - `GET /ws` -- `WebSocket` push endpoint
/// - `GET /<snapshot>` -- one pull route per registered snapshot name
///
/// CORS is configured to allow any origin so browser overlays can read
/// the endpoints directly.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new()
        .route("/", get(handlers::discovery))
        .route("/ws", get(ws::ws_push));

    for name in state.hub.table().canonical_names() {
        let snapshot = name.to_owned();
        router = router.route(
            &format!("/{name}"),
            get(
                move |State(state): State<Arc<AppState>>, Query(params): Query<QueryParams>| {
                    handlers::pull_snapshot(snapshot.clone(), state, params)
                },
            ),
        );
    }

    router
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
