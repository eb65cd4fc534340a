//! Error types for the observer transport layer.
//!
//! [`ObserverError`] unifies the pull-handler failure modes into a
//! single enum that converts into an HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.
//!
//! Note what is *not* here: unknown snapshot commands on the push
//! transport are answered with an `unknown`-typed frame by the hub, and
//! unknown flag values inside a recognized pull endpoint fall back to
//! the default result. Neither is an error.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors that can occur in the observer transport layer.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// The requested snapshot route has no table entry.
    ///
    /// Routes are generated from the dispatch table, so this only
    /// happens if the table and router ever disagree.
    #[error("snapshot not registered: {0}")]
    NotFound(String),

    /// A reply could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::NotFound(name) => (StatusCode::NOT_FOUND, format!("not found: {name}")),
            Self::Serialization(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("JSON error: {e}"))
            }
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
