//! Shared application state for the observer server.

use std::sync::Arc;

use sideband_hub::Hub;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor. The
/// observer owns no state of its own; everything goes through the hub,
/// whose dispatch table is immutable after startup and whose queue and
/// client registry are internally synchronized.
#[derive(Clone)]
pub struct AppState {
    /// The shared snapshot broadcast hub.
    pub hub: Arc<Hub>,
}

impl AppState {
    /// Create application state around a hub.
    #[must_use]
    pub const fn new(hub: Arc<Hub>) -> Self {
        Self { hub }
    }
}
