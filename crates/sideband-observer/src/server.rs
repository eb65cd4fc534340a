//! Observer server lifecycle.
//!
//! Binding and serving are split so the caller can fail fast on a bad
//! address or occupied port before handing the listener to a background
//! task (see [`crate::startup::spawn_observer`]).

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::router::build_router;
use crate::state::AppState;

/// Network configuration for the observer server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The host address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// The TCP port to listen on.
    pub port: u16,
}

impl ServerConfig {
    /// The `host:port` string this configuration binds to.
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            port: 8080,
        }
    }
}

/// Errors that can occur while starting or running the observer server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The configured address could not be parsed.
    #[error("invalid listen address {addr}: {source}")]
    Addr {
        /// The offending `host:port` string.
        addr: String,
        /// The underlying parse error.
        #[source]
        source: std::net::AddrParseError,
    },

    /// The TCP listener could not bind.
    #[error("bind failed on {addr}: {source}")]
    Bind {
        /// The address that could not be bound.
        addr: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The server encountered a fatal I/O error while serving.
    #[error("serve error: {source}")]
    Serve {
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Bind the observer's TCP listener.
///
/// # Errors
///
/// Returns [`ServerError::Addr`] for an unparseable address and
/// [`ServerError::Bind`] if the port cannot be bound.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener, ServerError> {
    let addr_str = config.addr();
    let addr: SocketAddr = addr_str.parse().map_err(|source| ServerError::Addr {
        addr: addr_str.clone(),
        source,
    })?;

    TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr_str,
            source,
        })
}

/// Serve the observer API on an already-bound listener until the
/// process shuts down.
///
/// # Errors
///
/// Returns [`ServerError::Serve`] on a fatal I/O error.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> Result<(), ServerError> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, snapshots = state.hub.table().len(), "observer server listening");
    }

    let router = build_router(state);
    axum::serve(listener, router)
        .await
        .map_err(|source| ServerError::Serve { source })
}

/// Bind and serve in one call.
///
/// # Errors
///
/// Propagates the errors of [`bind`] and [`serve`].
pub async fn start_server(config: &ServerConfig, state: Arc<AppState>) -> Result<(), ServerError> {
    let listener = bind(config).await?;
    serve(listener, state).await
}
