//! HTTP server lifecycle management.
//!
//! Provides [`start_server`], which binds the configured address and runs
//! the Axum server until the provided shutdown future resolves. The bind
//! address has already been validated by the config loader -- a
//! non-loopback bind only reaches this point with LAN mode explicitly
//! allowed and a token configured.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::router::build_router;
use crate::state::AppState;

/// Errors that can occur when starting or running the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to the network address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(String),
}

/// Start the HTTP front end.
///
/// Binds the configured address, builds the router, and serves requests
/// until `shutdown` resolves (in-flight requests are drained first).
/// Returns `Ok(())` on clean shutdown.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if the listener cannot bind, or
/// [`ServerError::Serve`] on a fatal I/O error while serving.
pub async fn start_server(
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServerError> {
    let host = state.config.network.bind_address.clone();
    let port = state.config.network.port;

    let listener = TcpListener::bind((host.as_str(), port))
        .await
        .map_err(|e| ServerError::Bind(format!("bind failed on {host}:{port}: {e}")))?;

    if let Ok(addr) = listener.local_addr() {
        info!(%addr, lan_mode = state.config.lan_mode(), "command API listening");
    }

    let router = build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ServerError::Serve(format!("serve error: {e}")))?;

    Ok(())
}
