//! Observer server startup helper for embedding in the runner.
//!
//! [`spawn_observer`] binds the listener eagerly, so a port conflict is
//! reported at startup, then serves on a background Tokio task alongside
//! the refresh loop.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::server::{self, ServerConfig, ServerError};
use crate::state::AppState;

/// Errors that can occur when spawning the Observer server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// A running observer task.
pub struct ObserverHandle {
    /// The address actually bound (useful when port 0 was requested).
    pub addr: SocketAddr,
    /// The background serve task.
    pub task: JoinHandle<()>,
}

/// Spawn the Observer HTTP server on a background Tokio task.
///
/// The caller holds the returned handle and aborts the task during
/// shutdown.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the address is invalid or cannot
/// be bound.
pub async fn spawn_observer(
    config: &ServerConfig,
    state: Arc<AppState>,
) -> Result<ObserverHandle, StartupError> {
    let listener = server::bind(config).await?;
    let addr = listener
        .local_addr()
        .map_err(|e| ServerError::Bind(format!("failed to read bound address: {e}")))?;

    let task = tokio::spawn(async move {
        if let Err(e) = server::serve(listener, state).await {
            tracing::error!(error = %e, "Observer server exited with error");
        }
    });

    tracing::info!(%addr, "Observer server spawned on background task");

    Ok(ObserverHandle { addr, task })
}
