//! HTTP listener
//!
//! Binds the agent's port and serves the router until cancelled.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use super::handler::router;
use crate::state::PingerState;

/// HTTP server exposing the agent endpoints
pub struct PingerServer {
    /// Shared agent state
    state: Arc<PingerState>,
    /// Cancellation token for graceful shutdown
    cancel: CancellationToken,
}

impl PingerServer {
    /// Create a new server
    pub fn new(state: Arc<PingerState>, cancel: CancellationToken) -> Self {
        Self { state, cancel }
    }

    /// Bind `bind_addr` and serve until cancelled
    pub async fn run(&self, bind_addr: &str) -> Result<()> {
        let listener = TcpListener::bind(bind_addr)
            .await
            .with_context(|| format!("Failed to bind to {}", bind_addr))?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener until cancelled
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let local_addr = listener.local_addr()?;
        tracing::info!("Pinger listening on {}", local_addr);

        let cancel = self.cancel.clone();
        axum::serve(listener, router(Arc::clone(&self.state)))
            .with_graceful_shutdown(async move {
                cancel.cancelled().await;
                tracing::info!("HTTP server shutting down");
            })
            .await
            .context("HTTP server failed")?;

        Ok(())
    }
}
