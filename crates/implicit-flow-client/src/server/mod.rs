//! HTTP server for the implicit-flow client.

pub mod router;

use std::net::SocketAddr;

use crate::config::ClientConfig;

/// Implicit-flow client server.
#[derive(Debug)]
pub struct ClientServer {
    config: ClientConfig,
}

impl ClientServer {
    /// Create a new server.
    #[must_use]
    pub const fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Run the server until CTRL+C.
    ///
    /// # Errors
    ///
    /// Returns error if binding or serving fails.
    pub async fn run_http(self, addr: SocketAddr) -> anyhow::Result<()> {
        tracing::info!(
            client_id = %self.config.client_id,
            auth_endpoint = %self.config.auth_endpoint,
            redirect_uri = %self.config.redirect_uri,
            "Starting implicit-flow client"
        );

        let router = router::create_router(self.config);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("HTTP server listening on http://{}", addr);

        axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;

        tracing::info!("HTTP server shut down");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install CTRL+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Received shutdown signal");
}
