//! Ingress HTTP server.

use scribe_core::ServerConfig;
use tokio::net::TcpListener;

use crate::error::ServerError;
use crate::routes;
use crate::state::AppState;

/// The ingress API server.
pub struct ApiServer {
    config: ServerConfig,
    state: AppState,
}

impl ApiServer {
    /// Create a new server over the given state.
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Bind and serve until the process shuts down.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!(address = %self.config.listen, "starting scribe ingress");

        let app = routes::create_router(self.state);

        let listener = TcpListener::bind(&self.config.listen)
            .await
            .map_err(|e| ServerError::Startup(e.to_string()))?;

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Startup(e.to_string()))?;

        Ok(())
    }

    /// The configured bind address.
    pub fn listen_addr(&self) -> &str {
        &self.config.listen
    }
}
