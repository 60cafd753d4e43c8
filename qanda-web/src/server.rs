//! Qanda Web Server
//!
//! Main web server implementation using Axum.

use crate::{create_app, AppState};
use axum::serve;
use qanda_core::{QandaConfig, QandaResult};
use tokio::net::TcpListener;
use tracing::{error, info};

pub struct QandaServer {
    config: QandaConfig,
    state: AppState,
}

impl QandaServer {
    pub async fn new(config: QandaConfig) -> QandaResult<Self> {
        let state = AppState::new(config.clone()).await?;
        Ok(Self { config, state })
    }

    /// Serve until Ctrl-C
    pub async fn start(self) -> QandaResult<()> {
        let address = self.config.server.address();

        info!("Starting Qanda Web Server");
        info!("Model: {}", self.config.llm.model);

        let app = create_app(self.state);
        let listener = TcpListener::bind(&address).await?;

        info!("Server listening on http://{}", address);

        if let Err(e) = serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
        {
            error!("Server error: {}", e);
            return Err(e.into());
        }

        info!("Server stopped");
        Ok(())
    }

    pub fn config(&self) -> &QandaConfig {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Builder for QandaServer
pub struct QandaServerBuilder {
    config: QandaConfig,
}

impl QandaServerBuilder {
    pub fn new() -> Self {
        Self {
            config: QandaConfig::default(),
        }
    }

    /// Start from a loaded configuration
    pub fn config(mut self, config: QandaConfig) -> Self {
        self.config = config;
        self
    }

    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.config.server.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn database_url<S: Into<String>>(mut self, database_url: S) -> Self {
        self.config.storage.database_url = database_url.into();
        self
    }

    pub async fn build(self) -> QandaResult<QandaServer> {
        QandaServer::new(self.config).await
    }
}

impl Default for QandaServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_builder() {
        let builder = QandaServerBuilder::new()
            .host("localhost")
            .port(3000)
            .database_url("sqlite::memory:");

        assert_eq!(builder.config.server.host, "localhost");
        assert_eq!(builder.config.server.port, 3000);
        assert_eq!(builder.config.server.address(), "localhost:3000");
        assert_eq!(builder.config.storage.database_url, "sqlite::memory:");
    }

    #[tokio::test]
    async fn test_server_requires_api_key() {
        let mut config = QandaConfig::default();
        config.llm.api_key = None;
        config.storage.database_url = "sqlite::memory:".to_string();

        let server = QandaServerBuilder::new().config(config).build().await;
        assert!(server.is_err());
    }
}
