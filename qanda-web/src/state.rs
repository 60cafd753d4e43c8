//! Application state shared by all handlers

use std::sync::Arc;

use qanda_applications::QueryService;
use qanda_core::{GenerationClient, QandaConfig, QandaResult, QueryStore};
use qanda_llm::GeminiClient;
use qanda_store::SqliteQueryStore;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<QandaConfig>,
    pub service: QueryService,
}

impl AppState {
    /// Connect the Gemini client and the configured database
    pub async fn new(config: QandaConfig) -> QandaResult<Self> {
        let client = GeminiClient::new(config.llm.clone())?;
        let store = SqliteQueryStore::connect(&config.storage.database_url).await?;
        info!(
            model = %config.llm.model,
            database = %config.storage.database_url,
            "Application state initialized"
        );

        Ok(Self::with_services(config, Arc::new(client), Arc::new(store)))
    }

    /// Build state around already constructed services
    pub fn with_services(
        config: QandaConfig,
        client: Arc<dyn GenerationClient>,
        store: Arc<dyn QueryStore>,
    ) -> Self {
        let service =
            QueryService::new(client, store).with_history_limit(config.server.history_limit);
        Self {
            config: Arc::new(config),
            service,
        }
    }
}
