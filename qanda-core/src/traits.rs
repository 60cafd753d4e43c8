//! Core trait definitions

use crate::error::QandaResult;
use crate::types::*;
use async_trait::async_trait;

/// Remote text generation service
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Generate a complete answer in one request
    async fn generate(&self, prompt: &str) -> QandaResult<String>;

    /// Open a streaming generation.
    ///
    /// Errors returned here mean nothing was produced; errors yielded by the
    /// stream happen after some fragments may already have been delivered.
    async fn generate_stream(&self, prompt: &str) -> QandaResult<FragmentStream>;

    /// List the models available to this client
    async fn list_models(&self) -> QandaResult<Vec<ModelInfo>>;

    /// Model used for generation, for logging
    fn model_name(&self) -> &str;
}

/// Append-only store of question/answer records
#[async_trait]
pub trait QueryStore: Send + Sync {
    /// Append one record; the store assigns id and timestamp
    async fn append(&self, question: &str, answer: &str) -> QandaResult<QueryRecord>;

    /// The `limit` most recent records, newest first
    async fn recent(&self, limit: u32) -> QandaResult<Vec<QueryRecord>>;

    /// Total number of stored records
    async fn count(&self) -> QandaResult<u64>;
}
