//! Query service facade shared by the web and CLI front-ends

use std::sync::Arc;

use qanda_core::{GenerationClient, QandaResult, QueryRecord, QueryStore};
use tracing::info;

use crate::relay::{RelayStream, StreamRelay};

/// Number of records returned by [`QueryService::history`] unless configured otherwise
pub const DEFAULT_HISTORY_LIMIT: u32 = 15;

/// How the caller wants to receive the answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    Buffered,
    Streaming,
}

impl From<bool> for DeliveryMode {
    fn from(streaming: bool) -> Self {
        if streaming {
            DeliveryMode::Streaming
        } else {
            DeliveryMode::Buffered
        }
    }
}

/// An answer in the requested delivery mode
pub enum Answer {
    /// Complete text, already persisted
    Complete(String),
    /// Live fragments; persisted once the stream ends
    Streamed(RelayStream),
}

#[derive(Clone)]
pub struct QueryService {
    relay: StreamRelay,
    store: Arc<dyn QueryStore>,
    history_limit: u32,
}

impl QueryService {
    pub fn new(client: Arc<dyn GenerationClient>, store: Arc<dyn QueryStore>) -> Self {
        Self {
            relay: StreamRelay::new(client, store.clone()),
            store,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    pub fn with_history_limit(mut self, limit: u32) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn relay(&self) -> &StreamRelay {
        &self.relay
    }

    pub async fn ask(&self, question: &str, mode: DeliveryMode) -> QandaResult<Answer> {
        info!(
            model = %self.relay.model_name(),
            ?mode,
            question_len = question.len(),
            "Answering question"
        );

        match mode {
            DeliveryMode::Buffered => self.relay.buffered(question).await.map(Answer::Complete),
            DeliveryMode::Streaming => self.relay.stream(question).await.map(Answer::Streamed),
        }
    }

    /// Most recent exchanges, newest first
    pub async fn history(&self) -> QandaResult<Vec<QueryRecord>> {
        self.store.recent(self.history_limit).await
    }

    pub async fn count(&self) -> QandaResult<u64> {
        self.store.count().await
    }
}
