//! Request and response bodies

use qanda_core::QueryRecord;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Question submitted to `/api/query`
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct QueryRequest {
    #[schema(example = "What is 2+2?")]
    pub question: String,
    /// Stream the answer as plain text instead of returning JSON
    #[schema(example = false)]
    pub stream: bool,
}

/// Buffered answer
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QueryResponse {
    #[schema(example = true)]
    pub success: bool,
    #[schema(example = "4")]
    pub answer: String,
}

/// One stored exchange
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HistoryItem {
    pub question: String,
    pub answer: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl From<QueryRecord> for HistoryItem {
    fn from(record: QueryRecord) -> Self {
        Self {
            question: record.question,
            answer: record.answer,
            timestamp: record.timestamp,
        }
    }
}

/// Most recent exchanges, newest first
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HistoryResponse {
    #[schema(example = true)]
    pub success: bool,
    pub history: Vec<HistoryItem>,
}

/// Failure envelope
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = false)]
    pub success: bool,
    #[schema(example = "Question cannot be empty")]
    pub error: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "healthy")]
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    #[schema(example = "0.1.0")]
    pub version: String,
}
