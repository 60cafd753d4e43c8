//! Core data type definitions

use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::error::QandaResult;

/// A persisted question/answer exchange.
///
/// Records are append-only: once the store assigns an `id` the record is never
/// updated or deleted by qanda itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRecord {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub timestamp: DateTime<Utc>,
}

/// One item of a streaming generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// Incremental answer text. May be empty.
    Text(String),
    /// The remote service suppressed this chunk (safety block, no text parts).
    Withheld { reason: Option<String> },
}

impl Fragment {
    pub fn text(text: impl Into<String>) -> Self {
        Fragment::Text(text.into())
    }

    /// Returns the text if this fragment carries any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Fragment::Text(text) if !text.is_empty() => Some(text),
            _ => None,
        }
    }
}

/// Lazy, finite, non-restartable fragment sequence produced by a generation client
pub type FragmentStream = BoxStream<'static, QandaResult<Fragment>>;

/// A model exposed by the generation service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Fully qualified name, e.g. `models/gemini-pro-latest`
    pub name: String,
    pub display_name: Option<String>,
    pub supported_methods: Vec<String>,
}

impl ModelInfo {
    /// Whether the model can answer `generateContent` requests
    pub fn supports_generation(&self) -> bool {
        self.supported_methods
            .iter()
            .any(|method| method == "generateContent")
    }
}
