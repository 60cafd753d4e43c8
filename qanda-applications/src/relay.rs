//! Stream relay
//!
//! Forwards answer fragments to a consumer as they arrive, accumulates the
//! complete answer alongside, and persists it once the fragment sequence has
//! ended. A failure in the middle of the sequence is reported inline with an
//! error marker rather than aborting the consumer's stream.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use qanda_core::{
    performance, validation_error, ErrorContext, FragmentStream, GenerationClient, QandaError,
    QandaResult, QueryRecord, QueryStore,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, warn, Instrument};

const DEFAULT_CHANNEL_CAPACITY: usize = 32;

/// Text appended to the answer when generation fails mid-stream
pub fn error_marker(cause: &str) -> String {
    format!("\n\n[Error: {}]", cause)
}

/// How a fragment sequence ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The sequence was exhausted, or the consumer stopped listening
    Finished(String),
    /// The sequence failed; `text` already ends with the error marker
    Failed { text: String, cause: String },
}

impl RelayOutcome {
    /// Accumulated answer, including the error marker if any
    pub fn text(&self) -> &str {
        match self {
            RelayOutcome::Finished(text) | RelayOutcome::Failed { text, .. } => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            RelayOutcome::Finished(text) | RelayOutcome::Failed { text, .. } => text,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RelayOutcome::Failed { .. })
    }

    /// Whitespace-only answers are never stored
    pub fn should_persist(&self) -> bool {
        !self.text().trim().is_empty()
    }
}

/// Consume `fragments`, forwarding each non-empty text to `sink`.
///
/// Withheld and empty fragments are skipped. The accumulated text is exactly
/// what was forwarded. If the sink is closed the relay stops early and the
/// upstream sequence is dropped.
pub async fn drive(
    mut fragments: FragmentStream,
    sink: Option<&mpsc::Sender<String>>,
) -> RelayOutcome {
    let mut accumulated = String::new();

    while let Some(item) = fragments.next().await {
        match item {
            Ok(fragment) => {
                let Some(text) = fragment.as_text() else {
                    debug!(?fragment, "Skipping fragment without text");
                    continue;
                };
                if let Some(sink) = sink {
                    if sink.send(text.to_string()).await.is_err() {
                        info!(
                            delivered = accumulated.len(),
                            "Consumer disconnected, stopping relay"
                        );
                        return RelayOutcome::Finished(accumulated);
                    }
                }
                accumulated.push_str(text);
            }
            Err(e) => {
                e.log();
                let cause = e.cause();
                let marker = error_marker(&cause);
                if let Some(sink) = sink {
                    // The consumer may already be gone; the marker is still recorded
                    let _ = sink.send(marker.clone()).await;
                }
                accumulated.push_str(&marker);
                return RelayOutcome::Failed {
                    text: accumulated,
                    cause,
                };
            }
        }
    }

    RelayOutcome::Finished(accumulated)
}

/// Relays generated answers to callers and records them in the store
#[derive(Clone)]
pub struct StreamRelay {
    client: Arc<dyn GenerationClient>,
    store: Arc<dyn QueryStore>,
    channel_capacity: usize,
}

impl StreamRelay {
    pub fn new(client: Arc<dyn GenerationClient>, store: Arc<dyn QueryStore>) -> Self {
        Self {
            client,
            store,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Number of fragments buffered ahead of a slow consumer
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    pub fn model_name(&self) -> &str {
        self.client.model_name()
    }

    /// Start relaying an answer to `question`.
    ///
    /// Fails without persisting anything if the question is blank or the
    /// generation cannot be opened. Otherwise the relay runs on its own task;
    /// the returned stream ends after the answer has been finalized.
    pub async fn stream(&self, question: &str) -> QandaResult<RelayStream> {
        ensure_question(question)?;
        let fragments = self.client.generate_stream(question).await?;

        let (sender, receiver) = mpsc::channel(self.channel_capacity);
        let relay = self.clone();
        let question = question.to_string();
        let span = info_span!("relay", model = %self.client.model_name());

        let finalization = tokio::spawn(
            async move {
                let outcome = drive(fragments, Some(&sender)).await;
                let result = relay.finalize(&question, &outcome).await;
                if let Err(e) = &result {
                    // The answer has already been delivered; only the record is lost
                    e.log();
                }
                drop(sender);
                result
            }
            .instrument(span),
        );

        Ok(RelayStream {
            receiver,
            finalization,
        })
    }

    /// Generate a complete answer to `question`, then persist it.
    ///
    /// A mid-stream failure still produces an answer ending in the error
    /// marker. Persistence failures are returned to the caller.
    pub async fn buffered(&self, question: &str) -> QandaResult<String> {
        ensure_question(question)?;
        let fragments = self.client.generate_stream(question).await?;

        let outcome = performance::measure_async("relay_buffered", drive(fragments, None)).await;
        self.finalize(question, &outcome).await?;
        Ok(outcome.into_text())
    }

    /// Persist the outcome of one relay if it carries any text
    pub async fn finalize(
        &self,
        question: &str,
        outcome: &RelayOutcome,
    ) -> QandaResult<Option<QueryRecord>> {
        if !outcome.should_persist() {
            debug!("Answer is blank, nothing to persist");
            return Ok(None);
        }
        if outcome.is_failed() {
            warn!("Persisting answer that ended with a generation error");
        }

        let record = self.store.append(question, outcome.text()).await?;
        info!(id = record.id, answer_len = record.answer.len(), "Answer persisted");
        Ok(Some(record))
    }
}

fn ensure_question(question: &str) -> QandaResult<()> {
    if question.trim().is_empty() {
        return Err(validation_error!(
            "Question cannot be empty",
            "question",
            "stream_relay"
        ));
    }
    Ok(())
}

/// Receiving end of a running relay
pub struct RelayStream {
    receiver: mpsc::Receiver<String>,
    finalization: JoinHandle<QandaResult<Option<QueryRecord>>>,
}

impl RelayStream {
    /// Stop receiving and wait for the relay to finalize.
    ///
    /// Fragments not yet received are discarded; if the relay was still
    /// running, whatever had been delivered so far is persisted.
    pub async fn finish(self) -> QandaResult<Option<QueryRecord>> {
        let RelayStream {
            receiver,
            finalization,
        } = self;
        drop(receiver);

        finalization.await.map_err(|e| QandaError::Internal {
            message: format!("Relay task failed: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("stream_relay").with_operation("finish"),
        })?
    }
}

impl Stream for RelayStream {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use qanda_core::{generation_error, Fragment};

    fn fragments(items: Vec<QandaResult<Fragment>>) -> FragmentStream {
        stream::iter(items).boxed()
    }

    #[test]
    fn marker_format() {
        assert_eq!(error_marker("quota exceeded"), "\n\n[Error: quota exceeded]");
    }

    #[tokio::test]
    async fn drive_accumulates_and_skips_empty() {
        let (tx, mut rx) = mpsc::channel(8);
        let outcome = drive(
            fragments(vec![
                Ok(Fragment::text("Hel")),
                Ok(Fragment::text("")),
                Ok(Fragment::Withheld {
                    reason: Some("SAFETY".to_string()),
                }),
                Ok(Fragment::text("lo")),
            ]),
            Some(&tx),
        )
        .await;
        drop(tx);

        let mut forwarded = Vec::new();
        while let Some(text) = rx.recv().await {
            forwarded.push(text);
        }
        assert_eq!(forwarded, vec!["Hel", "lo"]);
        assert_eq!(outcome, RelayOutcome::Finished("Hello".to_string()));
    }

    #[tokio::test]
    async fn drive_appends_marker_on_error() {
        let (tx, mut rx) = mpsc::channel(8);
        let outcome = drive(
            fragments(vec![
                Ok(Fragment::text("Partial")),
                Err(generation_error!("connection reset", "test")),
                Ok(Fragment::text("never")),
            ]),
            Some(&tx),
        )
        .await;
        drop(tx);

        let mut forwarded = Vec::new();
        while let Some(text) = rx.recv().await {
            forwarded.push(text);
        }
        assert_eq!(forwarded, vec!["Partial", "\n\n[Error: connection reset]"]);
        assert!(outcome.is_failed());
        assert_eq!(outcome.text(), "Partial\n\n[Error: connection reset]");
    }

    #[tokio::test]
    async fn drive_stops_when_consumer_is_gone() {
        let (tx, rx) = mpsc::channel(8);
        drop(rx);

        let outcome = drive(fragments(vec![Ok(Fragment::text("a"))]), Some(&tx)).await;
        assert_eq!(outcome, RelayOutcome::Finished(String::new()));
        assert!(!outcome.should_persist());
    }

    #[test]
    fn blank_outcomes_are_not_persisted() {
        assert!(!RelayOutcome::Finished("  \n\t".to_string()).should_persist());
        assert!(RelayOutcome::Finished(" 4 ".to_string()).should_persist());
        assert!(RelayOutcome::Failed {
            text: error_marker("x"),
            cause: "x".to_string()
        }
        .should_persist());
    }
}
