//! Relay and query service behaviour against scripted generation and an in-memory store

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use qanda_applications::{Answer, DeliveryMode, QueryService, StreamRelay};
use qanda_core::{storage_error, QandaError, QandaResult, QueryRecord, QueryStore};
use qanda_llm::ScriptedClient;
use qanda_store::SqliteQueryStore;

struct BrokenStore;

#[async_trait]
impl QueryStore for BrokenStore {
    async fn append(&self, _question: &str, _answer: &str) -> QandaResult<QueryRecord> {
        Err(storage_error!("database is locked", "test"))
    }

    async fn recent(&self, _limit: u32) -> QandaResult<Vec<QueryRecord>> {
        Err(storage_error!("database is locked", "test"))
    }

    async fn count(&self) -> QandaResult<u64> {
        Ok(0)
    }
}

async fn setup(client: ScriptedClient) -> (StreamRelay, Arc<SqliteQueryStore>) {
    let store = Arc::new(SqliteQueryStore::in_memory().await.unwrap());
    let relay = StreamRelay::new(Arc::new(client), store.clone());
    (relay, store)
}

#[tokio::test]
async fn test_stream_forwards_and_persists_once() {
    let (relay, store) = setup(ScriptedClient::with_fragments(["Hel", "", "lo"])).await;

    let mut stream = relay.stream("Say hello").await.unwrap();
    let mut forwarded = Vec::new();
    while let Some(text) = stream.next().await {
        forwarded.push(text);
    }
    let record = stream.finish().await.unwrap().unwrap();

    assert_eq!(forwarded, vec!["Hel", "lo"]);
    assert_eq!(record.question, "Say hello");
    assert_eq!(record.answer, "Hello");
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_withheld_fragments_are_skipped() {
    let client = ScriptedClient::new()
        .text("The answer")
        .withheld(Some("SAFETY"))
        .text(" is 4");
    let (relay, store) = setup(client).await;

    let answer = relay.buffered("What is 2+2?").await.unwrap();
    assert_eq!(answer, "The answer is 4");
    assert_eq!(store.recent(15).await.unwrap()[0].answer, "The answer is 4");
}

#[tokio::test]
async fn test_blank_answer_is_not_persisted() {
    let client = ScriptedClient::new().text("  ").withheld(None).text("\n");
    let (relay, store) = setup(client).await;

    let stream = relay.stream("anything").await.unwrap();
    let forwarded: Vec<String> = stream.collect().await;
    assert_eq!(forwarded, vec!["  ", "\n"]);

    // The stream only ends once the relay has finalized
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_mid_stream_failure_is_reported_inline() {
    let client = ScriptedClient::with_fragments(["Partial answer"]).fail("connection reset");
    let (relay, store) = setup(client).await;

    let mut stream = relay.stream("Tell me more").await.unwrap();
    let mut body = String::new();
    while let Some(text) = stream.next().await {
        body.push_str(&text);
    }
    let record = stream.finish().await.unwrap().unwrap();

    assert_eq!(body, "Partial answer\n\n[Error: connection reset]");
    assert_eq!(record.answer, body);
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_failure_before_any_text_persists_marker() {
    let (relay, store) = setup(ScriptedClient::new().fail("quota exceeded")).await;

    let answer = relay.buffered("q").await.unwrap();
    assert_eq!(answer, "\n\n[Error: quota exceeded]");
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_open_failure_persists_nothing() {
    let (relay, store) = setup(ScriptedClient::new().fail_on_open("API key not valid")).await;

    assert!(matches!(
        relay.stream("q").await,
        Err(QandaError::Generation { .. })
    ));
    assert!(matches!(
        relay.buffered("q").await,
        Err(QandaError::Generation { .. })
    ));
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_blank_question_never_reaches_client() {
    let client = ScriptedClient::with_fragments(["unused"]);
    let store = Arc::new(SqliteQueryStore::in_memory().await.unwrap());
    let relay = StreamRelay::new(Arc::new(client.clone()), store);

    for question in ["", "   ", "\n\t"] {
        match relay.buffered(question).await {
            Err(e @ QandaError::Validation { .. }) => {
                assert_eq!(e.cause(), "Question cannot be empty")
            }
            other => panic!("expected validation error, got {:?}", other.map(|_| ())),
        }
        assert!(relay.stream(question).await.is_err());
    }
    assert!(client.prompts().is_empty());
}

async fn wait_for_records(store: &SqliteQueryStore, expected: u64) -> Vec<QueryRecord> {
    for _ in 0..100 {
        if store.count().await.unwrap() >= expected {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    store.recent(15).await.unwrap()
}

#[tokio::test]
async fn test_disconnect_persists_delivered_text() {
    let client = ScriptedClient::with_fragments(["a", "b", "c", "d"])
        .with_delay(Duration::from_millis(100));
    let (relay, store) = setup(client).await;
    let relay = relay.with_channel_capacity(1);

    let mut stream = relay.stream("letters").await.unwrap();
    assert_eq!(stream.next().await.as_deref(), Some("a"));
    let record = stream.finish().await.unwrap().unwrap();

    assert_eq!(record.answer, "a");
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_dropped_stream_still_persists() {
    let client = ScriptedClient::with_fragments(["a", "b", "c", "d"])
        .with_delay(Duration::from_millis(100));
    let (relay, store) = setup(client).await;
    let relay = relay.with_channel_capacity(1);

    let mut stream = relay.stream("letters").await.unwrap();
    assert_eq!(stream.next().await.as_deref(), Some("a"));
    // Consumers such as an HTTP body just drop the stream
    drop(stream);

    let records = wait_for_records(&store, 1).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].question, "letters");
    assert_eq!(records[0].answer, "a");

    // Nothing further is written once the relay has stopped
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_persistence_failure_in_each_mode() {
    let store: Arc<dyn QueryStore> = Arc::new(BrokenStore);
    let relay = StreamRelay::new(Arc::new(ScriptedClient::with_fragments(["4"])), store);

    // Buffered callers see the failure
    assert!(matches!(
        relay.buffered("2+2").await,
        Err(QandaError::Storage { .. })
    ));

    // Streaming callers already have the answer
    let mut stream = relay.stream("2+2").await.unwrap();
    assert_eq!(stream.next().await.as_deref(), Some("4"));
    assert_eq!(stream.next().await, None);
    assert!(stream.finish().await.is_err());
}

#[tokio::test]
async fn test_service_modes_and_history() {
    let store = Arc::new(SqliteQueryStore::in_memory().await.unwrap());
    let service = QueryService::new(Arc::new(ScriptedClient::with_fragments(["4"])), store)
        .with_history_limit(3);

    for i in 0..5 {
        match service
            .ask(&format!("question {}", i), DeliveryMode::from(i % 2 == 0))
            .await
            .unwrap()
        {
            Answer::Complete(text) => assert_eq!(text, "4"),
            Answer::Streamed(stream) => {
                let mut stream = stream;
                assert_eq!(stream.next().await.as_deref(), Some("4"));
                assert_eq!(stream.next().await, None);
                stream.finish().await.unwrap();
            }
        }
    }

    let history = service.history().await.unwrap();
    assert_eq!(service.count().await.unwrap(), 5);
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].question, "question 4");
    assert_eq!(history[2].question, "question 2");
}
