//! Persistence tests for the SQLite query store

use qanda_core::QueryStore;
use qanda_store::SqliteQueryStore;

#[tokio::test]
async fn test_append_assigns_ids_and_timestamps() {
    let store = SqliteQueryStore::in_memory().await.unwrap();

    let first = store.append("What is 2+2?", "4").await.unwrap();
    let second = store.append("Capital of France?", "Paris").await.unwrap();

    assert!(second.id > first.id);
    assert_eq!(first.question, "What is 2+2?");
    assert_eq!(first.answer, "4");
    assert!(second.timestamp >= first.timestamp);
    assert_eq!(store.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_recent_is_newest_first_and_limited() {
    let store = SqliteQueryStore::in_memory().await.unwrap();

    for i in 0..20 {
        store
            .append(&format!("question {}", i), &format!("answer {}", i))
            .await
            .unwrap();
    }

    let history = store.recent(15).await.unwrap();
    assert_eq!(history.len(), 15);
    assert_eq!(history[0].question, "question 19");
    assert_eq!(history[14].question, "question 5");

    for pair in history.windows(2) {
        assert!(pair[0].timestamp >= pair[1].timestamp);
        assert!(pair[0].id > pair[1].id);
    }
}

#[tokio::test]
async fn test_recent_on_empty_store() {
    let store = SqliteQueryStore::in_memory().await.unwrap();
    assert!(store.recent(15).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_file_database_survives_reconnect() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("queries.db");
    let url = format!("sqlite:{}", path.display());

    {
        let store = SqliteQueryStore::connect(&url).await.unwrap();
        store.append("persisted?", "yes").await.unwrap();
        store.pool().close().await;
    }

    // Schema creation is idempotent on an existing database
    let store = SqliteQueryStore::connect(&url).await.unwrap();
    let history = store.recent(15).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].answer, "yes");
}

#[tokio::test]
async fn test_reads_rows_written_with_second_precision() {
    let store = SqliteQueryStore::in_memory().await.unwrap();

    sqlx::query("INSERT INTO user_queries (question, answer, timestamp) VALUES (?, ?, ?)")
        .bind("old")
        .bind("row")
        .bind("2024-01-01 08:00:00")
        .execute(store.pool())
        .await
        .unwrap();
    store.append("new", "row").await.unwrap();

    let history = store.recent(15).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].question, "new");
    assert_eq!(history[1].question, "old");
}
