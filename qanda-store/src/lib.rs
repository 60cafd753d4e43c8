//! Qanda Store - SQLite persistence for question/answer records
//!
//! Records live in a single append-only `user_queries` table. The schema is
//! created on connect if it does not exist yet.

use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use qanda_core::{storage_error, QandaResult, QueryRecord, QueryStore};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Row, SqlitePool,
};

/// Timestamps are written by SQLite as `YYYY-MM-DD HH:MM:SS.SSS` (UTC)
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// SQLite-backed [`QueryStore`]
#[derive(Debug, Clone)]
pub struct SqliteQueryStore {
    pool: SqlitePool,
}

impl SqliteQueryStore {
    /// Connect to `database_url` and make sure the schema exists
    pub async fn connect(database_url: &str) -> QandaResult<Self> {
        tracing::info!("Connecting to database: {}", database_url);

        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| storage_error!(format!("Invalid database URL: {}", e), "store", e))?
            .create_if_missing(true);

        let connected = if is_memory_url(database_url) {
            // Every connection to :memory: is its own database; keep exactly one alive
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await
        } else {
            ensure_parent_dir(database_url)?;
            SqlitePoolOptions::new().connect_with(options).await
        };

        let pool = connected.map_err(|e| {
            tracing::error!("Database connection failed: {}", e);
            storage_error!(format!("Failed to connect to database: {}", e), "store", e)
        })?;

        Self::create_tables(&pool).await?;
        tracing::info!("Database ready");

        Ok(Self { pool })
    }

    /// Private in-memory database
    pub async fn in_memory() -> QandaResult<Self> {
        Self::connect("sqlite::memory:").await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn create_tables(pool: &SqlitePool) -> QandaResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_queries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                question TEXT NOT NULL,
                answer TEXT NOT NULL,
                timestamp TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
            )
            "#,
        )
        .execute(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create user_queries table: {}", e);
            storage_error!(format!("Failed to create user_queries table: {}", e), "store", e)
        })?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_user_queries_timestamp ON user_queries (timestamp)",
        )
        .execute(pool)
        .await
        .map_err(|e| storage_error!(format!("Failed to create index: {}", e), "store", e))?;

        Ok(())
    }
}

#[async_trait]
impl QueryStore for SqliteQueryStore {
    async fn append(&self, question: &str, answer: &str) -> QandaResult<QueryRecord> {
        let row = sqlx::query(
            "INSERT INTO user_queries (question, answer) VALUES (?, ?) RETURNING id, question, answer, timestamp",
        )
        .bind(question)
        .bind(answer)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| storage_error!(format!("Failed to save query: {}", e), "store", e))?;

        let record = record_from_row(&row)?;
        tracing::debug!(id = record.id, answer_len = answer.len(), "Saved query");
        Ok(record)
    }

    async fn recent(&self, limit: u32) -> QandaResult<Vec<QueryRecord>> {
        let rows = sqlx::query(
            "SELECT id, question, answer, timestamp FROM user_queries ORDER BY timestamp DESC, id DESC LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error!(format!("Failed to get query history: {}", e), "store", e))?;

        rows.iter().map(record_from_row).collect()
    }

    async fn count(&self) -> QandaResult<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM user_queries")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| storage_error!(format!("Failed to count queries: {}", e), "store", e))?;

        let count: i64 = row
            .try_get("count")
            .map_err(|e| storage_error!(format!("Failed to read count: {}", e), "store", e))?;
        Ok(count.max(0) as u64)
    }
}

fn record_from_row(row: &SqliteRow) -> QandaResult<QueryRecord> {
    let read_err = |e: sqlx::Error| storage_error!(format!("Failed to read query row: {}", e), "store", e);

    let timestamp: String = row.try_get("timestamp").map_err(read_err)?;
    Ok(QueryRecord {
        id: row.try_get("id").map_err(read_err)?,
        question: row.try_get("question").map_err(read_err)?,
        answer: row.try_get("answer").map_err(read_err)?,
        timestamp: parse_timestamp(&timestamp)?,
    })
}

/// Parse SQLite's timestamp text (with or without fractional seconds) or RFC 3339
fn parse_timestamp(value: &str) -> QandaResult<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT) {
        return Ok(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| storage_error!(format!("Invalid timestamp '{}': {}", value, e), "store", e))
}

fn is_memory_url(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

/// Create the directory that will hold a file-backed database
fn ensure_parent_dir(database_url: &str) -> QandaResult<()> {
    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:");
    let path = path.split('?').next().unwrap_or(path);

    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            tracing::info!("Creating database directory: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                storage_error!(format!("Failed to create directory: {}", e), "store", e)
            })?;
        }
    }
    Ok(())
}
