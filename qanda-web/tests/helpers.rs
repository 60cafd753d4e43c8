//! Integration test helpers
//!
//! Spawns the full application on an ephemeral port with an in-memory store
//! and a scripted generation client.

#![allow(dead_code)]

use std::sync::{Arc, LazyLock};

use qanda_core::QandaConfig;
use qanda_llm::ScriptedClient;
use qanda_store::SqliteQueryStore;
use qanda_web::AppState;
use serde_json::Value;
use tokio::net::TcpListener;

// Initialize tracing once per test binary
static TRACING: LazyLock<()> = LazyLock::new(|| {
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    } else {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_writer(std::io::sink)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }
});

pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
    pub client: ScriptedClient,
    pub store: Arc<SqliteQueryStore>,
}

impl TestApp {
    pub async fn post_query(&self, question: &str, stream: bool) -> reqwest::Response {
        self.post_json(&serde_json::json!({ "question": question, "stream": stream }))
            .await
    }

    pub async fn post_json(&self, body: &Value) -> reqwest::Response {
        self.api_client
            .post(format!("{}/api/query", &self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_raw(&self, body: &'static str) -> reqwest::Response {
        self.api_client
            .post(format!("{}/api/query", &self.address))
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.api_client
            .get(format!("{}{}", &self.address, path))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_history(&self) -> Value {
        self.get("/api/history")
            .await
            .json()
            .await
            .expect("History response is not JSON")
    }
}

/// Spawn the app answering every question with `client`'s script
pub async fn spawn_app(client: ScriptedClient) -> TestApp {
    LazyLock::force(&TRACING);

    let store = Arc::new(SqliteQueryStore::in_memory().await.unwrap());
    let state = AppState::with_services(
        QandaConfig::default(),
        Arc::new(client.clone()),
        store.clone(),
    );
    let app = qanda_web::create_app(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://{}", addr),
        api_client: reqwest::Client::new(),
        client,
        store,
    }
}
