//! Route definitions for the qanda web server

use crate::{handlers, AppState};
use axum::{
    routing::{get, post},
    Router,
};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/openapi.json", get(handlers::openapi_spec))
        .route("/query", post(handlers::query))
        .route("/history", get(handlers::history))
}
