//! HTTP request handlers

mod health;
mod questions;
pub mod types;

pub use health::*;
pub use questions::*;
pub use types::*;

use axum::response::Html;

/// Single-page front-end
pub async fn index() -> Html<&'static str> {
    Html(include_str!("../../static/index.html"))
}
