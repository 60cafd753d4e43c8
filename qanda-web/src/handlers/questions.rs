//! Question answering and history handlers

use super::types::{ErrorResponse, HistoryItem, HistoryResponse, QueryRequest, QueryResponse};
use crate::{ApiResult, AppState};
use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::header,
    response::{IntoResponse, Json, Response},
};
use futures::StreamExt;
use qanda_applications::{Answer, DeliveryMode};
use std::convert::Infallible;
use tracing::info;

/// Ask a question
#[utoipa::path(
    post,
    path = "/api/query",
    tag = "Query",
    summary = "Ask a question",
    description = "Answer a question with the configured Gemini model. With `stream: true` the \
                   answer is sent as a chunked text/plain body; otherwise as JSON. The exchange \
                   is stored once the answer is complete.",
    request_body = QueryRequest,
    responses(
        (status = 200, description = "Answer (JSON when buffered, text/plain when streamed)", body = QueryResponse),
        (status = 400, description = "Empty question or malformed body", body = ErrorResponse),
        (status = 500, description = "Generation or storage failure", body = ErrorResponse)
    )
)]
pub async fn query(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = payload?;
    let question = request.question.trim();
    let mode = DeliveryMode::from(request.stream);

    match state.service.ask(question, mode).await? {
        Answer::Complete(answer) => {
            info!(answer_len = answer.len(), "Query answered");
            Ok(Json(QueryResponse {
                success: true,
                answer,
            })
            .into_response())
        }
        Answer::Streamed(fragments) => {
            let body = Body::from_stream(fragments.map(Ok::<_, Infallible>));
            Ok((
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                body,
            )
                .into_response())
        }
    }
}

/// Recent question history
#[utoipa::path(
    get,
    path = "/api/history",
    tag = "Query",
    summary = "Get query history",
    description = "The most recent questions and answers, newest first",
    responses(
        (status = 200, description = "Query history retrieved successfully", body = HistoryResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn history(State(state): State<AppState>) -> ApiResult<Json<HistoryResponse>> {
    let history: Vec<HistoryItem> = state
        .service
        .history()
        .await?
        .into_iter()
        .map(HistoryItem::from)
        .collect();

    Ok(Json(HistoryResponse {
        success: true,
        history,
    }))
}
