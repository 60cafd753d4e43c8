//! OpenAPI specification for the qanda HTTP API

use utoipa::OpenApi;

use crate::handlers::{
    ErrorResponse, HealthResponse, HistoryItem, HistoryResponse, QueryRequest, QueryResponse,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Qanda API",
        version = "0.1.0",
        description = "Ask Gemini questions and browse previous answers",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:5000", description = "Local development server")
    ),
    paths(
        crate::handlers::health_check,
        crate::handlers::query,
        crate::handlers::history,
    ),
    components(
        schemas(
            QueryRequest,
            QueryResponse,
            HistoryItem,
            HistoryResponse,
            ErrorResponse,
            HealthResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Query", description = "Question answering and history")
    )
)]
pub struct ApiDoc;
