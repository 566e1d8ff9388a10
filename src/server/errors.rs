//! Per-request failures of the query endpoint

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::search::SearchError;

/// Failure of one query request
///
/// Every variant answers `500` with an empty body; the cause is only logged.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Search request has an empty body")]
    EmptyRequest,

    #[error("Failed to read search request body: {0}")]
    ReadBody(String),

    #[error("Search failed: {0}")]
    Execution(#[from] SearchError),

    #[error("Failed to encode search results: {0}")]
    Encode(#[from] serde_json::Error),
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Search request failed");
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}
