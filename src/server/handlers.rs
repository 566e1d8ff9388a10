use axum::body::Bytes;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::atomic::Ordering;

use super::AppState;
use super::errors::QueryError;
use crate::search;

/// `POST /search`: the raw body is the query text
pub async fn handle_search(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<impl IntoResponse, QueryError> {
    let body = body.map_err(|e| QueryError::ReadBody(e.body_text()))?;
    let query = std::str::from_utf8(&body)
        .map_err(|e| QueryError::ReadBody(format!("body is not UTF-8: {e}")))?
        .trim();
    if query.is_empty() {
        return Err(QueryError::EmptyRequest);
    }

    state.queries.fetch_add(1, Ordering::Relaxed);
    let hits = search::search(&state.engine, query, state.search_limit).await?;
    let encoded = serde_json::to_vec(&hits)?;

    Ok(([(header::CONTENT_TYPE, "application/json")], encoded))
}

/// `GET /health`: index statistics and the number of queries executed
pub async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.engine.get_stats().await;
    Json(json!({
        "status": "ok",
        "documents": stats.num_documents,
        "segments": stats.num_segments,
        "index_size_bytes": stats.index_size_bytes,
        "last_commit": stats.last_commit,
        "queries": state.queries.load(Ordering::Relaxed),
    }))
}
