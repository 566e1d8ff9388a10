//! Search query execution logic

use tantivy::TantivyDocument;
use tantivy::collector::{Count, TopDocs};

use super::query_builders::build_match_query;
use super::results::{SearchResults, convert_to_search_hit};
use crate::search::engine::SearchEngine;
use crate::search::errors::{SearchError, SearchResult};

/// Execute a match query against the committed index
///
/// Searching is synchronous in tantivy, so the work runs on the blocking pool.
pub(crate) async fn execute_search_query(
    engine: &SearchEngine,
    query_str: &str,
    limit: usize,
) -> SearchResult<SearchResults> {
    let query_str = query_str.trim().to_string();
    if query_str.is_empty() {
        return Err(SearchError::EmptyQuery);
    }

    let engine = engine.clone();
    tokio::task::spawn_blocking(move || execute_search_sync(&engine, query_str, limit))
        .await
        .map_err(|e| SearchError::TaskFailed(format!("Search task failed: {e}")))?
}

fn execute_search_sync(
    engine: &SearchEngine,
    query_str: String,
    limit: usize,
) -> SearchResult<SearchResults> {
    let Some(query) = build_match_query(engine, &query_str) else {
        tracing::debug!(query = %query_str, "Query analysed to no terms");
        return Ok(SearchResults::empty(query_str, limit));
    };

    let searcher = engine.reader().searcher();
    let (top_docs, total_count) = searcher
        .search(&*query, &(TopDocs::with_limit(limit.max(1)), Count))
        .map_err(|e| SearchError::SearchExecution(format!("Failed to execute search query: {e}")))?;

    let mut hits = Vec::with_capacity(top_docs.len().min(limit));
    for (score, doc_address) in top_docs.into_iter().take(limit) {
        let doc: TantivyDocument = searcher.doc(doc_address).map_err(|e| {
            SearchError::SearchExecution(format!("Failed to retrieve document: {e}"))
        })?;
        hits.push(convert_to_search_hit(&doc, engine.schema(), score)?);
    }

    Ok(SearchResults {
        hits,
        total_count,
        query: query_str,
        limit,
    })
}
