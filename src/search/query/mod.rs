//! Search query execution and result processing
//!
//! Free-text queries are match queries: the text is analysed per field and
//! the resulting terms are OR-combined, best hits first.

use crate::search::engine::SearchEngine;

mod builder;
mod execution;
mod query_builders;
mod results;

pub use builder::SearchQueryBuilder;
pub use results::SearchResults;

use crate::log_search_operation;
use crate::search::errors::SearchResult;
use crate::search::types::SearchHit;

/// Run a match query and return at most `limit` hits, with logging
pub async fn search(
    engine: &SearchEngine,
    query: &str,
    limit: usize,
) -> SearchResult<Vec<SearchHit>> {
    log_search_operation!(
        SearchQueryBuilder::new(query).limit(limit).execute(engine).await,
        query.trim()
    )
}
