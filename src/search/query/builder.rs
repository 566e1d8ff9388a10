//! Query builder for constructing search queries with a fluent interface

use super::execution::execute_search_query;
use super::results::SearchResults;
use crate::search::engine::SearchEngine;
use crate::search::errors::SearchResult;
use crate::search::types::SearchHit;
use crate::utils::DEFAULT_SEARCH_LIMIT;

/// Search query builder with fluent interface
pub struct SearchQueryBuilder {
    query: String,
    limit: usize,
}

impl SearchQueryBuilder {
    /// Create a new search query builder
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    /// Set the maximum number of results to return
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Execute the search query and return ranked hits
    pub async fn execute(self, engine: &SearchEngine) -> SearchResult<Vec<SearchHit>> {
        Ok(self.execute_with_metadata(engine).await?.hits)
    }

    /// Execute the search query and return hits with the total match count
    pub async fn execute_with_metadata(self, engine: &SearchEngine) -> SearchResult<SearchResults> {
        execute_search_query(engine, &self.query, self.limit).await
    }
}
