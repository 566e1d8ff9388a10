//! Search results container and document conversion

use tantivy::{TantivyDocument, schema::Value};

use crate::search::errors::{SearchError, SearchResult};
use crate::search::schema::SearchSchema;
use crate::search::types::SearchHit;

/// Search results container
#[derive(Debug, Clone)]
pub struct SearchResults {
    pub hits: Vec<SearchHit>,
    /// Number of matching documents, not limited by `limit`
    pub total_count: usize,
    pub query: String,
    pub limit: usize,
}

impl SearchResults {
    /// Results for a query whose analysis produced no terms
    #[must_use]
    pub(crate) fn empty(query: String, limit: usize) -> Self {
        Self {
            hits: Vec::new(),
            total_count: 0,
            query,
            limit,
        }
    }

    /// Check if more documents matched than were returned
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.hits.len() < self.total_count
    }
}

/// Convert a stored Tantivy document to a `SearchHit`
///
/// The stored JSON is returned as-is; if it no longer parses the hit is still
/// returned with `null` fields.
pub(crate) fn convert_to_search_hit(
    doc: &TantivyDocument,
    schema: &SearchSchema,
    score: f32,
) -> SearchResult<SearchHit> {
    let id = doc
        .get_first(schema.id)
        .and_then(|v| v.as_str())
        .ok_or_else(|| SearchError::SearchExecution("stored document has no id".to_string()))?
        .to_string();

    let fields = doc
        .get_first(schema.source)
        .and_then(|v| v.as_str())
        .and_then(|raw| match serde_json::from_str(raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "Stored document source is not valid JSON");
                None
            }
        })
        .unwrap_or(serde_json::Value::Null);

    Ok(SearchHit { id, score, fields })
}
