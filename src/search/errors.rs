//! Error types for search operations
//!
//! This module defines tantivy-specific error types with enough context
//! (document id, index path) to diagnose a failed run and re-run it.

use std::path::PathBuf;
use tantivy::TantivyError;
use thiserror::Error;

use super::schema::SchemaError;

/// Result type alias for search operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Error types for search operations
#[derive(Debug, Error)]
pub enum SearchError {
    /// Index initialization failed
    #[error("Failed to initialize search index at {path:?}: {message}")]
    IndexInitialization { path: PathBuf, message: String },

    /// Existing index was built with an incompatible schema
    #[error("Existing index at {path:?} is incompatible: {source}")]
    SchemaMismatch {
        path: PathBuf,
        #[source]
        source: SchemaError,
    },

    /// Schema construction or tokenizer registration failed
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Query text was empty after trimming
    #[error("Search query is empty")]
    EmptyQuery,

    /// Search execution failed
    #[error("Search execution failed: {0}")]
    SearchExecution(String),

    /// Converting a document for the index failed
    #[error("Indexing failed for document {doc_id}: {message}")]
    IndexingFailed { doc_id: String, message: String },

    /// Index writer acquisition failed
    #[error("Failed to acquire index writer: {0}")]
    WriterAcquisition(String),

    /// Index commit failed
    #[error("Failed to commit index changes: {0}")]
    CommitFailed(String),

    /// Blocking task running an index operation panicked or was cancelled
    #[error("Index task failed: {0}")]
    TaskFailed(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Tantivy error wrapper
    #[error("Tantivy error: {0}")]
    Tantivy(#[from] TantivyError),
}

/// Helper macro for logging search operations with performance metrics
#[macro_export]
macro_rules! log_search_operation {
    ($op:expr, $query:expr) => {{
        let start = std::time::Instant::now();
        let result = $op;
        let duration = start.elapsed();

        match &result {
            Ok(hits) => {
                tracing::info!(
                    query = %$query,
                    hits = hits.len(),
                    duration_ms = duration.as_millis(),
                    "Search completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    query = %$query,
                    duration_ms = duration.as_millis(),
                    error = %e,
                    "Search operation failed"
                );
            }
        }

        result
    }};
}
