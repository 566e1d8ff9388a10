//! Error types for the ingestion pipeline

use thiserror::Error;

use crate::search::{ObjectIdentifier, SearchError};
use crate::storage::StorageError;

/// Result type alias for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Fatal failure of an ingestion run
///
/// Every variant except `Cancelled` ends the run for all stages. `Cancelled`
/// is what the remaining stages report after another stage failed first.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Listing the store failed
    #[error("Failed to enumerate objects in {store}: {source}")]
    Enumeration {
        store: String,
        #[source]
        source: StorageError,
    },

    /// Reading one object failed
    #[error("Failed to fetch object {id}: {source}")]
    Fetch {
        id: ObjectIdentifier,
        #[source]
        source: StorageError,
    },

    /// One object was not valid JSON
    #[error("Failed to decode object {id} as JSON: {source}")]
    Decode {
        id: ObjectIdentifier,
        #[source]
        source: serde_json::Error,
    },

    /// Committing a batch to the index failed
    #[error("Failed to commit batch {batch} ({documents} documents): {source}")]
    Commit {
        batch: u64,
        documents: usize,
        #[source]
        source: SearchError,
    },

    /// The index could not be prepared for writing
    #[error("Failed to prepare index for ingestion: {0}")]
    IndexSetup(#[source] SearchError),

    /// The run was cancelled, by the caller or by another stage failing
    #[error("Ingestion cancelled")]
    Cancelled,

    /// A stage or fetch task panicked
    #[error("Pipeline task failed: {0}")]
    TaskFailed(String),
}

impl PipelineError {
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipelineError::Cancelled)
    }

    /// Identifier of the object the failure concerns, if any
    #[must_use]
    pub fn object_id(&self) -> Option<&str> {
        match self {
            PipelineError::Fetch { id, .. } | PipelineError::Decode { id, .. } => Some(id),
            _ => None,
        }
    }
}

/// Keeps the first failure that is not a cancellation
///
/// A stage that fails cancels the others, which then report `Cancelled`;
/// the real cause must win over those echoes.
#[derive(Debug, Default)]
pub(crate) struct FirstFailure(Option<PipelineError>);

impl FirstFailure {
    pub(crate) fn record(&mut self, error: PipelineError) {
        match &self.0 {
            None => self.0 = Some(error),
            Some(previous) if previous.is_cancelled() && !error.is_cancelled() => {
                self.0 = Some(error);
            }
            Some(_) => {}
        }
    }

    pub(crate) fn record_result<T>(&mut self, result: PipelineResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.record(error);
                None
            }
        }
    }

    pub(crate) fn into_result(self) -> PipelineResult<()> {
        self.0.map_or(Ok(()), Err)
    }
}
