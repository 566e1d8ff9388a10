//! Batch commits against the single index writer

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use tantivy::{IndexWriter, Term};

use super::engine::SearchEngine;
use super::errors::{SearchError, SearchResult};
use super::types::ParsedDocument;

/// Owns the index writer and applies one batch per commit
///
/// Documents are upserted by id: a re-ingested object replaces the earlier
/// version instead of duplicating it. A batch is all-or-nothing; if adding
/// any document fails, pending changes are rolled back.
pub struct IndexBatchWriter {
    engine: SearchEngine,
    writer: Arc<Mutex<IndexWriter>>,
}

impl IndexBatchWriter {
    pub(crate) fn new(engine: SearchEngine, writer: IndexWriter) -> Self {
        Self {
            engine,
            writer: Arc::new(Mutex::new(writer)),
        }
    }

    /// Add `documents` and commit them as one unit, then reload the reader
    ///
    /// Runs on the blocking pool. Returns the commit opstamp.
    pub async fn commit_documents(&self, documents: Vec<ParsedDocument>) -> SearchResult<u64> {
        let engine = self.engine.clone();
        let writer = Arc::clone(&self.writer);

        tokio::task::spawn_blocking(move || -> SearchResult<u64> {
            let start = Instant::now();
            let schema = engine.schema();
            let mut writer = writer.lock();

            for doc in &documents {
                writer.delete_term(Term::from_field_text(schema.id, &doc.id));
                if let Err(e) = writer.add_document(schema.to_document(doc)) {
                    let _ = writer.rollback();
                    return Err(SearchError::IndexingFailed {
                        doc_id: doc.id.clone(),
                        message: e.to_string(),
                    });
                }
            }

            let opstamp = match writer.commit() {
                Ok(opstamp) => opstamp,
                Err(e) => {
                    let _ = writer.rollback();
                    return Err(SearchError::CommitFailed(e.to_string()));
                }
            };

            engine
                .reader()
                .reload()
                .map_err(|e| SearchError::CommitFailed(format!("Failed to reload reader: {e}")))?;

            tracing::debug!(
                documents = documents.len(),
                opstamp,
                duration_ms = start.elapsed().as_millis(),
                "Index commit and reload completed"
            );
            Ok(opstamp)
        })
        .await
        .map_err(|e| SearchError::TaskFailed(format!("Commit task failed: {e}")))?
    }

    /// Block until background merges finish, consuming the writer
    pub async fn finish(self) -> SearchResult<()> {
        let writer = match Arc::try_unwrap(self.writer) {
            Ok(mutex) => mutex.into_inner(),
            Err(_) => return Ok(()),
        };
        tokio::task::spawn_blocking(move || writer.wait_merging_threads())
            .await
            .map_err(|e| SearchError::TaskFailed(format!("Merge task failed: {e}")))??;
        Ok(())
    }
}
