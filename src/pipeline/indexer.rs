//! Third stage: accumulate documents and commit them in fixed-size batches

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::CancellationHandle;
use super::batch::IndexBatch;
use super::errors::{PipelineError, PipelineResult};
use super::progress::IngestProgress;
use crate::search::{IndexBatchWriter, ParsedDocument, SearchError};

/// Destination of committed batches
///
/// A successful `commit` means every document of the batch is durable and
/// searchable. A failed commit must leave none of them visible.
#[async_trait]
pub trait BatchSink: Send {
    async fn commit(&mut self, batch: IndexBatch) -> Result<(), SearchError>;
}

#[async_trait]
impl BatchSink for IndexBatchWriter {
    async fn commit(&mut self, batch: IndexBatch) -> Result<(), SearchError> {
        self.commit_documents(batch.into_documents()).await.map(|_| ())
    }
}

/// Consume documents until the fetcher closes its output
///
/// Returns the number of committed documents. Commits are awaited one at a
/// time, so no further documents are received while a commit is running. If
/// the run was cancelled, the partial final batch is dropped uncommitted.
pub(crate) async fn run_indexer<S>(
    mut documents: mpsc::Receiver<ParsedDocument>,
    sink: &mut S,
    batch_size: usize,
    cancel: &CancellationHandle,
    progress: &IngestProgress,
) -> PipelineResult<u64>
where
    S: BatchSink + ?Sized,
{
    let guard = cancel.drop_guard();
    let result = index_all(&mut documents, sink, batch_size, cancel, progress).await;
    if result.is_ok() {
        guard.disarm();
    }
    result
}

async fn index_all<S>(
    documents: &mut mpsc::Receiver<ParsedDocument>,
    sink: &mut S,
    batch_size: usize,
    cancel: &CancellationHandle,
    progress: &IngestProgress,
) -> PipelineResult<u64>
where
    S: BatchSink + ?Sized,
{
    let mut batch = IndexBatch::new(batch_size);
    let mut batch_number = 0u64;

    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(PipelineError::Cancelled),
            next = documents.recv() => next,
        };
        let Some(document) = next else {
            break;
        };

        batch.push(document);
        progress.record_appended();

        if batch.is_full() {
            batch_number += 1;
            commit_batch(sink, batch.take(), batch_number, cancel, progress).await?;
        }
    }

    // The fetcher closes its output early only after cancelling
    if cancel.is_cancelled() {
        tracing::warn!(
            pending = batch.len(),
            "Ingestion cancelled, final batch not committed"
        );
        return Err(PipelineError::Cancelled);
    }

    if !batch.is_empty() {
        batch_number += 1;
        commit_batch(sink, batch.take(), batch_number, cancel, progress).await?;
    }

    Ok(progress.committed())
}

/// Commit one batch unless the run was cancelled in the meantime
async fn commit_batch<S>(
    sink: &mut S,
    batch: IndexBatch,
    batch_number: u64,
    cancel: &CancellationHandle,
    progress: &IngestProgress,
) -> PipelineResult<()>
where
    S: BatchSink + ?Sized,
{
    // Another stage may have failed after the last document was received
    if cancel.is_cancelled() {
        tracing::warn!(
            batch = batch_number,
            pending = batch.len(),
            "Ingestion cancelled, batch not committed"
        );
        return Err(PipelineError::Cancelled);
    }

    let documents = batch.len();
    match sink.commit(batch).await {
        Ok(()) => {
            progress.record_commit(documents);
            tracing::debug!(batch = batch_number, documents, "Batch committed");
            Ok(())
        }
        Err(source) => {
            tracing::error!(
                batch = batch_number,
                documents,
                error = %source,
                "Batch commit failed, cancelling ingestion"
            );
            Err(PipelineError::Commit {
                batch: batch_number,
                documents,
                source,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Default)]
    struct CountingSink {
        commits: usize,
    }

    #[async_trait]
    impl BatchSink for CountingSink {
        async fn commit(&mut self, _batch: IndexBatch) -> Result<(), SearchError> {
            self.commits += 1;
            Ok(())
        }
    }

    fn full_batch() -> IndexBatch {
        let mut batch = IndexBatch::new(2);
        batch.push(ParsedDocument::new("plants/a.json", json!({ "name": "Aster" })));
        batch.push(ParsedDocument::new("plants/b.json", json!({ "name": "Begonia" })));
        batch
    }

    #[tokio::test]
    async fn batch_commits_while_running() {
        let cancel = CancellationHandle::new();
        let progress = IngestProgress::hidden();
        let mut sink = CountingSink::default();

        commit_batch(&mut sink, full_batch(), 1, &cancel, &progress)
            .await
            .expect("commit");

        assert_eq!(sink.commits, 1);
        assert_eq!(progress.committed(), 2);
    }

    #[tokio::test]
    async fn no_commit_starts_after_cancellation() {
        let cancel = CancellationHandle::new();
        let progress = IngestProgress::hidden();
        let mut sink = CountingSink::default();

        cancel.cancel();
        let result = commit_batch(&mut sink, full_batch(), 3, &cancel, &progress).await;

        assert!(matches!(result, Err(PipelineError::Cancelled)));
        assert_eq!(sink.commits, 0);
        assert_eq!(progress.committed(), 0);
    }
}
