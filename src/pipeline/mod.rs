//! Bounded-concurrency ingestion from an object store into the search index
//!
//! Three stages connected by bounded channels:
//!
//! ```text
//! enumerator --names--> fetcher (<= K in flight) --documents--> indexer (batches of B)
//! ```
//!
//! The enumerator and fetcher run as spawned tasks; the indexer runs on the
//! caller's task so it can borrow the batch sink. The first stage to fail
//! cancels the shared [`CancellationHandle`]; the others stop and the run
//! returns that first failure.

pub mod batch;
pub mod enumerator;
pub mod errors;
pub mod fetcher;
pub mod indexer;
pub mod progress;

pub use batch::IndexBatch;
pub use errors::{PipelineError, PipelineResult};
pub use indexer::BatchSink;
pub use progress::{IngestProgress, ProgressSnapshot};

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::config::IngestConfig;
use crate::search::SearchEngine;
use crate::storage::ObjectStore;
use errors::FirstFailure;

/// Handle for cancelling an ingestion run
///
/// Clones share one token. Cancelling is idempotent.
#[derive(Debug, Clone, Default)]
pub struct CancellationHandle {
    token: CancellationToken,
}

impl CancellationHandle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the associated ingestion run
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Check if the run has been cancelled
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the run is cancelled
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    /// Guard that cancels the run when dropped unless disarmed
    pub(crate) fn drop_guard(&self) -> DropGuard {
        self.token.clone().drop_guard()
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub listed: u64,
    pub fetched: u64,
    pub committed: u64,
    pub batches: u64,
    pub elapsed: Duration,
}

/// One ingestion run
///
/// Consumed by `run`; create a new pipeline for another run.
pub struct IngestPipeline {
    config: IngestConfig,
    cancel: CancellationHandle,
    progress: Arc<IngestProgress>,
}

impl IngestPipeline {
    #[must_use]
    pub fn new(config: IngestConfig) -> Self {
        let progress = if config.show_progress() {
            IngestProgress::visible(config.expected_documents())
        } else {
            IngestProgress::hidden()
        };
        Self {
            config,
            cancel: CancellationHandle::new(),
            progress: Arc::new(progress),
        }
    }

    /// Handle that stops the run from outside, e.g. on Ctrl-C
    #[must_use]
    pub fn cancellation_handle(&self) -> CancellationHandle {
        self.cancel.clone()
    }

    /// Live counters, readable while the run is in progress
    #[must_use]
    pub fn progress(&self) -> Arc<IngestProgress> {
        Arc::clone(&self.progress)
    }

    /// Ingest every object of `store` into `engine`
    ///
    /// Acquires the index writer for the duration of the run.
    pub async fn run(
        self,
        store: Arc<dyn ObjectStore>,
        engine: &SearchEngine,
    ) -> PipelineResult<IngestReport> {
        let mut writer = engine
            .batch_writer(self.config.writer_memory_bytes())
            .map_err(PipelineError::IndexSetup)?;

        let result = self.run_with_sink(store, &mut writer).await;

        if let Err(e) = writer.finish().await {
            tracing::warn!(error = %e, "Waiting for index merges failed");
        }
        result
    }

    /// Ingest every object of `store` into an arbitrary batch sink
    pub async fn run_with_sink<S>(
        self,
        store: Arc<dyn ObjectStore>,
        sink: &mut S,
    ) -> PipelineResult<IngestReport>
    where
        S: BatchSink + ?Sized,
    {
        let capacity = self.config.channel_capacity();
        let (id_tx, id_rx) = mpsc::channel(capacity);
        let (doc_tx, doc_rx) = mpsc::channel(capacity);

        tracing::info!(
            store = %store.describe(),
            fetch_concurrency = self.config.fetch_concurrency(),
            batch_size = self.config.batch_size(),
            "Starting ingestion"
        );

        let enumerator = tokio::spawn(enumerator::run_enumerator(
            Arc::clone(&store),
            id_tx,
            self.cancel.clone(),
            Arc::clone(&self.progress),
        ));
        let fetcher = tokio::spawn(fetcher::run_fetcher(
            store,
            id_rx,
            doc_tx,
            self.config.fetch_concurrency(),
            self.cancel.clone(),
            Arc::clone(&self.progress),
        ));

        let indexed = indexer::run_indexer(
            doc_rx,
            sink,
            self.config.batch_size(),
            &self.cancel,
            &self.progress,
        )
        .await;

        let mut failure = FirstFailure::default();
        for (stage, handle) in [("enumerator", enumerator), ("fetcher", fetcher)] {
            match handle.await {
                Ok(result) => {
                    failure.record_result(result);
                }
                Err(e) => {
                    self.cancel.cancel();
                    failure.record(PipelineError::TaskFailed(format!(
                        "{stage} stage failed: {e}"
                    )));
                }
            }
        }
        failure.record_result(indexed);

        if let Err(e) = failure.into_result() {
            self.progress.abandon("failed");
            if e.is_cancelled() {
                tracing::warn!("Ingestion cancelled");
            } else {
                tracing::error!(
                    error = %e,
                    object_id = e.object_id().unwrap_or_default(),
                    "Ingestion failed"
                );
            }
            return Err(e);
        }

        let snapshot = self.progress.snapshot();
        let report = IngestReport {
            listed: snapshot.listed,
            fetched: snapshot.fetched,
            committed: snapshot.committed,
            batches: snapshot.batches,
            elapsed: self.progress.elapsed(),
        };
        self.progress.finish("done");
        tracing::info!(
            listed = report.listed,
            committed = report.committed,
            batches = report.batches,
            elapsed_ms = report.elapsed.as_millis(),
            "Ingestion complete"
        );
        Ok(report)
    }
}
