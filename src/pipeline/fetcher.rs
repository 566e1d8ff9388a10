//! Second stage: bounded-concurrency fetch and decode
//!
//! A permit is taken from the semaphore before each task is spawned and moved
//! into it, so at most `concurrency` objects are being read, decoded or handed
//! off at any moment. Tasks finish in any order.

use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::{JoinError, JoinSet};

use super::CancellationHandle;
use super::errors::{FirstFailure, PipelineError, PipelineResult};
use super::progress::IngestProgress;
use crate::search::{ObjectIdentifier, ParsedDocument};
use crate::storage::ObjectStore;

type FetchTasks = JoinSet<PipelineResult<()>>;

/// Fetch every received name, returning how many tasks were admitted
///
/// The output closes only after all admitted tasks have finished, so the
/// indexer never sees end-of-stream while a document is still in flight.
pub(crate) async fn run_fetcher(
    store: Arc<dyn ObjectStore>,
    mut ids: mpsc::Receiver<ObjectIdentifier>,
    tx: mpsc::Sender<ParsedDocument>,
    concurrency: usize,
    cancel: CancellationHandle,
    progress: Arc<IngestProgress>,
) -> PipelineResult<u64> {
    let guard = cancel.drop_guard();
    let result = fetch_all(&store, &mut ids, &tx, concurrency, &cancel, &progress).await;
    if result.is_ok() {
        guard.disarm();
    }
    result
}

async fn fetch_all(
    store: &Arc<dyn ObjectStore>,
    ids: &mut mpsc::Receiver<ObjectIdentifier>,
    tx: &mpsc::Sender<ParsedDocument>,
    concurrency: usize,
    cancel: &CancellationHandle,
    progress: &Arc<IngestProgress>,
) -> PipelineResult<u64> {
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let mut tasks = FetchTasks::new();
    let mut admitted = 0u64;

    loop {
        let id = tokio::select! {
            biased;
            () = cancel.cancelled() => return stop(&mut tasks).await,
            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                if let Err(e) = flatten(joined) {
                    cancel.cancel();
                    let mut failure = FirstFailure::default();
                    failure.record(e);
                    failure.record_result(drain(&mut tasks).await);
                    failure.into_result()?;
                }
                continue;
            }
            id = ids.recv() => match id {
                Some(id) => id,
                None => break,
            },
        };

        let permit = tokio::select! {
            biased;
            () = cancel.cancelled() => return stop(&mut tasks).await,
            permit = Arc::clone(&semaphore).acquire_owned() => {
                permit.map_err(|_| PipelineError::Cancelled)?
            }
        };

        let store = Arc::clone(store);
        let tx = tx.clone();
        let cancel = cancel.clone();
        let progress = Arc::clone(progress);
        tasks.spawn(async move {
            // Released on every exit path, including panics
            let _permit = permit;

            let document = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(PipelineError::Cancelled),
                fetched = fetch_one(store.as_ref(), id) => fetched,
            };
            let document = match document {
                Ok(document) => document,
                Err(e) => {
                    tracing::error!(
                        object_id = e.object_id().unwrap_or_default(),
                        error = %e,
                        "Fetch failed, cancelling ingestion"
                    );
                    cancel.cancel();
                    return Err(e);
                }
            };
            progress.record_fetched();

            tokio::select! {
                biased;
                () = cancel.cancelled() => Err(PipelineError::Cancelled),
                sent = tx.send(document) => sent.map_err(|_| PipelineError::Cancelled),
            }
        });
        admitted += 1;
    }

    // Input exhausted: wait for every admitted task before closing the output
    drain(&mut tasks).await?;
    tracing::info!(fetched = admitted, "All fetch tasks complete");
    Ok(admitted)
}

/// Read and decode one object
async fn fetch_one(
    store: &dyn ObjectStore,
    id: ObjectIdentifier,
) -> PipelineResult<ParsedDocument> {
    let bytes = store.read(&id).await.map_err(|source| PipelineError::Fetch {
        id: id.clone(),
        source,
    })?;
    let content = serde_json::from_slice(&bytes).map_err(|source| PipelineError::Decode {
        id: id.clone(),
        source,
    })?;
    Ok(ParsedDocument::new(id, content))
}

/// Cancelled while tasks may still be running: report the cause if a task saw it
async fn stop(tasks: &mut FetchTasks) -> PipelineResult<u64> {
    drain(tasks).await?;
    Err(PipelineError::Cancelled)
}

/// Join every outstanding task, keeping the first real failure
async fn drain(tasks: &mut FetchTasks) -> PipelineResult<()> {
    let mut failure = FirstFailure::default();
    while let Some(joined) = tasks.join_next().await {
        failure.record_result(flatten(joined));
    }
    failure.into_result()
}

fn flatten(joined: Result<PipelineResult<()>, JoinError>) -> PipelineResult<()> {
    joined.map_err(|e| PipelineError::TaskFailed(format!("Fetch task failed: {e}")))?
}
