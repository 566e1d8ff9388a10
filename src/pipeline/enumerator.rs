//! First stage: stream object names out of the store

use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::CancellationHandle;
use super::errors::{PipelineError, PipelineResult};
use super::progress::IngestProgress;
use crate::search::ObjectIdentifier;
use crate::storage::ObjectStore;

/// Forward every listed name to the fetcher, returning how many were listed
///
/// Any listing error cancels the run. The sender is dropped on return, which
/// is how the fetcher learns the listing is exhausted.
pub(crate) async fn run_enumerator(
    store: Arc<dyn ObjectStore>,
    tx: mpsc::Sender<ObjectIdentifier>,
    cancel: CancellationHandle,
    progress: Arc<IngestProgress>,
) -> PipelineResult<u64> {
    // Dropped before `tx`, so a failure or panic is visible downstream as
    // cancellation before the channel closes
    let guard = cancel.drop_guard();
    let result = enumerate(store.as_ref(), &tx, &cancel, &progress).await;
    if result.is_ok() {
        guard.disarm();
    }
    result
}

async fn enumerate(
    store: &dyn ObjectStore,
    tx: &mpsc::Sender<ObjectIdentifier>,
    cancel: &CancellationHandle,
    progress: &IngestProgress,
) -> PipelineResult<u64> {
    let mut names = store.list();
    let mut listed = 0u64;

    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(PipelineError::Cancelled),
            next = names.next() => next,
        };
        let Some(name) = next else {
            break;
        };

        let name = name.map_err(|source| {
            tracing::error!(store = %store.describe(), error = %source, "Object listing failed");
            PipelineError::Enumeration {
                store: store.describe(),
                source,
            }
        })?;

        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(PipelineError::Cancelled),
            sent = tx.send(name) => sent.map_err(|_| PipelineError::Cancelled)?,
        }
        progress.record_listed();
        listed += 1;
    }

    tracing::info!(store = %store.describe(), listed, "Object listing complete");
    Ok(listed)
}
