mod common;

use common::{RecordingSink, numbered_store};
use plantdb_search::config::IngestConfig;
use plantdb_search::pipeline::{IngestPipeline, PipelineError};
use std::sync::Arc;

fn config(batch_size: usize) -> IngestConfig {
    IngestConfig::builder()
        .fetch_concurrency(8)
        .batch_size(batch_size)
        .build()
        .expect("valid config")
}

#[tokio::test]
async fn partial_final_batch_is_committed() {
    let store = Arc::new(numbered_store(250));
    let mut sink = RecordingSink::default();

    let report = IngestPipeline::new(config(100))
        .run_with_sink(store, &mut sink)
        .await
        .expect("ingestion succeeds");

    assert_eq!(sink.commit_sizes(), vec![100, 100, 50]);
    assert_eq!(report.batches, 3);
    assert_eq!(report.committed, 250);
    assert_eq!(report.listed, 250);
    assert_eq!(report.fetched, 250);
}

#[tokio::test]
async fn exact_multiple_has_no_trailing_commit() {
    let store = Arc::new(numbered_store(300));
    let mut sink = RecordingSink::default();

    let report = IngestPipeline::new(config(100))
        .run_with_sink(store, &mut sink)
        .await
        .expect("ingestion succeeds");

    assert_eq!(sink.commit_sizes(), vec![100, 100, 100]);
    assert_eq!(report.committed, 300);
}

#[tokio::test]
async fn empty_store_commits_nothing() {
    let store = Arc::new(numbered_store(0));
    let mut sink = RecordingSink::default();

    let report = IngestPipeline::new(config(100))
        .run_with_sink(store, &mut sink)
        .await
        .expect("ingestion succeeds");

    assert!(sink.commit_sizes().is_empty());
    assert_eq!(report.committed, 0);
    assert_eq!(report.batches, 0);
}

#[tokio::test]
async fn fewer_documents_than_one_batch() {
    let store = Arc::new(numbered_store(7));
    let mut sink = RecordingSink::default();

    IngestPipeline::new(config(100))
        .run_with_sink(store, &mut sink)
        .await
        .expect("ingestion succeeds");

    assert_eq!(sink.commit_sizes(), vec![7]);
}

#[tokio::test]
async fn commit_failure_is_fatal() {
    let store = Arc::new(numbered_store(500));
    let mut sink = RecordingSink::failing_on(2);
    let pipeline = IngestPipeline::new(config(100));
    let progress = pipeline.progress();

    let err = pipeline
        .run_with_sink(store, &mut sink)
        .await
        .expect_err("second commit fails");

    match err {
        PipelineError::Commit {
            batch, documents, ..
        } => {
            assert_eq!(batch, 2);
            assert_eq!(documents, 100);
        }
        other => panic!("expected commit error, got {other:?}"),
    }
    // Only the first batch made it, and nothing after the failure
    assert_eq!(sink.commit_sizes(), vec![100]);
    assert_eq!(progress.committed(), 100);
}

#[tokio::test]
async fn committed_counter_only_grows() {
    let store = Arc::new(numbered_store(1000));
    let mut sink = RecordingSink::default();
    let pipeline = IngestPipeline::new(config(10));
    let progress = pipeline.progress();

    let watcher = tokio::spawn(async move {
        let mut last = 0;
        for _ in 0..200 {
            let now = progress.committed();
            assert!(now >= last, "committed went from {last} to {now}");
            assert_eq!(now % 10, 0, "committed advanced mid-batch");
            last = now;
            tokio::task::yield_now().await;
        }
    });

    let report = pipeline
        .run_with_sink(store, &mut sink)
        .await
        .expect("ingestion succeeds");
    watcher.await.expect("watcher saw monotonic progress");
    assert_eq!(report.committed, 1000);
}
