mod common;

use common::{InstrumentedStore, RecordingSink, numbered_store};
use plantdb_search::config::IngestConfig;
use plantdb_search::pipeline::IngestPipeline;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

async fn ingest_with_limits(
    documents: usize,
    concurrency: usize,
    batch_size: usize,
    jitter_ms: u64,
) -> (Arc<InstrumentedStore>, RecordingSink, u64) {
    let store = Arc::new(InstrumentedStore::new(numbered_store(documents), jitter_ms));
    let mut sink = RecordingSink::default();
    let config = IngestConfig::builder()
        .fetch_concurrency(concurrency)
        .batch_size(batch_size)
        .build()
        .expect("valid config");

    let report = IngestPipeline::new(config)
        .run_with_sink(store.clone(), &mut sink)
        .await
        .expect("ingestion succeeds");
    (store, sink, report.committed)
}

#[tokio::test]
async fn every_listed_object_reaches_the_indexer_once() {
    let (store, sink, committed) = ingest_with_limits(250, 16, 100, 3).await;

    let ids = sink.committed_ids();
    let unique: HashSet<_> = ids.iter().cloned().collect();
    assert_eq!(ids.len(), 250);
    assert_eq!(unique.len(), 250);
    assert_eq!(committed, 250);
    assert_eq!(store.reads(), 250);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn in_flight_reads_never_exceed_the_limit() {
    let (store, _sink, _) = ingest_with_limits(300, 7, 10, 5).await;

    assert!(store.max_in_flight() <= 7, "saw {}", store.max_in_flight());
    // With jittered reads the cap should actually be reached
    assert!(store.max_in_flight() > 1);
}

#[tokio::test]
async fn concurrency_of_one_still_completes() {
    let (store, sink, committed) = ingest_with_limits(20, 1, 3, 1).await;

    assert_eq!(store.max_in_flight(), 1);
    assert_eq!(committed, 20);
    assert_eq!(sink.commit_sizes(), vec![3, 3, 3, 3, 3, 3, 2]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn emits_exactly_one_document_per_identifier(
        documents in 0usize..120,
        concurrency in 1usize..12,
        batch_size in 1usize..40,
    ) {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .expect("runtime");
        let (store, sink, committed) =
            runtime.block_on(ingest_with_limits(documents, concurrency, batch_size, 2));

        let ids = sink.committed_ids();
        let unique: HashSet<_> = ids.iter().cloned().collect();
        prop_assert_eq!(ids.len(), documents);
        prop_assert_eq!(unique.len(), documents);
        prop_assert_eq!(committed, documents as u64);
        prop_assert!(store.max_in_flight() <= concurrency);
    }
}
