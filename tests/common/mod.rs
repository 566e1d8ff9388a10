//! Test utilities shared by the plantdb-search test suite

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use parking_lot::Mutex;
use plantdb_search::pipeline::{BatchSink, IndexBatch};
use plantdb_search::search::{SearchEngine, SearchError, SearchSchemaBuilder};
use plantdb_search::storage::{MemoryObjectStore, ObjectStore, StorageError, StorageResult};
use rand::Rng;
use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Plant document shaped like the records in the production bucket
#[allow(dead_code)]
pub fn plant(name: &str, life_cycle: &str, description: &str) -> Value {
    json!({
        "name": name,
        "lifeCycle": life_cycle,
        "bloomSize": "Medium",
        "SunRequirement": ["Full Sun", "Partial Shade"],
        "description": description,
    })
}

/// Memory store holding `count` small plant documents named `plants/{i}.json`
#[allow(dead_code)]
pub fn numbered_store(count: usize) -> MemoryObjectStore {
    let store = MemoryObjectStore::new();
    for i in 0..count {
        store.insert_json(
            format!("plants/{i:05}.json"),
            &plant(&format!("Plant {i}"), "Annual", "A test plant"),
        );
    }
    store
}

/// In-memory index with the default plant schema
#[allow(dead_code)]
pub fn ram_engine() -> SearchEngine {
    SearchEngine::create_in_ram(SearchSchemaBuilder::new()).expect("in-memory index")
}

/// Store wrapper that sleeps a random short time per read and records the
/// highest number of reads running at once
#[allow(dead_code)]
pub struct InstrumentedStore {
    inner: MemoryObjectStore,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    reads: AtomicUsize,
    max_jitter_ms: u64,
}

#[allow(dead_code)]
impl InstrumentedStore {
    pub fn new(inner: MemoryObjectStore, max_jitter_ms: u64) -> Self {
        Self {
            inner,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            reads: AtomicUsize::new(0),
            max_jitter_ms,
        }
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for InstrumentedStore {
    fn list(&self) -> BoxStream<'static, StorageResult<String>> {
        self.inner.list()
    }

    async fn read(&self, name: &str) -> StorageResult<Vec<u8>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.reads.fetch_add(1, Ordering::SeqCst);

        let delay = if self.max_jitter_ms == 0 {
            0
        } else {
            rand::rng().random_range(0..=self.max_jitter_ms)
        };
        tokio::time::sleep(Duration::from_millis(delay)).await;

        let result = self.inner.read(name).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn describe(&self) -> String {
        format!("instrumented({})", self.inner.describe())
    }
}

/// Store whose reads of the listed names fail, after an optional delay
#[allow(dead_code)]
pub struct FailingStore {
    inner: MemoryObjectStore,
    failing: HashSet<String>,
    delay: Duration,
}

#[allow(dead_code)]
impl FailingStore {
    pub fn new(inner: MemoryObjectStore, failing: &[&str], delay: Duration) -> Self {
        Self {
            inner,
            failing: failing.iter().map(|s| (*s).to_string()).collect(),
            delay,
        }
    }
}

#[async_trait]
impl ObjectStore for FailingStore {
    fn list(&self) -> BoxStream<'static, StorageResult<String>> {
        self.inner.list()
    }

    async fn read(&self, name: &str) -> StorageResult<Vec<u8>> {
        if self.failing.contains(name) {
            tokio::time::sleep(self.delay).await;
            return Err(StorageError::Status {
                url: format!("memory://{name}"),
                status: 503,
            });
        }
        self.inner.read(name).await
    }

    fn describe(&self) -> String {
        "failing".to_string()
    }
}

/// Store whose listing yields every stored name and then fails
#[allow(dead_code)]
pub struct BrokenListingStore {
    inner: MemoryObjectStore,
}

#[allow(dead_code)]
impl BrokenListingStore {
    pub fn new(inner: MemoryObjectStore) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ObjectStore for BrokenListingStore {
    fn list(&self) -> BoxStream<'static, StorageResult<String>> {
        let error = stream::iter(vec![Err(StorageError::Walk {
            root: "broken".into(),
            message: "listing interrupted".to_string(),
        })]);
        self.inner.list().chain(error).boxed()
    }

    async fn read(&self, name: &str) -> StorageResult<Vec<u8>> {
        self.inner.read(name).await
    }

    fn describe(&self) -> String {
        "broken-listing".to_string()
    }
}

/// Batch sink recording the size of every commit and the committed ids
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub commits: Arc<Mutex<Vec<usize>>>,
    pub ids: Arc<Mutex<Vec<String>>>,
    /// 1-based commit number that fails, if any
    pub fail_on_commit: Option<usize>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn failing_on(commit: usize) -> Self {
        Self {
            fail_on_commit: Some(commit),
            ..Self::default()
        }
    }

    pub fn commit_sizes(&self) -> Vec<usize> {
        self.commits.lock().clone()
    }

    pub fn committed_ids(&self) -> Vec<String> {
        self.ids.lock().clone()
    }
}

#[async_trait]
impl BatchSink for RecordingSink {
    async fn commit(&mut self, batch: IndexBatch) -> Result<(), SearchError> {
        let attempt = self.commits.lock().len() + 1;
        if self.fail_on_commit == Some(attempt) {
            return Err(SearchError::CommitFailed("injected failure".to_string()));
        }
        self.ids
            .lock()
            .extend(batch.documents().iter().map(|doc| doc.id.clone()));
        self.commits.lock().push(batch.len());
        Ok(())
    }
}
