//! In-process object store

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::errors::{StorageError, StorageResult};
use super::ObjectStore;

/// Object store holding everything in a shared sorted map
///
/// Clones share the same contents. Listing takes a snapshot of the names, so
/// objects inserted afterwards are not seen by a listing already in progress.
#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStore {
    objects: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryObjectStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.objects.write().insert(name.into(), bytes.into());
    }

    /// Store `value` serialised as JSON
    pub fn insert_json(&self, name: impl Into<String>, value: &serde_json::Value) {
        self.insert(name, value.to_string());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn list(&self) -> BoxStream<'static, StorageResult<String>> {
        let names: Vec<String> = self.objects.read().keys().cloned().collect();
        stream::iter(names.into_iter().map(Ok)).boxed()
    }

    async fn read(&self, name: &str) -> StorageResult<Vec<u8>> {
        self.objects
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(name.to_string()))
    }

    fn describe(&self) -> String {
        format!("memory ({} objects)", self.len())
    }
}
