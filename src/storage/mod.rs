//! Object storage abstraction
//!
//! The ingestion pipeline only needs two things from storage: a lazy listing
//! of object names and a way to read one object's bytes. Backends:
//!
//! - [`GcsObjectStore`]: Google Cloud Storage JSON API over HTTP
//! - [`LocalObjectStore`]: a directory tree treated as a bucket
//! - [`MemoryObjectStore`]: in-process map, for tests and embedding

pub mod errors;
pub mod gcs;
pub mod local;
pub mod memory;

pub use errors::{StorageError, StorageResult};
pub use gcs::GcsObjectStore;
pub use local::LocalObjectStore;
pub use memory::MemoryObjectStore;

use async_trait::async_trait;
use futures::stream::BoxStream;

/// Read-only view of a collection of named blobs
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Stream every object name in the collection
    ///
    /// The stream is lazy: names are produced while the backend is still
    /// listing. An `Err` item means the listing cannot be trusted past that
    /// point.
    fn list(&self) -> BoxStream<'static, StorageResult<String>>;

    /// Read the full contents of one object
    async fn read(&self, name: &str) -> StorageResult<Vec<u8>>;

    /// Human-readable location for log lines
    fn describe(&self) -> String;
}
