//! Shared configuration constants for plantdb-search
//!
//! This module contains default values and configuration constants used
//! throughout the codebase to ensure consistency and avoid magic numbers.

/// Default object-store bucket holding one JSON document per plant
pub const DEFAULT_BUCKET: &str = "plantdb-json";

/// Default on-disk location of the search index
///
/// The index is opened (not rebuilt) when this directory already holds one.
pub const DEFAULT_INDEX_PATH: &str = "./search-indexes/plantdb.index";

/// Maximum concurrent fetch-and-parse operations: 100
///
/// Bounds memory held by in-flight documents and the number of outbound
/// connections against the storage backend, independent of listing speed.
pub const DEFAULT_FETCH_CONCURRENCY: usize = 100;

/// Documents per index commit: 100
///
/// Each batch is committed atomically. Larger batches mean fewer commits
/// (each one fsyncs segment metadata) but more documents held in memory.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Capacity of the handoff channels between pipeline stages
///
/// 1 is the smallest capacity tokio's bounded channel accepts, so a stage can
/// never run more than one item ahead of its consumer.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1;

/// Number of hits returned by the query endpoint
pub const DEFAULT_SEARCH_LIMIT: usize = 52;

/// Default HTTP port when `PORT` is not set
pub const DEFAULT_PORT: u16 = 8080;

/// Index writer heap budget: 128MB
///
/// Shared across tantivy's indexing threads. Batches of 100 JSON documents
/// stay far below this, the headroom lets the writer avoid early flushes.
pub const INDEX_WRITER_MEMORY_BYTES: usize = 128 * 1024 * 1024;

/// Base URL of the Google Cloud Storage JSON API
pub const GCS_API_BASE_URL: &str = "https://storage.googleapis.com";
