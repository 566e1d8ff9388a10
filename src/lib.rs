pub mod config;
pub mod pipeline;
pub mod search;
pub mod server;
pub mod storage;
pub mod utils;

pub use config::{IngestConfig, ServerConfig};
pub use pipeline::{
    BatchSink, CancellationHandle, IngestPipeline, IngestReport, PipelineError,
};
pub use search::{ParsedDocument, SearchEngine, SearchHit};
pub use storage::{GcsObjectStore, LocalObjectStore, MemoryObjectStore, ObjectStore};
