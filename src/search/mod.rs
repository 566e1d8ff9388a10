//! Full-text search over plant documents using Tantivy
//!
//! One `SearchEngine` owns the index. The ingestion pipeline writes through an
//! `IndexBatchWriter`; the query endpoint reads through `search`.

pub mod engine;
pub mod errors;
pub mod query;
pub mod schema;
pub mod types;
pub mod writer;

pub use engine::SearchEngine;
pub use errors::{SearchError, SearchResult};
pub use query::{SearchQueryBuilder, SearchResults, search};
pub use schema::{SchemaError, SearchSchema, SearchSchemaBuilder};
pub use types::{IndexStats, ObjectIdentifier, ParsedDocument, SearchHit};
pub use writer::IndexBatchWriter;
