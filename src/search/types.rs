//! Common types used across the search module
//!
//! This module contains shared data structures and types that are used
//! by the search engine, the ingestion pipeline and the query endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque name of one stored object, also used as the document id
pub type ObjectIdentifier = String;

/// One object after its bytes were decoded as JSON
///
/// Moved from stage to stage, never shared.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    pub id: ObjectIdentifier,
    pub content: serde_json::Value,
}

impl ParsedDocument {
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<ObjectIdentifier>, content: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            content,
        }
    }
}

/// Individual ranked search hit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    pub id: String,
    pub score: f32,
    /// Stored document content, `null` when it could not be decoded
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub fields: serde_json::Value,
}

/// Index statistics information
#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub num_documents: u64,
    pub num_segments: usize,
    pub index_size_bytes: Option<u64>,
    pub last_commit: Option<DateTime<Utc>>,
}
