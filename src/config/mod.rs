//! Configuration module for ingestion and serving
//!
//! This module provides `IngestConfig` with its validating builder and
//! `ServerConfig` for the query endpoint.

// Sub-modules
pub mod builder;
pub mod getters;
pub mod types;

// Re-exports for public API
pub use builder::{ConfigError, IngestConfigBuilder};
pub use types::{IngestConfig, ServerConfig};
