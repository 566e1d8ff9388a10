//! Builder for `IngestConfig`
//!
//! Every field has a default from `utils::constants`; `build` validates the
//! values that would otherwise stall or deadlock the pipeline.

use thiserror::Error;

use super::types::IngestConfig;
use crate::utils::{
    DEFAULT_BATCH_SIZE, DEFAULT_CHANNEL_CAPACITY, DEFAULT_FETCH_CONCURRENCY,
    INDEX_WRITER_MEMORY_BYTES,
};

/// Smallest heap budget tantivy accepts for a writer
const MIN_WRITER_MEMORY_BYTES: usize = 15_000_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("writer memory budget of {0} bytes is below the 15MB minimum")]
    WriterMemoryTooSmall(usize),
}

pub struct IngestConfigBuilder {
    pub(crate) fetch_concurrency: usize,
    pub(crate) batch_size: usize,
    pub(crate) channel_capacity: usize,
    pub(crate) writer_memory_bytes: usize,
    pub(crate) expected_documents: Option<u64>,
    pub(crate) show_progress: bool,
}

impl Default for IngestConfigBuilder {
    fn default() -> Self {
        Self {
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
            batch_size: DEFAULT_BATCH_SIZE,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            writer_memory_bytes: INDEX_WRITER_MEMORY_BYTES,
            expected_documents: None,
            show_progress: false,
        }
    }
}

impl IngestConfig {
    /// Create a new builder
    #[must_use]
    pub fn builder() -> IngestConfigBuilder {
        IngestConfigBuilder::default()
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        let builder = IngestConfigBuilder::default();
        Self {
            fetch_concurrency: builder.fetch_concurrency,
            batch_size: builder.batch_size,
            channel_capacity: builder.channel_capacity,
            writer_memory_bytes: builder.writer_memory_bytes,
            expected_documents: builder.expected_documents,
            show_progress: builder.show_progress,
        }
    }
}

impl IngestConfigBuilder {
    /// Maximum number of objects fetched and parsed at once
    #[must_use]
    pub fn fetch_concurrency(mut self, limit: usize) -> Self {
        self.fetch_concurrency = limit;
        self
    }

    /// Number of documents committed together
    #[must_use]
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Capacity of each inter-stage channel
    ///
    /// The default of 1 keeps every stage in lockstep with its consumer.
    #[must_use]
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    #[must_use]
    pub fn writer_memory_bytes(mut self, bytes: usize) -> Self {
        self.writer_memory_bytes = bytes;
        self
    }

    /// Length of the progress bar; the run does not depend on it
    #[must_use]
    pub fn expected_documents(mut self, count: Option<u64>) -> Self {
        self.expected_documents = count;
        self
    }

    #[must_use]
    pub fn show_progress(mut self, enabled: bool) -> Self {
        self.show_progress = enabled;
        self
    }

    /// Validate and build the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the concurrency, batch size or channel capacity is
    /// zero, or if the writer memory budget is below tantivy's minimum.
    pub fn build(self) -> Result<IngestConfig, ConfigError> {
        for (field, value) in [
            ("fetch_concurrency", self.fetch_concurrency),
            ("batch_size", self.batch_size),
            ("channel_capacity", self.channel_capacity),
        ] {
            if value == 0 {
                return Err(ConfigError::Zero { field });
            }
        }
        if self.writer_memory_bytes < MIN_WRITER_MEMORY_BYTES {
            return Err(ConfigError::WriterMemoryTooSmall(self.writer_memory_bytes));
        }

        Ok(IngestConfig {
            fetch_concurrency: self.fetch_concurrency,
            batch_size: self.batch_size,
            channel_capacity: self.channel_capacity,
            writer_memory_bytes: self.writer_memory_bytes,
            expected_documents: self.expected_documents,
            show_progress: self.show_progress,
        })
    }
}
