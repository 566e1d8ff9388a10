//! Getter methods for the configuration types

use std::net::IpAddr;

use super::types::{IngestConfig, ServerConfig};

impl IngestConfig {
    #[must_use]
    pub fn fetch_concurrency(&self) -> usize {
        self.fetch_concurrency
    }

    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    #[must_use]
    pub fn channel_capacity(&self) -> usize {
        self.channel_capacity
    }

    #[must_use]
    pub fn writer_memory_bytes(&self) -> usize {
        self.writer_memory_bytes
    }

    #[must_use]
    pub fn expected_documents(&self) -> Option<u64> {
        self.expected_documents
    }

    #[must_use]
    pub fn show_progress(&self) -> bool {
        self.show_progress
    }
}

impl ServerConfig {
    #[must_use]
    pub fn host(&self) -> IpAddr {
        self.host
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub fn search_limit(&self) -> usize {
        self.search_limit
    }
}
