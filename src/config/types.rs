//! Core configuration types for ingestion and serving
//!
//! `IngestConfig` controls the three pipeline stages; `ServerConfig` controls
//! the HTTP query endpoint.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use crate::utils::{DEFAULT_PORT, DEFAULT_SEARCH_LIMIT};

/// Configuration for one ingestion run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Maximum fetch-and-parse operations in flight (K)
    pub(crate) fetch_concurrency: usize,
    /// Documents per commit (B)
    pub(crate) batch_size: usize,
    /// Capacity of the channels between stages
    pub(crate) channel_capacity: usize,
    /// Heap budget handed to the tantivy writer
    pub(crate) writer_memory_bytes: usize,
    /// Expected document count, used only as the progress bar length
    pub(crate) expected_documents: Option<u64>,
    /// Draw a terminal progress bar
    pub(crate) show_progress: bool,
}

/// Configuration for the HTTP query endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub(crate) host: IpAddr,
    pub(crate) port: u16,
    pub(crate) search_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub fn new(port: u16) -> Self {
        Self {
            port,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_host(mut self, host: IpAddr) -> Self {
        self.host = host;
        self
    }

    /// Maximum hits returned per query; zero is raised to one
    #[must_use]
    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit.max(1);
        self
    }

    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
