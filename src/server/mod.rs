//! HTTP query endpoint
//!
//! Read-only against the index: the router holds a clone of the same
//! `SearchEngine` the ingestion side writes through.

pub mod errors;
pub mod handlers;

pub use errors::QueryError;

use axum::Router;
use axum::routing::{get, post};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::search::SearchEngine;

/// State shared by every request
#[derive(Clone)]
pub struct AppState {
    pub engine: SearchEngine,
    pub search_limit: usize,
    /// Queries that reached the engine
    pub queries: Arc<AtomicU64>,
}

/// Build the router for the query endpoint
pub fn router(engine: SearchEngine, config: &ServerConfig) -> Router {
    let state = AppState {
        engine,
        search_limit: config.search_limit(),
        queries: Arc::new(AtomicU64::new(0)),
    };
    Router::new()
        .route("/search", post(handlers::handle_search))
        .route("/health", get(handlers::handle_health))
        .with_state(state)
}

/// Bind the configured address and serve until Ctrl-C
pub async fn serve(engine: SearchEngine, config: ServerConfig) -> std::io::Result<()> {
    let listener = TcpListener::bind(config.socket_addr()).await?;
    serve_with_shutdown(listener, engine, &config, shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` resolves
pub async fn serve_with_shutdown<F>(
    listener: TcpListener,
    engine: SearchEngine,
    config: &ServerConfig,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!(%addr, documents = engine.num_docs(), "Query server listening");
    axum::serve(listener, router(engine, config))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
