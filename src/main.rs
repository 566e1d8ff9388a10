// plantdb-search: ingest plant JSON documents into a tantivy index and serve
// full-text queries over HTTP.
//
// `index` runs the ingestion pipeline once and exits non-zero on failure.
// `server` serves `POST /search` until interrupted.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use plantdb_search::config::{IngestConfig, ServerConfig};
use plantdb_search::pipeline::IngestPipeline;
use plantdb_search::search::SearchEngine;
use plantdb_search::storage::{GcsObjectStore, LocalObjectStore, ObjectStore};
use plantdb_search::utils::{
    DEFAULT_BATCH_SIZE, DEFAULT_BUCKET, DEFAULT_FETCH_CONCURRENCY, DEFAULT_INDEX_PATH,
    DEFAULT_PORT, DEFAULT_SEARCH_LIMIT, GCS_API_BASE_URL,
};

#[derive(Parser)]
#[command(name = "plantdb-search")]
#[command(about = "Index plant documents from object storage and serve full-text search")]
#[command(version)]
struct Cli {
    /// Location of the search index
    #[arg(long, global = true, env = "PLANTDB_INDEX_PATH", default_value = DEFAULT_INDEX_PATH)]
    index_path: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest every object of the bucket into the index, then exit
    Index(IndexArgs),
    /// Serve search queries against the index
    Server(ServerArgs),
}

#[derive(Args)]
struct IndexArgs {
    /// Cloud Storage bucket to ingest
    #[arg(long, env = "PLANTDB_BUCKET", default_value = DEFAULT_BUCKET)]
    bucket: String,

    /// Ingest from a local directory instead; takes precedence over `--bucket`
    #[arg(long)]
    local_dir: Option<PathBuf>,

    /// OAuth bearer token for private buckets
    #[arg(long, env = "GCS_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Storage API endpoint, for emulators
    #[arg(long, env = "GCS_API_BASE_URL", default_value = GCS_API_BASE_URL)]
    gcs_base_url: String,

    /// Names per bucket listing page (server default when unset)
    #[arg(long)]
    page_size: Option<u32>,

    /// Maximum objects fetched at once
    #[arg(long, default_value_t = DEFAULT_FETCH_CONCURRENCY)]
    concurrency: usize,

    /// Documents per index commit
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Expected number of documents, sets the progress bar length
    #[arg(long)]
    expected_documents: Option<u64>,

    /// Do not draw a progress bar
    #[arg(long)]
    no_progress: bool,
}

#[derive(Args)]
struct ServerArgs {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: IpAddr,

    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Maximum hits per query
    #[arg(long, default_value_t = DEFAULT_SEARCH_LIMIT)]
    limit: usize,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Index(args) => run_index(cli.index_path, args).await,
        Commands::Server(args) => run_server(cli.index_path, args).await,
    };

    if let Err(e) = result {
        tracing::error!(error = %format!("{e:#}"), "plantdb-search failed");
        std::process::exit(1);
    }
}

async fn run_index(index_path: PathBuf, args: IndexArgs) -> Result<()> {
    let engine = SearchEngine::open_or_create(&index_path)
        .with_context(|| format!("opening index at {}", index_path.display()))?;
    if engine.opened_existing() {
        tracing::info!(documents = engine.num_docs(), "Adding to existing index");
    }

    let store: Arc<dyn ObjectStore> = match args.local_dir {
        Some(dir) => Arc::new(LocalObjectStore::new(dir)),
        None => {
            let mut store = GcsObjectStore::new(args.bucket)
                .with_base_url(args.gcs_base_url)
                .with_access_token(args.access_token);
            if let Some(page_size) = args.page_size {
                store = store.with_page_size(page_size);
            }
            Arc::new(store)
        }
    };

    let config = IngestConfig::builder()
        .fetch_concurrency(args.concurrency)
        .batch_size(args.batch_size)
        .expected_documents(args.expected_documents)
        .show_progress(!args.no_progress)
        .build()?;

    let pipeline = IngestPipeline::new(config);
    let cancel = pipeline.cancellation_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling ingestion");
            cancel.cancel();
        }
    });

    let report = pipeline.run(store, &engine).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn run_server(index_path: PathBuf, args: ServerArgs) -> Result<()> {
    let engine = SearchEngine::open_or_create(&index_path)
        .with_context(|| format!("opening index at {}", index_path.display()))?;
    let config = ServerConfig::new(args.port)
        .with_host(args.host)
        .with_search_limit(args.limit);
    plantdb_search::server::serve(engine, config)
        .await
        .context("query server stopped")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn index_flags_parse() {
        let cli = Cli::try_parse_from([
            "plantdb-search",
            "--index-path",
            "/tmp/plants.index",
            "index",
            "--local-dir",
            "./plants",
            "--concurrency",
            "8",
            "--batch-size",
            "25",
            "--page-size",
            "500",
            "--no-progress",
        ])
        .expect("valid arguments");

        assert_eq!(cli.index_path, PathBuf::from("/tmp/plants.index"));
        let Commands::Index(args) = cli.command else {
            panic!("expected index subcommand");
        };
        assert_eq!(args.local_dir, Some(PathBuf::from("./plants")));
        assert_eq!(args.concurrency, 8);
        assert_eq!(args.batch_size, 25);
        assert_eq!(args.page_size, Some(500));
        assert!(args.no_progress);
    }

    #[test]
    fn server_port_and_limit_parse() {
        let cli = Cli::try_parse_from([
            "plantdb-search",
            "server",
            "--host",
            "127.0.0.1",
            "--port",
            "9090",
            "--limit",
            "10",
        ])
        .expect("valid arguments");
        let Commands::Server(args) = cli.command else {
            panic!("expected server subcommand");
        };
        assert_eq!(args.host, IpAddr::from([127, 0, 0, 1]));
        assert_eq!(args.port, 9090);
        assert_eq!(args.limit, 10);
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["plantdb-search", "crawl"]).is_err());
    }
}
