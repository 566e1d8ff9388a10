//! Core Tantivy search engine implementation
//!
//! This module provides the `SearchEngine` handle that owns the Tantivy index
//! and its reader. One handle is created at startup and cloned into both the
//! ingestion pipeline (writer side) and the query endpoint (reader side).

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tantivy::directory::MmapDirectory;
use tantivy::schema::Field;
use tantivy::tokenizer::TextAnalyzer;
use tantivy::{Index, IndexReader, IndexSettings, IndexWriter, ReloadPolicy};

use super::errors::{SearchError, SearchResult};
use super::schema::{SearchSchema, SearchSchemaBuilder};
use super::types::{IndexStats, SearchHit};
use super::writer::IndexBatchWriter;

/// Main search engine managing Tantivy index operations
#[derive(Clone)]
pub struct SearchEngine {
    index: Index,
    schema: Arc<SearchSchema>,
    reader: IndexReader,
    index_path: Option<PathBuf>,
    opened_existing: bool,
}

impl SearchEngine {
    /// Open the index at `path`, or create it with the plant schema
    pub fn open_or_create(path: impl AsRef<Path>) -> SearchResult<Self> {
        Self::open_or_create_with(path, SearchSchema::builder())
    }

    /// Open or create with a custom schema configuration
    ///
    /// An existing index is reused as-is; its documents are never discarded.
    /// If its schema lacks a field this crate writes, opening fails instead.
    pub fn open_or_create_with(
        path: impl AsRef<Path>,
        builder: SearchSchemaBuilder,
    ) -> SearchResult<Self> {
        let index_dir = path.as_ref().to_path_buf();

        let (index, schema, opened_existing) = if index_dir.join("meta.json").exists() {
            let index = Index::open_in_dir(&index_dir).map_err(|e| SearchError::IndexInitialization {
                path: index_dir.clone(),
                message: format!("failed to open existing index: {e}"),
            })?;
            let schema = SearchSchema::from_existing(index.schema(), builder.keyword_fields())
                .map_err(|source| SearchError::SchemaMismatch {
                    path: index_dir.clone(),
                    source,
                })?;
            tracing::info!(path = %index_dir.display(), "Opening existing index");
            (index, schema, true)
        } else {
            std::fs::create_dir_all(&index_dir)?;
            let schema = builder.build()?;
            let directory = MmapDirectory::open(&index_dir).map_err(|e| {
                SearchError::IndexInitialization {
                    path: index_dir.clone(),
                    message: format!("failed to open index directory: {e}"),
                }
            })?;
            let index = Index::create(directory, schema.schema.clone(), IndexSettings::default())?;
            tracing::info!(path = %index_dir.display(), "Created new index");
            (index, schema, false)
        };

        Self::finish(index, schema, &builder, Some(index_dir), opened_existing)
    }

    /// Index held entirely in memory, for tests and one-off runs
    pub fn create_in_ram(builder: SearchSchemaBuilder) -> SearchResult<Self> {
        let schema = builder.build()?;
        let index = Index::create_in_ram(schema.schema.clone());
        Self::finish(index, schema, &builder, None, false)
    }

    fn finish(
        index: Index,
        schema: SearchSchema,
        builder: &SearchSchemaBuilder,
        index_path: Option<PathBuf>,
        opened_existing: bool,
    ) -> SearchResult<Self> {
        builder.register_tokenizers(index.tokenizers())?;

        // Commits from another process (an `index` run) become visible to a
        // long-lived server through the meta.json watcher
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()?;

        Ok(SearchEngine {
            index,
            schema: Arc::new(schema),
            reader,
            index_path,
            opened_existing,
        })
    }

    /// Get a reference to the search schema
    #[must_use]
    pub fn schema(&self) -> &SearchSchema {
        &self.schema
    }

    /// Get the index reader
    #[must_use]
    pub fn reader(&self) -> &IndexReader {
        &self.reader
    }

    /// Whether the handle was opened on an index that already existed on disk
    #[must_use]
    pub fn opened_existing(&self) -> bool {
        self.opened_existing
    }

    #[must_use]
    pub fn index_path(&self) -> Option<&Path> {
        self.index_path.as_deref()
    }

    /// Create an index writer with the given heap budget
    ///
    /// Tantivy allows one writer per index; a second concurrent writer (for
    /// example another `index` process) fails with a lock error here.
    pub fn writer(&self, memory_limit: usize) -> SearchResult<IndexWriter> {
        self.index
            .writer(memory_limit)
            .map_err(|e| SearchError::WriterAcquisition(e.to_string()))
    }

    /// Writer that commits whole batches of parsed documents
    pub fn batch_writer(&self, memory_limit: usize) -> SearchResult<IndexBatchWriter> {
        let writer = self.writer(memory_limit)?;
        Ok(IndexBatchWriter::new(self.clone(), writer))
    }

    /// Get the text analyzer (tokenizer) for a specific field
    ///
    /// Returns the TextAnalyzer configured for the field's indexing options.
    /// Returns None if the field is not a text field or has no tokenizer configured.
    pub fn get_text_analyzer(&self, field: Field) -> Option<TextAnalyzer> {
        use tantivy::schema::FieldType;

        let field_entry = self.schema.schema.get_field_entry(field);

        if let FieldType::Str(text_options) = field_entry.field_type()
            && let Some(indexing_options) = text_options.get_indexing_options()
        {
            let tokenizer_name = indexing_options.tokenizer();
            return self.index.tokenizers().get(tokenizer_name);
        }
        None
    }

    /// Run a match query against the committed documents
    pub async fn search(&self, query: &str, limit: usize) -> SearchResult<Vec<SearchHit>> {
        super::query::search(self, query, limit).await
    }

    /// Number of committed, searchable documents
    #[must_use]
    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }

    /// Get index statistics
    pub async fn get_stats(&self) -> IndexStats {
        let searcher = self.reader.searcher();
        let num_documents = searcher.num_docs();
        let num_segments = searcher.segment_readers().len();

        let (index_size_bytes, last_commit) = match &self.index_path {
            Some(path) => (
                calculate_index_size(path.clone()).await,
                last_commit_time(path).await,
            ),
            None => (None, None),
        };

        IndexStats {
            num_documents,
            num_segments,
            index_size_bytes,
            last_commit,
        }
    }
}

/// Get the last commit time from meta.json modification time
async fn last_commit_time(index_path: &Path) -> Option<chrono::DateTime<chrono::Utc>> {
    let modified = tokio::fs::metadata(index_path.join("meta.json"))
        .await
        .ok()?
        .modified()
        .ok()?;
    Some(chrono::DateTime::<chrono::Utc>::from(modified))
}

/// Calculate the total size of the index directory
async fn calculate_index_size(index_path: PathBuf) -> Option<u64> {
    use jwalk::WalkDir;

    if !tokio::fs::try_exists(&index_path).await.unwrap_or(false) {
        return None;
    }

    tokio::task::spawn_blocking(move || -> u64 {
        WalkDir::new(&index_path)
            .skip_hidden(false)
            .follow_links(false)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| std::fs::metadata(entry.path()).ok())
            .map(|metadata| metadata.len())
            .sum()
    })
    .await
    .ok()
}
