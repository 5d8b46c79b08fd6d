//! Vector index abstraction and backends.
//!
//! A [`VectorIndex`] persists document chunks with their embeddings and
//! serves the retrieval pipeline. Two backends exist:
//!
//! | Backend | Module | Durability |
//! |---------|--------|------------|
//! | SQLite | [`sqlite`] | survives restarts |
//! | In-memory | [`memory`] | process lifetime only |
//!
//! [`open_index`] prefers SQLite and degrades to the in-memory backend with
//! a warning when the durable store cannot be opened, so a broken data
//! directory never prevents the engine from starting.

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::config::StorageConfig;
use crate::models::{DocumentMeta, DocumentSummary, IndexStats, SourceType};

/// Characters of the first chunk kept as a listing preview.
pub const SAMPLE_EXCERPT_CHARS: usize = 100;

/// A scored chunk returned from nearest-neighbor lookup.
#[derive(Debug, Clone)]
pub struct VectorHit {
    pub chunk_id: String,
    pub document_id: String,
    pub filename: String,
    pub source_type: SourceType,
    pub text: String,
    /// Cosine similarity between the query and the chunk embedding.
    pub score: f64,
}

/// Receipt for a completed add.
#[derive(Debug, Clone)]
pub struct AddReceipt {
    pub document_id: String,
    pub chunks_added: usize,
}

/// Which index backend is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexBackend {
    Durable,
    InMemory,
}

/// Storage backend for document chunks and their embeddings.
///
/// | Operation | Purpose |
/// |-----------|---------|
/// | [`add`](VectorIndex::add) | persist one document's chunks atomically |
/// | [`query`](VectorIndex::query) | top-k nearest neighbors by cosine similarity |
/// | [`contains_document`](VectorIndex::contains_document) | fingerprint-based duplicate check |
/// | [`list_documents`](VectorIndex::list_documents) | per-filename aggregates in arrival order |
/// | [`document_content`](VectorIndex::document_content) | full concatenated text for one filename |
/// | [`stats`](VectorIndex::stats) | index-wide counts |
/// | [`remove_document`](VectorIndex::remove_document) | delete every chunk of one document |
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Persists one document's chunks. Chunk ids are derived as
    /// `{document_id}_{seq}`. Either every chunk lands or none does.
    async fn add(
        &self,
        document_id: &str,
        chunks: &[String],
        embeddings: &[Vec<f32>],
        meta: &DocumentMeta,
    ) -> Result<AddReceipt>;

    /// Returns up to `k` chunks nearest to `embedding`, best first. Ties
    /// break on ascending chunk id so results are stable.
    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<VectorHit>>;

    /// True when a document with this fingerprint is already indexed.
    async fn contains_document(&self, document_id: &str) -> Result<bool>;

    /// One entry per distinct filename, in the order filenames first
    /// arrived in the index.
    async fn list_documents(&self) -> Result<Vec<DocumentSummary>>;

    /// Full text for one filename: all its chunks in ingestion order,
    /// joined with blank lines. `None` when the filename is unknown.
    async fn document_content(&self, filename: &str) -> Result<Option<String>>;

    /// Index-wide counts. Documents are counted per distinct filename, in
    /// agreement with [`list_documents`](VectorIndex::list_documents).
    async fn stats(&self) -> Result<IndexStats>;

    /// Removes every chunk of the document, returning how many went away.
    async fn remove_document(&self, document_id: &str) -> Result<u64>;

    fn backend(&self) -> IndexBackend;
}

/// Opens the durable index, falling back to the in-memory backend when the
/// data directory is unusable.
pub async fn open_index(config: &StorageConfig) -> Arc<dyn VectorIndex> {
    match sqlite::SqliteIndex::open(config).await {
        Ok(index) => Arc::new(index),
        Err(e) => {
            warn!(
                index_dir = %config.index_dir.display(),
                error = %e,
                "durable index unavailable, falling back to in-memory (data will not persist)"
            );
            Arc::new(memory::MemoryIndex::new())
        }
    }
}
