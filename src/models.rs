//! Core data models used throughout the knowledge base.
//!
//! These types represent the documents, chunks, and search results that flow
//! through the ingestion and retrieval pipeline.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Origin format of an ingested document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Pdf,
    Markdown,
}

impl SourceType {
    /// Resolves the source type from a file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<SourceType> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "pdf" => Some(SourceType::Pdf),
            "md" | "markdown" => Some(SourceType::Markdown),
            _ => None,
        }
    }

    /// Stable string form used in the persisted index.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Pdf => "pdf",
            SourceType::Markdown => "markdown",
        }
    }

    /// Inverse of [`SourceType::as_str`].
    pub fn parse(s: &str) -> Option<SourceType> {
        match s {
            "pdf" => Some(SourceType::Pdf),
            "markdown" => Some(SourceType::Markdown),
            _ => None,
        }
    }
}

/// Document-level metadata stamped onto every chunk at indexing time.
#[derive(Debug, Clone)]
pub struct DocumentMeta {
    pub filename: String,
    pub source_type: SourceType,
}

/// One persisted chunk with its embedding.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub chunk_id: String,
    pub document_id: String,
    pub filename: String,
    pub source_type: SourceType,
    pub seq: i64,
    pub text: String,
    pub embedding: Vec<f32>,
    pub ingested_at: i64,
}

/// Per-document aggregate used for listings and keyword retrieval.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub filename: String,
    pub document_id: String,
    pub source_type: SourceType,
    pub chunk_count: i64,
    /// Leading characters of the document's first chunk.
    pub sample_excerpt: String,
}

/// Index-wide counts.
#[derive(Debug, Clone, Copy)]
pub struct IndexStats {
    pub total_chunk_count: i64,
    /// Distinct filenames in the index.
    pub document_count: i64,
}

/// Aggregate view returned by the engine.
#[derive(Debug, Clone, Serialize)]
pub struct KnowledgeStats {
    pub document_count: i64,
    pub total_chunk_count: i64,
    pub per_document: Vec<DocumentSummary>,
}

/// Which retrieval signals contributed to a hit, for explainability.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SignalScores {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename_match: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword_overlap: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub containment: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synonym: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector_similarity: Option<f64>,
}

/// One ranked retrieval result. After deduplication there is at most one
/// hit per filename.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub filename: String,
    pub source_type: SourceType,
    /// Excerpt text; merged hits join excerpts with a blank line.
    pub text: String,
    /// Final fused score in [0, 1].
    pub score: f64,
    pub signals: SignalScores,
}

/// Receipt for one successfully ingested document.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReceipt {
    pub document_id: String,
    pub filename: String,
    pub chunks_added: usize,
}

/// Per-file outcome inside a directory ingestion report.
#[derive(Debug, Clone, Serialize)]
pub struct BatchEntry {
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary of a directory ingestion run. Individual failures do not abort
/// the batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: usize,
    pub entries: Vec<BatchEntry>,
}

/// A cited source attached to a synthesized answer.
#[derive(Debug, Clone, Serialize)]
pub struct SourceRef {
    pub source: String,
    /// Leading characters of the excerpt backing the citation.
    pub content: String,
    pub score: f64,
}

/// Final response to a natural-language question.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<SourceRef>,
}
