//! Document ingestion pipeline.
//!
//! Coordinates the full flow for one file: extraction → fingerprinting →
//! duplicate check → chunking → embedding → indexing. The index write is
//! atomic, so a failed ingestion never leaves partial chunks behind.
//! [`ingest_dir`] walks a directory and applies the same flow per file,
//! collecting per-file outcomes instead of aborting on the first failure.

use sha2::{Digest, Sha256};
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::chunk::chunk_text;
use crate::config::ChunkingConfig;
use crate::embedding::EmbeddingService;
use crate::extract::{extract_file, ExtractError};
use crate::models::{BatchEntry, BatchReport, DocumentMeta, IngestReceipt, SourceType};
use crate::store::VectorIndex;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error("document already indexed (fingerprint {0})")]
    Duplicate(String),
    #[error("vector index rejected the document: {0}")]
    Index(anyhow::Error),
}

/// Content fingerprint identifying a document: SHA-256 over the filename
/// and the first 100 characters of extracted text. Documents whose text
/// differs only beyond that prefix share a fingerprint and count as
/// duplicates.
pub fn fingerprint(filename: &str, text: &str) -> String {
    let lead: String = text.chars().take(100).collect();
    let mut hasher = Sha256::new();
    hasher.update(filename.as_bytes());
    hasher.update(b"_");
    hasher.update(lead.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Ingests a single file into the index.
///
/// The caller states the source type; extension detection belongs to
/// [`ingest_dir`]. Re-ingesting a document with an unchanged fingerprint
/// fails with [`IngestError::Duplicate`] and leaves the index untouched.
pub async fn ingest_file(
    index: &dyn VectorIndex,
    embedder: &EmbeddingService,
    chunking: &ChunkingConfig,
    path: &Path,
    source_type: SourceType,
) -> Result<IngestReceipt, IngestError> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let extracted = extract_file(path, source_type)?;
    let document_id = fingerprint(&filename, &extracted.text);

    if index
        .contains_document(&document_id)
        .await
        .map_err(IngestError::Index)?
    {
        return Err(IngestError::Duplicate(document_id));
    }

    let chunks = chunk_text(&extracted.text, chunking.max_chars, chunking.min_chars);
    if chunks.is_empty() {
        return Err(ExtractError::Empty.into());
    }

    let embeddings = embedder.encode(&chunks).await;
    let meta = DocumentMeta {
        filename: filename.clone(),
        source_type,
    };
    let receipt = index
        .add(&document_id, &chunks, &embeddings, &meta)
        .await
        .map_err(IngestError::Index)?;

    info!(
        filename = %filename,
        document_id = %document_id,
        chunks = receipt.chunks_added,
        "document ingested"
    );
    Ok(IngestReceipt {
        document_id: receipt.document_id,
        filename,
        chunks_added: receipt.chunks_added,
    })
}

/// Walks `dir` recursively and ingests every supported file.
///
/// Files with unsupported extensions and files that fail to ingest become
/// failed entries in the report; the walk continues past them. Files are
/// visited in sorted path order so reports are deterministic.
pub async fn ingest_dir(
    index: &dyn VectorIndex,
    embedder: &EmbeddingService,
    chunking: &ChunkingConfig,
    dir: &Path,
) -> Result<BatchReport, IngestError> {
    if !dir.is_dir() {
        return Err(ExtractError::Io {
            path: dir.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        }
        .into());
    }

    let mut files: Vec<std::path::PathBuf> = Vec::new();
    for entry in WalkDir::new(dir) {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() {
                    files.push(entry.into_path());
                }
            }
            Err(e) => warn!(error = %e, "skipping unreadable directory entry"),
        }
    }
    files.sort();

    let mut report = BatchReport {
        succeeded: 0,
        failed: 0,
        entries: Vec::new(),
    };
    for path in files {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let Some(source_type) = SourceType::from_path(&path) else {
            report.failed += 1;
            report.entries.push(BatchEntry {
                error: Some(IngestError::UnsupportedType(filename.clone()).to_string()),
                filename,
                document_id: None,
            });
            continue;
        };

        match ingest_file(index, embedder, chunking, &path, source_type).await {
            Ok(receipt) => {
                report.succeeded += 1;
                report.entries.push(BatchEntry {
                    filename,
                    document_id: Some(receipt.document_id),
                    error: None,
                });
            }
            Err(e) => {
                warn!(filename = %filename, error = %e, "file failed to ingest");
                report.failed += 1;
                report.entries.push(BatchEntry {
                    filename,
                    document_id: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    info!(
        succeeded = report.succeeded,
        failed = report.failed,
        "directory ingestion finished"
    );
    Ok(report)
}
