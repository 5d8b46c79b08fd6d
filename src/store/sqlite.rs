//! SQLite-backed [`VectorIndex`].
//!
//! One `documents` table keyed by chunk id holds text, metadata, and the
//! embedding as a little-endian f32 BLOB. Nearest-neighbor lookup loads all
//! embeddings and scores cosine similarity in Rust; at knowledge-base scale
//! (hundreds of documents) a linear scan stays well under the query budget.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use tracing::{debug, warn};

use super::{AddReceipt, IndexBackend, VectorHit, VectorIndex, SAMPLE_EXCERPT_CHARS};
use crate::chunk::truncate_chars;
use crate::config::StorageConfig;
use crate::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};
use crate::models::{DocumentMeta, DocumentSummary, IndexStats, SourceType};

/// Filename of the index database inside the configured directory.
const DB_FILE: &str = "documents.sqlite";

pub struct SqliteIndex {
    pool: SqlitePool,
}

impl SqliteIndex {
    /// Opens (creating if needed) the index under `config.index_dir` and
    /// applies schema migrations.
    pub async fn open(config: &StorageConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.index_dir).with_context(|| {
            format!(
                "Failed to create index directory: {}",
                config.index_dir.display()
            )
        })?;
        let db_path = config.index_dir.join(DB_FILE);

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open index database: {}", db_path.display()))?;

        run_migrations(&pool).await?;
        debug!(path = %db_path.display(), "index database ready");
        Ok(Self { pool })
    }
}

async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            chunk_id    TEXT PRIMARY KEY,
            document_id TEXT NOT NULL,
            filename    TEXT NOT NULL,
            source_type TEXT NOT NULL,
            seq         INTEGER NOT NULL,
            text        TEXT NOT NULL,
            embedding   BLOB NOT NULL,
            ingested_at INTEGER NOT NULL,
            UNIQUE(document_id, seq)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_document_id ON documents(document_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_filename ON documents(filename)")
        .execute(pool)
        .await?;

    Ok(())
}

#[async_trait]
impl VectorIndex for SqliteIndex {
    async fn add(
        &self,
        document_id: &str,
        chunks: &[String],
        embeddings: &[Vec<f32>],
        meta: &DocumentMeta,
    ) -> Result<AddReceipt> {
        if chunks.len() != embeddings.len() {
            bail!(
                "chunk/embedding count mismatch: {} chunks, {} embeddings",
                chunks.len(),
                embeddings.len()
            );
        }
        let now = chrono::Utc::now().timestamp();

        let mut tx = self.pool.begin().await?;
        for (i, (text, embedding)) in chunks.iter().zip(embeddings).enumerate() {
            let chunk_id = format!("{}_{}", document_id, i);
            sqlx::query(
                r#"
                INSERT INTO documents
                    (chunk_id, document_id, filename, source_type, seq, text, embedding, ingested_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&chunk_id)
            .bind(document_id)
            .bind(&meta.filename)
            .bind(meta.source_type.as_str())
            .bind(i as i64)
            .bind(text)
            .bind(vec_to_blob(embedding))
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(AddReceipt {
            document_id: document_id.to_string(),
            chunks_added: chunks.len(),
        })
    }

    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<VectorHit>> {
        if embedding.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            "SELECT chunk_id, document_id, filename, source_type, text, embedding FROM documents",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut hits = Vec::with_capacity(rows.len());
        for row in rows {
            let type_str: String = row.get("source_type");
            let Some(source_type) = SourceType::parse(&type_str) else {
                warn!(source_type = %type_str, "skipping row with unknown source type");
                continue;
            };
            let blob: Vec<u8> = row.get("embedding");
            let score = f64::from(cosine_similarity(embedding, &blob_to_vec(&blob)));
            hits.push(VectorHit {
                chunk_id: row.get("chunk_id"),
                document_id: row.get("document_id"),
                filename: row.get("filename"),
                source_type,
                text: row.get("text"),
                score,
            });
        }

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.chunk_id.cmp(&b.chunk_id))
        });
        hits.truncate(k);
        Ok(hits)
    }

    async fn contains_document(&self, document_id: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT COUNT(*) > 0 FROM documents WHERE document_id = ?")
                .bind(document_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn list_documents(&self) -> Result<Vec<DocumentSummary>> {
        let count_rows =
            sqlx::query("SELECT filename, COUNT(*) AS chunk_count FROM documents GROUP BY filename")
                .fetch_all(&self.pool)
                .await?;
        let mut counts: HashMap<String, i64> = HashMap::new();
        for row in count_rows {
            counts.insert(row.get("filename"), row.get("chunk_count"));
        }

        // First chunk of each document, in arrival order; the first row per
        // filename wins so re-ingested filenames keep their original slot.
        let rows = sqlx::query(
            "SELECT filename, document_id, source_type, text FROM documents WHERE seq = 0 ORDER BY rowid ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut seen: HashSet<String> = HashSet::new();
        let mut summaries = Vec::new();
        for row in rows {
            let filename: String = row.get("filename");
            if !seen.insert(filename.clone()) {
                continue;
            }
            let type_str: String = row.get("source_type");
            let source_type = SourceType::parse(&type_str)
                .ok_or_else(|| anyhow!("unknown source type in index: {}", type_str))?;
            let text: String = row.get("text");
            summaries.push(DocumentSummary {
                document_id: row.get("document_id"),
                source_type,
                chunk_count: counts.get(&filename).copied().unwrap_or(0),
                sample_excerpt: truncate_chars(&text, SAMPLE_EXCERPT_CHARS),
                filename,
            });
        }
        Ok(summaries)
    }

    async fn document_content(&self, filename: &str) -> Result<Option<String>> {
        let rows = sqlx::query("SELECT text FROM documents WHERE filename = ? ORDER BY rowid ASC")
            .bind(filename)
            .fetch_all(&self.pool)
            .await?;
        if rows.is_empty() {
            return Ok(None);
        }
        let texts: Vec<String> = rows.iter().map(|row| row.get("text")).collect();
        Ok(Some(texts.join("\n\n")))
    }

    async fn stats(&self) -> Result<IndexStats> {
        let total_chunk_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await?;
        // Documents count per filename, matching the listing: a re-ingested
        // file keeps contributing one document however many revisions of it
        // the index holds.
        let document_count: i64 =
            sqlx::query_scalar("SELECT COUNT(DISTINCT filename) FROM documents")
                .fetch_one(&self.pool)
                .await?;
        Ok(IndexStats {
            total_chunk_count,
            document_count,
        })
    }

    async fn remove_document(&self, document_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM documents WHERE document_id = ?")
            .bind(document_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    fn backend(&self) -> IndexBackend {
        IndexBackend::Durable
    }
}
