//! In-memory fallback [`VectorIndex`].
//!
//! Holds every entry in a `RwLock<Vec<IndexEntry>>` and scans linearly for
//! nearest neighbors. Used when the durable backend cannot be opened;
//! contents vanish with the process, which the engine reports at startup.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use super::{AddReceipt, IndexBackend, VectorHit, VectorIndex, SAMPLE_EXCERPT_CHARS};
use crate::chunk::truncate_chars;
use crate::embedding::cosine_similarity;
use crate::models::{DocumentMeta, DocumentSummary, IndexEntry, IndexStats};

#[derive(Default)]
pub struct MemoryIndex {
    entries: RwLock<Vec<IndexEntry>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
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

        let mut entries = self.entries.write().unwrap();
        if entries.iter().any(|e| e.document_id == document_id) {
            bail!("document already indexed: {}", document_id);
        }
        for (i, (text, embedding)) in chunks.iter().zip(embeddings).enumerate() {
            entries.push(IndexEntry {
                chunk_id: format!("{}_{}", document_id, i),
                document_id: document_id.to_string(),
                filename: meta.filename.clone(),
                source_type: meta.source_type,
                seq: i as i64,
                text: text.clone(),
                embedding: embedding.clone(),
                ingested_at: now,
            });
        }
        Ok(AddReceipt {
            document_id: document_id.to_string(),
            chunks_added: chunks.len(),
        })
    }

    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<VectorHit>> {
        if embedding.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        let entries = self.entries.read().unwrap();
        let mut hits: Vec<VectorHit> = entries
            .iter()
            .map(|entry| VectorHit {
                chunk_id: entry.chunk_id.clone(),
                document_id: entry.document_id.clone(),
                filename: entry.filename.clone(),
                source_type: entry.source_type,
                text: entry.text.clone(),
                score: f64::from(cosine_similarity(embedding, &entry.embedding)),
            })
            .collect();
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
        let entries = self.entries.read().unwrap();
        Ok(entries.iter().any(|e| e.document_id == document_id))
    }

    async fn list_documents(&self) -> Result<Vec<DocumentSummary>> {
        let entries = self.entries.read().unwrap();
        let mut order: Vec<String> = Vec::new();
        let mut summaries: HashMap<String, DocumentSummary> = HashMap::new();
        for entry in entries.iter() {
            if let Some(summary) = summaries.get_mut(&entry.filename) {
                summary.chunk_count += 1;
            } else {
                order.push(entry.filename.clone());
                summaries.insert(
                    entry.filename.clone(),
                    DocumentSummary {
                        filename: entry.filename.clone(),
                        document_id: entry.document_id.clone(),
                        source_type: entry.source_type,
                        chunk_count: 1,
                        sample_excerpt: truncate_chars(&entry.text, SAMPLE_EXCERPT_CHARS),
                    },
                );
            }
        }
        Ok(order
            .into_iter()
            .filter_map(|filename| summaries.remove(&filename))
            .collect())
    }

    async fn document_content(&self, filename: &str) -> Result<Option<String>> {
        let entries = self.entries.read().unwrap();
        let texts: Vec<&str> = entries
            .iter()
            .filter(|e| e.filename == filename)
            .map(|e| e.text.as_str())
            .collect();
        if texts.is_empty() {
            return Ok(None);
        }
        Ok(Some(texts.join("\n\n")))
    }

    async fn stats(&self) -> Result<IndexStats> {
        let entries = self.entries.read().unwrap();
        // Per filename, matching the listing.
        let documents: HashSet<&str> = entries.iter().map(|e| e.filename.as_str()).collect();
        Ok(IndexStats {
            total_chunk_count: entries.len() as i64,
            document_count: documents.len() as i64,
        })
    }

    async fn remove_document(&self, document_id: &str) -> Result<u64> {
        let mut entries = self.entries.write().unwrap();
        let before = entries.len();
        entries.retain(|e| e.document_id != document_id);
        Ok((before - entries.len()) as u64)
    }

    fn backend(&self) -> IndexBackend {
        IndexBackend::InMemory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::hashed_embedding;
    use crate::models::SourceType;

    fn meta(filename: &str) -> DocumentMeta {
        DocumentMeta {
            filename: filename.to_string(),
            source_type: SourceType::Markdown,
        }
    }

    fn embeds(chunks: &[String]) -> Vec<Vec<f32>> {
        chunks.iter().map(|c| hashed_embedding(c, 64)).collect()
    }

    #[tokio::test]
    async fn add_query_and_remove() {
        let index = MemoryIndex::new();
        let chunks = vec!["alpha chunk".to_string(), "beta chunk".to_string()];
        index
            .add("doc1", &chunks, &embeds(&chunks), &meta("a.md"))
            .await
            .unwrap();

        let hits = index
            .query(&hashed_embedding("alpha chunk", 64), 1)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text, "alpha chunk");
        assert!((hits[0].score - 1.0).abs() < 1e-6);

        assert_eq!(index.remove_document("doc1").await.unwrap(), 2);
        assert_eq!(index.stats().await.unwrap().total_chunk_count, 0);
    }

    #[tokio::test]
    async fn duplicate_document_rejected() {
        let index = MemoryIndex::new();
        let chunks = vec!["text".to_string()];
        index
            .add("doc1", &chunks, &embeds(&chunks), &meta("a.md"))
            .await
            .unwrap();
        assert!(index
            .add("doc1", &chunks, &embeds(&chunks), &meta("a.md"))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn stats_count_one_document_per_filename() {
        let index = MemoryIndex::new();
        for doc_id in ["rev1", "rev2"] {
            let chunks = vec![format!("{} of the guide", doc_id)];
            index
                .add(doc_id, &chunks, &embeds(&chunks), &meta("guide.md"))
                .await
                .unwrap();
        }
        let stats = index.stats().await.unwrap();
        assert_eq!(stats.total_chunk_count, 2);
        assert_eq!(stats.document_count, 1);
        assert_eq!(index.list_documents().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn listing_keeps_arrival_order() {
        let index = MemoryIndex::new();
        for (doc_id, filename) in [("d1", "z.md"), ("d2", "a.md")] {
            let chunks = vec![format!("{} content here", filename)];
            index
                .add(doc_id, &chunks, &embeds(&chunks), &meta(filename))
                .await
                .unwrap();
        }
        let listing = index.list_documents().await.unwrap();
        let names: Vec<&str> = listing.iter().map(|d| d.filename.as_str()).collect();
        assert_eq!(names, vec!["z.md", "a.md"]);
    }

    #[tokio::test]
    async fn content_for_unknown_filename_is_none() {
        let index = MemoryIndex::new();
        assert!(index.document_content("nope.md").await.unwrap().is_none());
    }
}
