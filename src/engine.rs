//! Knowledge engine facade.
//!
//! [`KnowledgeEngine`] wires the index, embedding service, query engine,
//! and answer synthesizer together behind one handle. Callers open it with
//! a [`Config`] and use it in-process; all state lives in the configured
//! index directory.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::answer::AnswerSynthesizer;
use crate::chunk::truncate_chars;
use crate::config::{self, Config};
use crate::embedding::{EmbeddingBackend, EmbeddingService};
use crate::ingest::{self, IngestError};
use crate::models::{
    BatchReport, DocumentSummary, IngestReceipt, KnowledgeStats, QueryResponse, SearchHit,
    SourceRef, SourceType,
};
use crate::search::QueryEngine;
use crate::store::{self, IndexBackend, VectorIndex};

/// Citations attached to an answer are capped at this many sources.
const MAX_SOURCES: usize = 3;
/// Characters of excerpt carried per citation.
const SOURCE_PREVIEW_CHARS: usize = 200;

/// Backend snapshot reported by [`KnowledgeEngine::health`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngineHealth {
    pub embedding: EmbeddingBackend,
    pub index: IndexBackend,
    /// None when answer generation is disabled.
    pub answerer_reachable: Option<bool>,
}

/// One handle over the whole ingest-search-answer pipeline.
pub struct KnowledgeEngine {
    config: Config,
    index: Arc<dyn VectorIndex>,
    embedder: Arc<EmbeddingService>,
    query_engine: QueryEngine,
    synthesizer: AnswerSynthesizer,
}

impl KnowledgeEngine {
    /// Validates the configuration and opens every backend. The durable
    /// index and the semantic embedding model both degrade to in-process
    /// fallbacks rather than failing the open.
    pub async fn open(config: Config) -> Result<Self> {
        config::validate(&config)?;

        let index = store::open_index(&config.storage).await;
        let embedder = Arc::new(EmbeddingService::init(&config.embedding).await);
        let query_engine =
            QueryEngine::new(index.clone(), embedder.clone(), config.retrieval.clone());
        let synthesizer = AnswerSynthesizer::new(config.answer.clone())?;

        info!(
            embedding = ?embedder.backend(),
            index = ?index.backend(),
            "knowledge engine ready"
        );
        Ok(Self {
            config,
            index,
            embedder,
            query_engine,
            synthesizer,
        })
    }

    /// Ingests one file of the stated type.
    pub async fn ingest(
        &self,
        path: &Path,
        source_type: SourceType,
    ) -> Result<IngestReceipt, IngestError> {
        ingest::ingest_file(
            self.index.as_ref(),
            self.embedder.as_ref(),
            &self.config.chunking,
            path,
            source_type,
        )
        .await
    }

    /// Ingests every supported file under `dir`, continuing past
    /// individual failures.
    pub async fn ingest_dir(&self, dir: &Path) -> Result<BatchReport, IngestError> {
        ingest::ingest_dir(
            self.index.as_ref(),
            self.embedder.as_ref(),
            &self.config.chunking,
            dir,
        )
        .await
    }

    /// Runs hybrid retrieval. A `top_k` of zero selects the configured
    /// default.
    pub async fn search(&self, query: &str, top_k: usize) -> Vec<SearchHit> {
        let top_k = if top_k == 0 {
            self.config.retrieval.default_top_k
        } else {
            top_k
        };
        self.query_engine.search(query, top_k).await
    }

    /// Answers a natural-language question: retrieves, synthesizes, and
    /// cites. Never fails; an empty index yields a no-results answer.
    pub async fn query(&self, question: &str, top_k: usize) -> QueryResponse {
        let hits = self.search(question, top_k).await;
        let answer = self.synthesizer.answer(question, &hits).await;
        let sources = hits
            .iter()
            .take(MAX_SOURCES)
            .map(|hit| SourceRef {
                source: hit.filename.clone(),
                content: truncate_chars(&hit.text, SOURCE_PREVIEW_CHARS),
                score: hit.score,
            })
            .collect();
        QueryResponse { answer, sources }
    }

    /// Index-wide counts plus one summary row per document.
    pub async fn stats(&self) -> Result<KnowledgeStats> {
        let stats = self.index.stats().await?;
        let per_document = self.index.list_documents().await?;
        Ok(KnowledgeStats {
            document_count: stats.document_count,
            total_chunk_count: stats.total_chunk_count,
            per_document,
        })
    }

    /// Documents in arrival order.
    pub async fn list_documents(&self) -> Result<Vec<DocumentSummary>> {
        self.index.list_documents().await
    }

    /// Removes every chunk of one document. The id is the fingerprint
    /// returned at ingest time (also carried by [`DocumentSummary`]).
    /// Returns the number of chunks deleted; zero when the id is unknown.
    pub async fn remove_document(&self, document_id: &str) -> Result<u64> {
        let removed = self.index.remove_document(document_id).await?;
        info!(document_id = %document_id, chunks = removed, "document removed");
        Ok(removed)
    }

    /// Reports which backends are active. Probes the answer endpoint only
    /// when generation is enabled.
    pub async fn health(&self) -> EngineHealth {
        let answerer_reachable = if self.config.answer.enabled {
            Some(self.synthesizer.probe().await)
        } else {
            None
        };
        EngineHealth {
            embedding: self.embedder.backend(),
            index: self.index.backend(),
            answerer_reachable,
        }
    }
}
