//! Hybrid retrieval over the vector index.
//!
//! A query runs through a cascade of channels. Filename resolution and
//! keyword scoring always run against the document listing; the semantic
//! vector lookup is a fallback consulted only when neither lexical channel
//! produced a candidate. Candidates then pass a relevance floor, merge to
//! one hit per source file, and sort deterministically so repeated queries
//! return identical results.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::RetrievalConfig;
use crate::embedding::EmbeddingService;
use crate::models::{DocumentSummary, SearchHit, SignalScores};
use crate::store::{VectorHit, VectorIndex};
use crate::tokenize::{keyword_overlap, keyword_scores, strip_stop_words, tokenize};

/// Score assigned when the query names a document.
const FILENAME_MATCH_SCORE: f64 = 0.95;
/// Minimum fused score for a vector hit whose source file the query names.
const FILENAME_VECTOR_FLOOR: f64 = 0.8;
/// Weights blending the keyword signals into one score.
const KEYWORD_WEIGHT_OVERLAP: f64 = 0.4;
const KEYWORD_WEIGHT_CONTAINMENT: f64 = 0.4;
const KEYWORD_WEIGHT_SYNONYM: f64 = 0.2;
/// A keyword candidate survives when any one of these thresholds is met.
const KEYWORD_KEEP_SCORE: f64 = 0.15;
const KEYWORD_KEEP_CONTAINMENT: f64 = 0.3;
const KEYWORD_KEEP_OVERLAP: f64 = 0.2;
/// Hits scoring above this merge two excerpts instead of one.
const STRONG_EXCERPT_SCORE: f64 = 0.5;
/// Excerpt length contributes to tie-breaking only up to this many chars.
const LENGTH_TIE_CAP: usize = 600;

/// Retrieval engine combining filename, keyword, and vector channels.
pub struct QueryEngine {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<EmbeddingService>,
    retrieval: RetrievalConfig,
}

impl QueryEngine {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<EmbeddingService>,
        retrieval: RetrievalConfig,
    ) -> Self {
        Self {
            index,
            embedder,
            retrieval,
        }
    }

    /// Runs the full retrieval cascade for one query.
    ///
    /// Never fails: index errors degrade to fewer (possibly zero) results.
    /// `top_k` is clamped to `1..=max_top_k`.
    pub async fn search(&self, query: &str, top_k: usize) -> Vec<SearchHit> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        let top_k = top_k.clamp(1, self.retrieval.max_top_k.max(1));

        let listing = match self.index.list_documents().await {
            Ok(listing) => listing,
            Err(e) => {
                warn!(error = %e, "document listing failed");
                Vec::new()
            }
        };

        let mut candidates = self.filename_stage(query, &listing).await;
        let named: HashSet<String> = candidates.iter().map(|h| h.filename.clone()).collect();
        candidates.extend(self.keyword_stage(query, &listing, &named).await);

        if candidates.is_empty() {
            candidates = self.vector_stage(query, top_k).await;
        }

        let kept = filter_by_relevance(
            candidates,
            self.retrieval.relevance_floor,
            self.retrieval.low_relevance_floor,
        );
        let mut results = dedup_by_source(kept);
        rank(&mut results);
        results.truncate(top_k);
        debug!(query = %query, results = results.len(), "search complete");
        results
    }

    /// Matches the query against document filenames. A query that names a
    /// file (exactly or by either side containing the other) returns that
    /// file's full content at a fixed high score.
    async fn filename_stage(&self, query: &str, listing: &[DocumentSummary]) -> Vec<SearchHit> {
        let query_name = normalize_name(query);
        if query_name.is_empty() {
            return Vec::new();
        }

        let mut hits = Vec::new();
        for doc in listing {
            if !names_match(&query_name, &normalize_name(&doc.filename)) {
                continue;
            }
            let content = match self.index.document_content(&doc.filename).await {
                Ok(Some(content)) => content,
                Ok(None) => continue,
                Err(e) => {
                    warn!(filename = %doc.filename, error = %e, "content fetch failed");
                    continue;
                }
            };
            hits.push(SearchHit {
                filename: doc.filename.clone(),
                source_type: doc.source_type,
                text: content,
                score: FILENAME_MATCH_SCORE,
                signals: SignalScores {
                    filename_match: Some(1.0),
                    ..SignalScores::default()
                },
            });
        }
        hits
    }

    /// Scores the query's tokens against each document's full text.
    /// Documents already resolved by filename are skipped; their content is
    /// in the result set in full.
    async fn keyword_stage(
        &self,
        query: &str,
        listing: &[DocumentSummary],
        named: &HashSet<String>,
    ) -> Vec<SearchHit> {
        let query_tokens = tokenize(query);
        if query_tokens.is_empty() {
            return Vec::new();
        }

        let mut hits = Vec::new();
        for doc in listing {
            if named.contains(&doc.filename) {
                continue;
            }
            let content = match self.index.document_content(&doc.filename).await {
                Ok(Some(content)) => content,
                Ok(None) => continue,
                Err(e) => {
                    warn!(filename = %doc.filename, error = %e, "content fetch failed");
                    continue;
                }
            };
            let lowered = content.to_lowercase();
            let scores = keyword_scores(&query_tokens, &tokenize(&content), &lowered);
            let fused = KEYWORD_WEIGHT_OVERLAP * scores.overlap
                + KEYWORD_WEIGHT_CONTAINMENT * scores.containment
                + KEYWORD_WEIGHT_SYNONYM * scores.synonym;
            if fused < KEYWORD_KEEP_SCORE
                && scores.containment < KEYWORD_KEEP_CONTAINMENT
                && scores.overlap < KEYWORD_KEEP_OVERLAP
            {
                continue;
            }
            hits.push(SearchHit {
                filename: doc.filename.clone(),
                source_type: doc.source_type,
                text: content,
                score: fused.clamp(0.0, 1.0),
                signals: SignalScores {
                    keyword_overlap: Some(scores.overlap),
                    containment: Some(scores.containment),
                    synonym: Some(scores.synonym),
                    ..SignalScores::default()
                },
            });
        }
        hits
    }

    /// Embeds the stop-word-stripped query and fetches nearest chunks from
    /// the index, oversampling so post-fusion filtering still fills
    /// `top_k`. Embedding and lookup run under one shared timeout; on
    /// timeout or index error the stage yields nothing.
    async fn vector_stage(&self, query: &str, top_k: usize) -> Vec<SearchHit> {
        let stripped = strip_stop_words(query);
        let fetch = top_k.saturating_mul(self.retrieval.oversample);
        let timeout = Duration::from_secs(self.retrieval.vector_timeout_secs);

        let lookup = async {
            let embedding = self.embedder.encode_one(&stripped).await;
            self.index.query(&embedding, fetch).await
        };
        let raw = match tokio::time::timeout(timeout, lookup).await {
            Ok(Ok(hits)) => hits,
            Ok(Err(e)) => {
                warn!(error = %e, "vector lookup failed");
                return Vec::new();
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.retrieval.vector_timeout_secs,
                    "vector lookup timed out"
                );
                return Vec::new();
            }
        };
        self.fuse_vector_hits(query, raw)
    }

    /// Blends cosine similarity with keyword overlap. Hits from a file the
    /// query names are floored afterwards so name lookups stay on top even
    /// when the embedding disagrees.
    fn fuse_vector_hits(&self, query: &str, raw: Vec<VectorHit>) -> Vec<SearchHit> {
        let query_tokens = tokenize(query);
        let query_name = normalize_name(query);

        raw.into_iter()
            .map(|hit| {
                let overlap = keyword_overlap(&query_tokens, &tokenize(&hit.text));
                let mut score = self.retrieval.vector_weight * hit.score
                    + self.retrieval.keyword_weight * overlap;
                let mut signals = SignalScores {
                    vector_similarity: Some(hit.score),
                    keyword_overlap: Some(overlap),
                    ..SignalScores::default()
                };
                if names_match(&query_name, &normalize_name(&hit.filename)) {
                    score = score.max(FILENAME_VECTOR_FLOOR);
                    signals.filename_match = Some(1.0);
                }
                SearchHit {
                    filename: hit.filename,
                    source_type: hit.source_type,
                    text: hit.text,
                    score: score.clamp(0.0, 1.0),
                    signals,
                }
            })
            .collect()
    }
}

/// Lowercases, trims, and drops a recognized document extension so queries
/// match filenames loosely.
fn normalize_name(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    for suffix in [".markdown", ".md", ".pdf"] {
        if let Some(stem) = lowered.strip_suffix(suffix) {
            return stem.to_string();
        }
    }
    lowered
}

/// Either side naming the other counts as a match. Empty names never match.
fn names_match(query_name: &str, doc_name: &str) -> bool {
    !query_name.is_empty()
        && !doc_name.is_empty()
        && (doc_name.contains(query_name) || query_name.contains(doc_name))
}

/// Drops hits below `floor`. When nothing survives, retries once at
/// `low_floor` rather than returning an empty set outright.
fn filter_by_relevance(hits: Vec<SearchHit>, floor: f64, low_floor: f64) -> Vec<SearchHit> {
    let (kept, rest): (Vec<_>, Vec<_>) = hits.into_iter().partition(|h| h.score >= floor);
    if !kept.is_empty() {
        return kept;
    }
    rest.into_iter().filter(|h| h.score >= low_floor).collect()
}

/// Merges hits so each filename appears at most once, keeping the
/// best-scoring hit's score and signals. Strong hits carry up to two
/// distinct excerpts joined by a blank line; weaker hits carry one.
fn dedup_by_source(hits: Vec<SearchHit>) -> Vec<SearchHit> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<SearchHit>> = HashMap::new();
    for hit in hits {
        if !groups.contains_key(&hit.filename) {
            order.push(hit.filename.clone());
        }
        groups.entry(hit.filename.clone()).or_default().push(hit);
    }

    let mut merged = Vec::with_capacity(order.len());
    for filename in &order {
        let Some(mut group) = groups.remove(filename) else {
            continue;
        };
        group.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        let Some(best_score) = group.first().map(|h| h.score) else {
            continue;
        };
        let limit = if best_score > STRONG_EXCERPT_SCORE { 2 } else { 1 };

        let mut texts: Vec<String> = Vec::new();
        for hit in &group {
            if texts.len() == limit {
                break;
            }
            if !texts.iter().any(|t| t == &hit.text) {
                texts.push(hit.text.clone());
            }
        }

        let mut best = group.swap_remove(0);
        best.text = texts.join("\n\n");
        merged.push(best);
    }
    merged
}

/// Orders by score descending, then by capped excerpt length descending.
/// The sort is stable, so full ties keep document arrival order.
fn rank(hits: &mut [SearchHit]) {
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| capped_chars(&b.text).cmp(&capped_chars(&a.text)))
    });
}

fn capped_chars(text: &str) -> usize {
    text.chars().take(LENGTH_TIE_CAP).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use crate::config::EmbeddingConfig;
    use crate::models::{DocumentMeta, IndexStats, SourceType};
    use crate::store::memory::MemoryIndex;
    use crate::store::{AddReceipt, IndexBackend};

    fn hashed_service() -> Arc<EmbeddingService> {
        let mut config = EmbeddingConfig::default();
        config.provider = "hashed".to_string();
        Arc::new(EmbeddingService::hashed(&config))
    }

    fn engine_over(index: Arc<MemoryIndex>, svc: Arc<EmbeddingService>) -> QueryEngine {
        QueryEngine::new(index, svc, RetrievalConfig::default())
    }

    async fn add_doc(index: &MemoryIndex, svc: &EmbeddingService, filename: &str, chunks: &[&str]) {
        let chunks: Vec<String> = chunks.iter().map(|s| s.to_string()).collect();
        let embeddings = svc.encode(&chunks).await;
        let meta = DocumentMeta {
            filename: filename.to_string(),
            source_type: SourceType::Markdown,
        };
        index
            .add(&format!("id-{}", filename), &chunks, &embeddings, &meta)
            .await
            .unwrap();
    }

    fn hit(filename: &str, score: f64, text: &str) -> SearchHit {
        SearchHit {
            filename: filename.to_string(),
            source_type: SourceType::Markdown,
            text: text.to_string(),
            score,
            signals: SignalScores::default(),
        }
    }

    /// Empty index whose nearest-neighbor lookup stalls far past any
    /// configured timeout before answering.
    struct StalledIndex;

    #[async_trait]
    impl VectorIndex for StalledIndex {
        async fn add(
            &self,
            _document_id: &str,
            _chunks: &[String],
            _embeddings: &[Vec<f32>],
            _meta: &DocumentMeta,
        ) -> Result<AddReceipt> {
            unreachable!()
        }

        async fn query(&self, _embedding: &[f32], _k: usize) -> Result<Vec<VectorHit>> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(vec![VectorHit {
                chunk_id: "late_0".to_string(),
                document_id: "late".to_string(),
                filename: "late.md".to_string(),
                source_type: SourceType::Markdown,
                text: "answered too late".to_string(),
                score: 1.0,
            }])
        }

        async fn contains_document(&self, _document_id: &str) -> Result<bool> {
            Ok(false)
        }

        async fn list_documents(&self) -> Result<Vec<DocumentSummary>> {
            Ok(Vec::new())
        }

        async fn document_content(&self, _filename: &str) -> Result<Option<String>> {
            Ok(None)
        }

        async fn stats(&self) -> Result<IndexStats> {
            Ok(IndexStats {
                total_chunk_count: 0,
                document_count: 0,
            })
        }

        async fn remove_document(&self, _document_id: &str) -> Result<u64> {
            Ok(0)
        }

        fn backend(&self) -> IndexBackend {
            IndexBackend::InMemory
        }
    }

    #[test]
    fn normalize_name_strips_extension_and_case() {
        assert_eq!(normalize_name("Setup_Guide.MD"), "setup_guide");
        assert_eq!(normalize_name("notes.markdown"), "notes");
        assert_eq!(normalize_name("  Report.pdf  "), "report");
        assert_eq!(normalize_name("plain"), "plain");
    }

    #[test]
    fn names_match_requires_substance() {
        assert!(names_match("setup", "setup_guide"));
        assert!(names_match("setup_guide extras", "setup_guide"));
        assert!(!names_match("", "setup_guide"));
        assert!(!names_match("setup", ""));
        assert!(!names_match("alpha", "beta"));
    }

    #[test]
    fn relevance_filter_retries_at_low_floor() {
        let kept = filter_by_relevance(vec![hit("a.md", 0.5, "x"), hit("b.md", 0.08, "y")], 0.1, 0.05);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].filename, "a.md");

        let retried = filter_by_relevance(
            vec![hit("a.md", 0.08, "x"), hit("b.md", 0.06, "y"), hit("c.md", 0.03, "z")],
            0.1,
            0.05,
        );
        let names: Vec<&str> = retried.iter().map(|h| h.filename.as_str()).collect();
        assert_eq!(names, vec!["a.md", "b.md"]);

        assert!(filter_by_relevance(vec![hit("a.md", 0.03, "x")], 0.1, 0.05).is_empty());
    }

    #[test]
    fn dedup_merges_two_excerpts_for_strong_hits() {
        let merged = dedup_by_source(vec![
            hit("a.md", 0.9, "one"),
            hit("a.md", 0.8, "two"),
            hit("a.md", 0.7, "three"),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].text, "one\n\ntwo");
        assert!((merged[0].score - 0.9).abs() < 1e-9);
    }

    #[test]
    fn dedup_skips_identical_excerpts() {
        let merged = dedup_by_source(vec![
            hit("a.md", 0.9, "same"),
            hit("a.md", 0.8, "same"),
            hit("a.md", 0.7, "third"),
        ]);
        assert_eq!(merged[0].text, "same\n\nthird");
    }

    #[test]
    fn dedup_keeps_one_excerpt_for_weak_hits() {
        let merged = dedup_by_source(vec![hit("a.md", 0.4, "one"), hit("a.md", 0.3, "two")]);
        assert_eq!(merged[0].text, "one");

        // The two-excerpt rule needs a score strictly above the threshold.
        let boundary = dedup_by_source(vec![hit("b.md", 0.5, "one"), hit("b.md", 0.4, "two")]);
        assert_eq!(boundary[0].text, "one");
    }

    #[test]
    fn dedup_preserves_first_appearance_order() {
        let merged = dedup_by_source(vec![hit("b.md", 0.4, "x"), hit("a.md", 0.9, "y")]);
        let names: Vec<&str> = merged.iter().map(|h| h.filename.as_str()).collect();
        assert_eq!(names, vec!["b.md", "a.md"]);
    }

    #[test]
    fn rank_breaks_score_ties_by_capped_length() {
        let long = "x".repeat(700);
        let longer_than_cap = "y".repeat(650);
        let mut hits = vec![
            hit("short.md", 0.5, "tiny"),
            hit("long.md", 0.5, &long),
            hit("top.md", 0.9, "any"),
        ];
        rank(&mut hits);
        let names: Vec<&str> = hits.iter().map(|h| h.filename.as_str()).collect();
        assert_eq!(names, vec!["top.md", "long.md", "short.md"]);

        // Both texts exceed the cap, so the tie stands and input order holds.
        let mut capped = vec![hit("first.md", 0.5, &longer_than_cap), hit("second.md", 0.5, &long)];
        rank(&mut capped);
        assert_eq!(capped[0].filename, "first.md");
    }

    #[tokio::test]
    async fn query_naming_a_file_returns_full_content() {
        let index = Arc::new(MemoryIndex::new());
        let svc = hashed_service();
        add_doc(
            &index,
            &svc,
            "setup_guide.md",
            &["Follow these steps to set everything up."],
        )
        .await;
        add_doc(&index, &svc, "other.md", &["Nothing to see here."]).await;
        let engine = engine_over(index, svc);

        for query in ["setup_guide", "Setup_Guide.md"] {
            let hits = engine.search(query, 5).await;
            assert_eq!(hits.len(), 1, "query {:?}", query);
            assert_eq!(hits[0].filename, "setup_guide.md");
            assert_eq!(hits[0].text, "Follow these steps to set everything up.");
            assert!((hits[0].score - FILENAME_MATCH_SCORE).abs() < 1e-9);
            assert_eq!(hits[0].signals.filename_match, Some(1.0));
        }
    }

    #[tokio::test]
    async fn cjk_filename_resolves() {
        let index = Arc::new(MemoryIndex::new());
        let svc = hashed_service();
        add_doc(&index, &svc, "安装指南.md", &["下载模型后运行安装脚本。"]).await;
        let engine = engine_over(index, svc);

        let hits = engine.search("安装指南", 5).await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].filename, "安装指南.md");
        assert!((hits[0].score - FILENAME_MATCH_SCORE).abs() < 1e-9);
    }

    #[tokio::test]
    async fn keyword_stage_blends_overlap_containment_and_synonyms() {
        let index = Arc::new(MemoryIndex::new());
        let svc = hashed_service();
        add_doc(
            &index,
            &svc,
            "ollama_guide.md",
            &["Ollama must be installed before running the model."],
        )
        .await;
        add_doc(&index, &svc, "unrelated.md", &["Totally different things entirely."]).await;
        let engine = engine_over(index, svc);

        let hits = engine.search("install ollama", 5).await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].filename, "ollama_guide.md");
        // overlap 0.5, containment 1.0, synonym 0.5 under the 0.4/0.4/0.2
        // weights.
        assert!((hits[0].score - 0.7).abs() < 1e-9);
        assert_eq!(hits[0].signals.containment, Some(1.0));
    }

    #[tokio::test]
    async fn searches_are_idempotent() {
        let index = Arc::new(MemoryIndex::new());
        let svc = hashed_service();
        add_doc(&index, &svc, "alpha.md", &["Ollama setup and usage notes."]).await;
        add_doc(&index, &svc, "beta.md", &["More notes about ollama internals."]).await;
        let engine = engine_over(index, svc);

        let first: Vec<(String, f64)> = engine
            .search("ollama notes", 5)
            .await
            .into_iter()
            .map(|h| (h.filename, h.score))
            .collect();
        let second: Vec<(String, f64)> = engine
            .search("ollama notes", 5)
            .await
            .into_iter()
            .map(|h| (h.filename, h.score))
            .collect();
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn vector_fallback_runs_when_lexical_channels_miss() {
        let index = Arc::new(MemoryIndex::new());
        let svc = hashed_service();
        add_doc(&index, &svc, "noise.md", &["zz1 zz2"]).await;
        let engine = engine_over(index, svc);

        // Every filler word is a stop word, so the lexical channels score
        // too low to keep the document, while the stripped query embeds to
        // exactly the indexed chunk.
        let query = "how do you the is are was were of to in on and or what why does can zz1 zz2";
        let hits = engine.search(query, 5).await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].filename, "noise.md");
        assert!(hits[0].signals.vector_similarity.unwrap() > 0.99);
        // 0.7 * similarity + 0.3 * (2 matching tokens out of 20).
        assert!((hits[0].score - 0.73).abs() < 1e-3);
    }

    #[tokio::test]
    async fn stalled_vector_lookup_is_abandoned_at_the_timeout() {
        let retrieval = RetrievalConfig {
            vector_timeout_secs: 1,
            ..RetrievalConfig::default()
        };
        let engine = QueryEngine::new(Arc::new(StalledIndex), hashed_service(), retrieval);

        // Nothing is listed, so the query falls through to the vector stage;
        // the bounded wait gives up long before the stalled lookup answers.
        let hits = engine.search("anything at all", 5).await;
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn fused_vector_score_floors_on_filename_match() {
        let engine = engine_over(Arc::new(MemoryIndex::new()), hashed_service());
        let raw = vec![VectorHit {
            chunk_id: "d_0".to_string(),
            document_id: "d".to_string(),
            filename: "setup_guide.md".to_string(),
            source_type: SourceType::Markdown,
            text: "body".to_string(),
            score: 0.1,
        }];
        let fused = engine.fuse_vector_hits("setup_guide", raw);
        assert!((fused[0].score - FILENAME_VECTOR_FLOOR).abs() < 1e-9);
        assert_eq!(fused[0].signals.filename_match, Some(1.0));
        assert_eq!(fused[0].signals.vector_similarity, Some(0.1));
    }

    #[tokio::test]
    async fn fused_vector_score_blends_similarity_and_overlap() {
        let engine = engine_over(Arc::new(MemoryIndex::new()), hashed_service());
        let raw = vec![VectorHit {
            chunk_id: "d_0".to_string(),
            document_id: "d".to_string(),
            filename: "x.md".to_string(),
            source_type: SourceType::Markdown,
            text: "alpha beta".to_string(),
            score: 0.5,
        }];
        let fused = engine.fuse_vector_hits("alpha beta", raw);
        assert!((fused[0].score - 0.65).abs() < 1e-9);
        assert!(fused[0].signals.filename_match.is_none());
    }

    #[tokio::test]
    async fn top_k_is_clamped_to_at_least_one() {
        let index = Arc::new(MemoryIndex::new());
        let svc = hashed_service();
        add_doc(&index, &svc, "ollama_one.md", &["ollama runs locally"]).await;
        add_doc(&index, &svc, "ollama_two.md", &["ollama needs memory"]).await;
        let engine = engine_over(index, svc);

        let hits = engine.search("ollama", 0).await;
        assert_eq!(hits.len(), 1);
        // Scores and capped lengths tie, so arrival order decides.
        assert_eq!(hits[0].filename, "ollama_one.md");
    }

    #[tokio::test]
    async fn blank_queries_and_empty_indexes_return_nothing() {
        let engine = engine_over(Arc::new(MemoryIndex::new()), hashed_service());
        assert!(engine.search("", 5).await.is_empty());
        assert!(engine.search("   ", 5).await.is_empty());
        assert!(engine.search("anything at all", 5).await.is_empty());
    }
}
