//! Embedding service with a semantic backend and a deterministic fallback.
//!
//! The semantic backend runs a local fastembed model (multilingual E5 by
//! default) inside `spawn_blocking`. When the model cannot be loaded, or a
//! batch fails at runtime, the service degrades to hashed vectors: a
//! SHA-256 digest of the text seeds a SplitMix64 stream that fills a
//! unit-normalized vector. Hashed vectors are stable across runs and
//! platforms but carry no meaning, so similarity between them only confirms
//! exact-text identity. Degradation is logged once per cause and never
//! surfaces as an error to callers.
//!
//! Also provides the vector utilities shared with the index backends:
//! - [`cosine_similarity`]: similarity between two embedding vectors
//! - [`vec_to_blob`]: encode a `Vec<f32>` as little-endian bytes for BLOB storage
//! - [`blob_to_vec`]: decode a BLOB back into a `Vec<f32>`

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::config::EmbeddingConfig;

/// Dimensionality of hashed fallback vectors when the configured model is
/// unknown.
pub const FALLBACK_DIMS: usize = 384;

/// Which vector backend is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// A real model produces meaningful vectors.
    Semantic,
    /// Deterministic digest-seeded vectors; similarity is not semantic.
    Hashed,
}

enum Backend {
    #[cfg(feature = "local-embeddings")]
    Semantic(std::sync::Arc<std::sync::Mutex<fastembed::TextEmbedding>>),
    Hashed,
}

/// Shared embedding service. Construct once with [`EmbeddingService::init`]
/// and reuse; the model loads a single time.
pub struct EmbeddingService {
    backend: Backend,
    model_name: String,
    dims: usize,
    batch_size: usize,
}

impl EmbeddingService {
    /// Builds the service, preferring the semantic backend.
    ///
    /// Model load failures (missing files, unsupported platform, unknown
    /// model name) degrade to the hashed backend with a warning instead of
    /// failing construction.
    pub async fn init(config: &EmbeddingConfig) -> Self {
        #[cfg(feature = "local-embeddings")]
        if config.is_semantic() {
            let model_name = config.model.clone();
            let loaded =
                tokio::task::spawn_blocking(move || load_fastembed_model(&model_name)).await;
            match loaded {
                Ok(Ok(model)) => {
                    tracing::info!(model = %config.model, "semantic embedding backend ready");
                    return Self {
                        backend: Backend::Semantic(std::sync::Arc::new(std::sync::Mutex::new(
                            model,
                        ))),
                        model_name: config.model.clone(),
                        dims: model_dims(&config.model),
                        batch_size: config.batch_size,
                    };
                }
                Ok(Err(e)) => {
                    warn!(model = %config.model, error = %e, "semantic embedding backend unavailable, using hashed fallback vectors");
                }
                Err(e) => {
                    warn!(error = %e, "embedding model load task failed, using hashed fallback vectors");
                }
            }
        }
        #[cfg(not(feature = "local-embeddings"))]
        if config.is_semantic() {
            warn!("built without local-embeddings, using hashed fallback vectors");
        }
        Self::hashed(config)
    }

    /// Builds the hashed-only service. Never touches the network.
    pub fn hashed(config: &EmbeddingConfig) -> Self {
        Self {
            backend: Backend::Hashed,
            model_name: config.model.clone(),
            dims: model_dims(&config.model),
            batch_size: config.batch_size,
        }
    }

    pub fn backend(&self) -> EmbeddingBackend {
        match self.backend {
            #[cfg(feature = "local-embeddings")]
            Backend::Semantic(_) => EmbeddingBackend::Semantic,
            Backend::Hashed => EmbeddingBackend::Hashed,
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Embeds a batch of texts, one vector per input in input order.
    ///
    /// Infallible: a semantic batch that errors degrades to hashed vectors
    /// for that call only.
    pub async fn encode(&self, texts: &[String]) -> Vec<Vec<f32>> {
        if texts.is_empty() {
            return Vec::new();
        }
        match &self.backend {
            #[cfg(feature = "local-embeddings")]
            Backend::Semantic(model) => {
                let model = std::sync::Arc::clone(model);
                let batch_size = self.batch_size;
                let owned = texts.to_vec();
                let outcome = tokio::task::spawn_blocking(move || {
                    let mut guard = model
                        .lock()
                        .map_err(|_| anyhow::anyhow!("embedding model lock poisoned"))?;
                    guard
                        .embed(owned, Some(batch_size))
                        .map_err(|e| anyhow::anyhow!("semantic embedding failed: {}", e))
                })
                .await;
                match outcome {
                    Ok(Ok(vectors)) => return vectors,
                    Ok(Err(e)) => {
                        warn!(error = %e, "falling back to hashed vectors for this batch")
                    }
                    Err(e) => {
                        warn!(error = %e, "embedding task failed, using hashed vectors for this batch")
                    }
                }
            }
            Backend::Hashed => {}
        }
        texts
            .iter()
            .map(|t| hashed_embedding(t, self.dims))
            .collect()
    }

    /// Embeds a single query text.
    pub async fn encode_one(&self, text: &str) -> Vec<f32> {
        let texts = [text.to_string()];
        self.encode(&texts)
            .await
            .into_iter()
            .next()
            .unwrap_or_else(|| hashed_embedding(text, self.dims))
    }
}

#[cfg(feature = "local-embeddings")]
fn load_fastembed_model(name: &str) -> anyhow::Result<fastembed::TextEmbedding> {
    let model = match name {
        "all-minilm-l6-v2" => fastembed::EmbeddingModel::AllMiniLML6V2,
        "bge-small-en-v1.5" => fastembed::EmbeddingModel::BGESmallENV15,
        "bge-base-en-v1.5" => fastembed::EmbeddingModel::BGEBaseENV15,
        "multilingual-e5-small" => fastembed::EmbeddingModel::MultilingualE5Small,
        "multilingual-e5-base" => fastembed::EmbeddingModel::MultilingualE5Base,
        "multilingual-e5-large" => fastembed::EmbeddingModel::MultilingualE5Large,
        other => anyhow::bail!(
            "Unknown embedding model: '{}'. Supported models: \
             all-minilm-l6-v2, bge-small-en-v1.5, bge-base-en-v1.5, \
             multilingual-e5-small, multilingual-e5-base, multilingual-e5-large",
            other
        ),
    };
    fastembed::TextEmbedding::try_new(
        fastembed::InitOptions::new(model).with_show_download_progress(true),
    )
    .map_err(|e| anyhow::anyhow!("Failed to initialize local embedding model: {}", e))
}

fn model_dims(name: &str) -> usize {
    match name {
        "all-minilm-l6-v2" => 384,
        "bge-small-en-v1.5" => 384,
        "bge-base-en-v1.5" => 768,
        "multilingual-e5-small" => 384,
        "multilingual-e5-base" => 768,
        "multilingual-e5-large" => 1024,
        _ => FALLBACK_DIMS,
    }
}

/// Deterministic non-semantic embedding.
///
/// The first eight bytes of `SHA-256(text)` seed a SplitMix64 generator
/// whose outputs fill the vector with values in `[-1, 1]`; the result is
/// L2-normalized. Identical text always produces the identical vector.
pub fn hashed_embedding(text: &str, dims: usize) -> Vec<f32> {
    let digest = Sha256::digest(text.as_bytes());
    let mut seed = 0u64;
    for (i, byte) in digest.iter().take(8).enumerate() {
        seed |= u64::from(*byte) << (8 * i);
    }

    let mut vec = Vec::with_capacity(dims);
    for _ in 0..dims {
        let r = splitmix64(&mut seed);
        // Top 53 bits give a uniform value in [0, 1); shift to [-1, 1).
        let unit = (r >> 11) as f64 / (1u64 << 53) as f64;
        vec.push((unit * 2.0 - 1.0) as f32);
    }

    let norm = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for v in &mut vec {
            *v /= norm;
        }
    }
    vec
}

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Packs a vector into little-endian bytes for BLOB storage, 4 bytes per
/// dimension.
///
/// ```rust
/// use kbase::embedding::{blob_to_vec, vec_to_blob};
///
/// let v = vec![0.25f32, -1.5, 42.0];
/// let blob = vec_to_blob(&v);
/// assert_eq!(blob.len(), 12);
/// assert_eq!(blob_to_vec(&blob), v);
/// ```
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().copied().flat_map(f32::to_le_bytes).collect()
}

/// Reverse of [`vec_to_blob`]. Trailing bytes that do not fill a whole
/// `f32` are dropped.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    let mut vec = Vec::with_capacity(blob.len() / 4);
    for b in blob.chunks_exact(4) {
        vec.push(f32::from_le_bytes([b[0], b[1], b[2], b[3]]));
    }
    vec
}

/// Cosine similarity in `[-1.0, 1.0]`. Mismatched lengths, empty input,
/// and zero-norm vectors all yield `0.0`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (dot, norm_a, norm_b) = a
        .iter()
        .zip(b)
        .fold((0.0f32, 0.0f32, 0.0f32), |(dot, na, nb), (x, y)| {
            (dot + x * y, na + x * x, nb + y * y)
        });
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }
    dot / denom
}
