use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub answer: AnswerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory holding the on-disk index. Created on first open.
    #[serde(default = "default_index_dir")]
    pub index_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            index_dir: default_index_dir(),
        }
    }
}

fn default_index_dir() -> PathBuf {
    PathBuf::from("./knowledge_db")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    /// Chunks shorter than this are dropped as noise.
    #[serde(default = "default_min_chars")]
    pub min_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
            min_chars: default_min_chars(),
        }
    }
}

fn default_max_chars() -> usize {
    500
}
fn default_min_chars() -> usize {
    20
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    /// "semantic" loads a local model; "hashed" forces the deterministic
    /// fallback and never touches the network.
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            batch_size: default_batch_size(),
        }
    }
}

impl EmbeddingConfig {
    pub fn is_semantic(&self) -> bool {
        self.provider == "semantic"
    }
}

fn default_provider() -> String {
    "semantic".to_string()
}
fn default_model() -> String {
    "multilingual-e5-small".to_string()
}
fn default_batch_size() -> usize {
    64
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,
    #[serde(default = "default_max_top_k")]
    pub max_top_k: usize,
    /// Results below this score are dropped; if nothing survives, the
    /// filter retries once at `low_relevance_floor`.
    #[serde(default = "default_relevance_floor")]
    pub relevance_floor: f64,
    #[serde(default = "default_low_relevance_floor")]
    pub low_relevance_floor: f64,
    #[serde(default = "default_vector_weight")]
    pub vector_weight: f64,
    #[serde(default = "default_keyword_weight")]
    pub keyword_weight: f64,
    /// Nearest-neighbor lookups fetch `oversample * top_k` candidates.
    #[serde(default = "default_oversample")]
    pub oversample: usize,
    #[serde(default = "default_vector_timeout_secs")]
    pub vector_timeout_secs: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_top_k: default_top_k(),
            max_top_k: default_max_top_k(),
            relevance_floor: default_relevance_floor(),
            low_relevance_floor: default_low_relevance_floor(),
            vector_weight: default_vector_weight(),
            keyword_weight: default_keyword_weight(),
            oversample: default_oversample(),
            vector_timeout_secs: default_vector_timeout_secs(),
        }
    }
}

fn default_top_k() -> usize {
    5
}
fn default_max_top_k() -> usize {
    10
}
fn default_relevance_floor() -> f64 {
    0.1
}
fn default_low_relevance_floor() -> f64 {
    0.05
}
fn default_vector_weight() -> f64 {
    0.7
}
fn default_keyword_weight() -> f64 {
    0.3
}
fn default_oversample() -> usize {
    3
}
fn default_vector_timeout_secs() -> u64 {
    8
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnswerConfig {
    /// When false, the deterministic excerpt summary is always used and no
    /// generative endpoint is contacted.
    #[serde(default = "default_answer_enabled")]
    pub enabled: bool,
    #[serde(default = "default_answer_base_url")]
    pub base_url: String,
    #[serde(default = "default_answer_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_answer_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            enabled: default_answer_enabled(),
            base_url: default_answer_base_url(),
            model: default_answer_model(),
            temperature: default_temperature(),
            timeout_secs: default_answer_timeout_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
        }
    }
}

fn default_answer_enabled() -> bool {
    true
}
fn default_answer_base_url() -> String {
    "http://localhost:11434".to_string()
}
fn default_answer_model() -> String {
    "qwen2.5:7b".to_string()
}
fn default_temperature() -> f64 {
    0.7
}
fn default_answer_timeout_secs() -> u64 {
    30
}
fn default_probe_timeout_secs() -> u64 {
    5
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    // Validate chunking
    if config.chunking.max_chars == 0 {
        anyhow::bail!("chunking.max_chars must be > 0");
    }
    if config.chunking.min_chars >= config.chunking.max_chars {
        anyhow::bail!("chunking.min_chars must be < chunking.max_chars");
    }

    // Validate embedding
    match config.embedding.provider.as_str() {
        "semantic" | "hashed" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be semantic or hashed.",
            other
        ),
    }
    if config.embedding.batch_size == 0 {
        anyhow::bail!("embedding.batch_size must be > 0");
    }

    // Validate retrieval
    if config.retrieval.default_top_k < 1 {
        anyhow::bail!("retrieval.default_top_k must be >= 1");
    }
    if config.retrieval.default_top_k > config.retrieval.max_top_k {
        anyhow::bail!("retrieval.default_top_k must be <= retrieval.max_top_k");
    }
    if !(0.0..=1.0).contains(&config.retrieval.relevance_floor) {
        anyhow::bail!("retrieval.relevance_floor must be in [0.0, 1.0]");
    }
    if !(0.0..=1.0).contains(&config.retrieval.low_relevance_floor) {
        anyhow::bail!("retrieval.low_relevance_floor must be in [0.0, 1.0]");
    }
    if config.retrieval.low_relevance_floor > config.retrieval.relevance_floor {
        anyhow::bail!("retrieval.low_relevance_floor must be <= retrieval.relevance_floor");
    }
    if !(0.0..=1.0).contains(&config.retrieval.vector_weight) {
        anyhow::bail!("retrieval.vector_weight must be in [0.0, 1.0]");
    }
    if !(0.0..=1.0).contains(&config.retrieval.keyword_weight) {
        anyhow::bail!("retrieval.keyword_weight must be in [0.0, 1.0]");
    }
    if config.retrieval.oversample < 1 {
        anyhow::bail!("retrieval.oversample must be >= 1");
    }

    // Validate answer synthesis
    if config.answer.base_url.trim().is_empty() {
        anyhow::bail!("answer.base_url must not be empty");
    }
    if !(0.0..=2.0).contains(&config.answer.temperature) {
        anyhow::bail!("answer.temperature must be in [0.0, 2.0]");
    }

    Ok(())
}
