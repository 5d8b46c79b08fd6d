//! # kbase
//!
//! A local document knowledge base with hybrid retrieval and grounded
//! answer synthesis.
//!
//! kbase ingests PDF and Markdown files, chunks and embeds them into a
//! durable vector index, and answers natural-language questions by fusing
//! filename, keyword, and semantic signals over the indexed documents. An
//! optional local generative endpoint turns ranked excerpts into a prose
//! answer; without one, a deterministic excerpt summary is returned.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌───────────┐
//! │  Ingestion  │──▶│   Pipeline   │──▶│  SQLite   │
//! │  PDF / MD   │   │ Chunk+Embed  │   │  vectors  │
//! └─────────────┘   └──────────────┘   └─────┬─────┘
//!                                            │
//!                       ┌────────────────────┤
//!                       ▼                    ▼
//!                 ┌───────────┐       ┌────────────┐
//!                 │  Hybrid   │──────▶│   Answer   │
//!                 │  search   │       │  synthesis │
//!                 └───────────┘       └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use kbase::config::Config;
//! use kbase::engine::KnowledgeEngine;
//! use kbase::models::SourceType;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let engine = KnowledgeEngine::open(Config::default()).await?;
//! engine.ingest("docs/setup_guide.md".as_ref(), SourceType::Markdown).await?;
//! let response = engine.query("how do I install the model?", 5).await;
//! println!("{}", response.answer);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`extract`] | PDF and Markdown text extraction |
//! | [`chunk`] | Paragraph-aware text chunking |
//! | [`tokenize`] | Mixed-script tokenization and keyword scoring |
//! | [`embedding`] | Embedding service with hashed fallback |
//! | [`store`] | Vector index backends (SQLite, in-memory) |
//! | [`ingest`] | Document ingestion pipeline |
//! | [`search`] | Multi-signal hybrid query engine |
//! | [`answer`] | Answer synthesis and fallback summaries |
//! | [`engine`] | Knowledge engine facade |

pub mod answer;
pub mod chunk;
pub mod config;
pub mod embedding;
pub mod engine;
pub mod extract;
pub mod ingest;
pub mod models;
pub mod search;
pub mod store;
pub mod tokenize;
