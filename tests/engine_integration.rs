//! End-to-end tests over the engine facade: ingestion, retrieval, answer
//! assembly, and persistence across reopen. Everything runs offline: the
//! hashed embedding provider needs no model download and generation is
//! disabled, so answers come from the extractive summary path.

use std::path::{Path, PathBuf};

use kbase::config::Config;
use kbase::engine::KnowledgeEngine;
use kbase::extract::ExtractError;
use kbase::ingest::IngestError;
use kbase::models::SourceType;

fn test_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.storage.index_dir = root.join("index");
    config.embedding.provider = "hashed".to_string();
    config.answer.enabled = false;
    config
}

async fn open_engine(root: &Path) -> KnowledgeEngine {
    KnowledgeEngine::open(test_config(root)).await.unwrap()
}

fn write_doc(root: &Path, name: &str, body: &str) -> PathBuf {
    let path = root.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

#[tokio::test]
async fn ingest_reports_receipt_and_stats() {
    let dir = tempfile::tempdir().unwrap();
    let engine = open_engine(dir.path()).await;
    let path = write_doc(
        dir.path(),
        "setup_guide.md",
        "# Setup\n\nDownload the model binaries first.\n\nThen run the installer script to finish.",
    );

    let receipt = engine.ingest(&path, SourceType::Markdown).await.unwrap();
    assert_eq!(receipt.filename, "setup_guide.md");
    assert!(receipt.chunks_added >= 1);

    let stats = engine.stats().await.unwrap();
    assert_eq!(stats.document_count, 1);
    assert!(stats.total_chunk_count >= 1);
    assert_eq!(stats.per_document.len(), 1);
    assert_eq!(stats.per_document[0].filename, "setup_guide.md");
    assert!(stats.per_document[0].sample_excerpt.starts_with("Setup"));
}

#[tokio::test]
async fn duplicate_document_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let engine = open_engine(dir.path()).await;
    let path = write_doc(
        dir.path(),
        "notes.md",
        "Stable notes that do not change between the two attempts.",
    );

    engine.ingest(&path, SourceType::Markdown).await.unwrap();
    let second = engine.ingest(&path, SourceType::Markdown).await;
    assert!(matches!(second, Err(IngestError::Duplicate(_))));
    assert_eq!(engine.stats().await.unwrap().document_count, 1);
}

#[tokio::test]
async fn reingesting_a_changed_file_counts_one_document() {
    let dir = tempfile::tempdir().unwrap();
    let engine = open_engine(dir.path()).await;
    let path = write_doc(
        dir.path(),
        "guide.md",
        "Original introduction covering the initial release.",
    );
    let first = engine.ingest(&path, SourceType::Markdown).await.unwrap();

    // A rewritten head gives a new fingerprint, so the second pass is not a
    // duplicate and the index ends up holding both revisions.
    std::fs::write(&path, "Revised introduction covering the second release.").unwrap();
    let second = engine.ingest(&path, SourceType::Markdown).await.unwrap();
    assert_ne!(first.document_id, second.document_id);

    let stats = engine.stats().await.unwrap();
    assert_eq!(stats.document_count, 1);
    assert_eq!(stats.per_document.len(), 1);
    assert_eq!(stats.total_chunk_count, 2);

    let listing = engine.list_documents().await.unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].filename, "guide.md");
}

#[tokio::test]
async fn query_by_document_name_returns_full_content() {
    let dir = tempfile::tempdir().unwrap();
    let engine = open_engine(dir.path()).await;
    let path = write_doc(
        dir.path(),
        "setup_guide.md",
        "Download the model binaries first.\n\nThen run the installer script to finish.",
    );
    engine.ingest(&path, SourceType::Markdown).await.unwrap();

    let hits = engine.search("setup_guide", 5).await;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].filename, "setup_guide.md");
    assert!((hits[0].score - 0.95).abs() < 1e-9);
    assert!(hits[0].text.contains("Download the model binaries first."));
    assert!(hits[0].text.contains("installer script"));
    assert_eq!(hits[0].signals.filename_match, Some(1.0));
}

#[tokio::test]
async fn question_answers_cite_matching_document() {
    let dir = tempfile::tempdir().unwrap();
    let engine = open_engine(dir.path()).await;
    let guide = write_doc(
        dir.path(),
        "ollama_guide.md",
        "Ollama must be installed before running the model.",
    );
    let other = write_doc(
        dir.path(),
        "changelog.md",
        "Colors were adjusted in the dashboard footer.",
    );
    engine.ingest(&guide, SourceType::Markdown).await.unwrap();
    engine.ingest(&other, SourceType::Markdown).await.unwrap();

    let response = engine.query("install Ollama", 5).await;
    assert!(response.answer.starts_with("## Summary for"));
    assert!(response.answer.contains("### From ollama_guide.md"));
    assert!(response.answer.contains("Ollama must be installed"));
    assert_eq!(response.sources.len(), 1);
    assert_eq!(response.sources[0].source, "ollama_guide.md");
    assert!(response.sources[0].score > 0.5);
}

#[tokio::test]
async fn index_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_doc(
        dir.path(),
        "persistent.md",
        "This content should survive engine reopen cycles.",
    );
    {
        let engine = open_engine(dir.path()).await;
        engine.ingest(&path, SourceType::Markdown).await.unwrap();
    }

    let engine = open_engine(dir.path()).await;
    assert_eq!(engine.stats().await.unwrap().document_count, 1);

    let hits = engine.search("persistent", 5).await;
    assert_eq!(hits[0].filename, "persistent.md");

    // The duplicate fingerprint is remembered across processes too.
    let again = engine.ingest(&path, SourceType::Markdown).await;
    assert!(matches!(again, Err(IngestError::Duplicate(_))));
}

#[tokio::test]
async fn empty_index_yields_no_results_answer() {
    let dir = tempfile::tempdir().unwrap();
    let engine = open_engine(dir.path()).await;

    assert!(engine.search("anything", 5).await.is_empty());
    let response = engine.query("anything at all?", 5).await;
    assert!(response.answer.starts_with("## No information found"));
    assert!(response.sources.is_empty());
}

#[tokio::test]
async fn directory_ingestion_mixes_outcomes() {
    let dir = tempfile::tempdir().unwrap();
    let docs = dir.path().join("docs");
    std::fs::create_dir_all(docs.join("nested")).unwrap();
    write_doc(&docs, "a.md", "First markdown document with plenty of text.");
    write_doc(&docs, "b.txt", "Plain text is not a supported source type.");
    write_doc(
        &docs.join("nested"),
        "c.md",
        "Nested markdown document, also with plenty of text.",
    );

    let engine = open_engine(dir.path()).await;
    let report = engine.ingest_dir(&docs).await.unwrap();
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.entries.len(), 3);

    let failed: Vec<_> = report.entries.iter().filter(|e| e.error.is_some()).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].filename, "b.txt");
    assert!(failed[0].error.as_deref().unwrap().contains("unsupported"));

    assert_eq!(engine.stats().await.unwrap().document_count, 2);
}

#[tokio::test]
async fn remove_document_deletes_exactly_one_document() {
    let dir = tempfile::tempdir().unwrap();
    let engine = open_engine(dir.path()).await;
    let first = write_doc(dir.path(), "first.md", "A document that will be removed shortly.");
    let second = write_doc(dir.path(), "second.md", "Another document that stays behind.");
    let receipt = engine.ingest(&first, SourceType::Markdown).await.unwrap();
    engine.ingest(&second, SourceType::Markdown).await.unwrap();

    let removed = engine.remove_document(&receipt.document_id).await.unwrap();
    assert!(removed >= 1);

    let listing = engine.list_documents().await.unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].filename, "second.md");

    // A second removal finds nothing left to delete.
    assert_eq!(engine.remove_document(&receipt.document_id).await.unwrap(), 0);
}

#[tokio::test]
async fn chinese_queries_match_chinese_documents() {
    let dir = tempfile::tempdir().unwrap();
    let engine = open_engine(dir.path()).await;
    let guide = write_doc(
        dir.path(),
        "安装指南.md",
        "下载模型后，运行安装脚本。需要先安装 Ollama。",
    );
    let other = write_doc(
        dir.path(),
        "meeting_notes.md",
        "Weekly sync agenda items for the team.",
    );
    engine.ingest(&guide, SourceType::Markdown).await.unwrap();
    engine.ingest(&other, SourceType::Markdown).await.unwrap();

    let hits = engine.search("如何安装Ollama", 5).await;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].filename, "安装指南.md");
    assert!(hits[0].score > 0.3);
}

#[tokio::test]
async fn answer_citations_cap_at_three_sources() {
    let dir = tempfile::tempdir().unwrap();
    let engine = open_engine(dir.path()).await;
    let bodies = [
        ("guide_one.md", "Ollama handles the first topic in detail."),
        ("guide_two.md", "Ollama handles the second topic in detail."),
        ("guide_three.md", "Ollama handles the third topic in detail."),
        ("guide_four.md", "Ollama handles the fourth topic in detail."),
    ];
    for (name, body) in bodies {
        let path = write_doc(dir.path(), name, body);
        engine.ingest(&path, SourceType::Markdown).await.unwrap();
    }

    let response = engine.query("ollama", 5).await;
    assert_eq!(response.sources.len(), 3);
    // The summary itself still covers every retrieved document.
    for (name, _) in bodies {
        assert!(response.answer.contains(name), "answer missing {}", name);
    }
}

#[tokio::test]
async fn broken_pdf_reports_extract_error() {
    let dir = tempfile::tempdir().unwrap();
    let engine = open_engine(dir.path()).await;
    let path = dir.path().join("broken.pdf");
    std::fs::write(&path, b"%PDF-1.4 not really a pdf").unwrap();

    let result = engine.ingest(&path, SourceType::Pdf).await;
    assert!(matches!(
        result,
        Err(IngestError::Extract(ExtractError::Pdf(_)))
    ));
}
