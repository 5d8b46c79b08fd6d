//! Answer synthesis over retrieved excerpts.
//!
//! When generation is enabled the retrieved excerpts are handed to a local
//! Ollama server, which writes a synthesized Markdown answer with inline
//! source citations. When generation is disabled, unreachable, or fails, a
//! deterministic extractive summary is built from the excerpts instead, so
//! every question gets an answer.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde_json::json;
use tracing::{debug, warn};

use crate::chunk::truncate_chars;
use crate::config::AnswerConfig;
use crate::models::SearchHit;

/// Per-source excerpt budget inside the generation prompt.
const CONTEXT_STRONG_CHARS: usize = 400;
const CONTEXT_WEAK_CHARS: usize = 300;
/// Hits scoring above this earn the larger prompt budget.
const STRONG_SOURCE_SCORE: f64 = 0.7;
/// Excerpt budgets inside the extractive summary.
const FALLBACK_EXCERPT_CHARS: usize = 250;
const FALLBACK_SECTION_CHARS: usize = 500;
const FALLBACK_MAX_EXCERPTS: usize = 2;
/// Colon-terminated lines at most this long are promoted to bold.
const HEADING_PROMOTE_CHARS: usize = 40;
/// A reply containing any of these anywhere already has Markdown structure.
const STRUCTURE_MARKERS: [&str; 5] = ["#", "*", "`", "-", "1."];

/// Turns ranked retrieval hits into a Markdown answer.
pub struct AnswerSynthesizer {
    config: AnswerConfig,
    client: reqwest::Client,
}

impl AnswerSynthesizer {
    pub fn new(config: AnswerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build http client")?;
        Ok(Self { config, client })
    }

    /// Produces a Markdown answer for `question` from retrieval hits.
    ///
    /// Infallible: generation errors degrade to the extractive summary, an
    /// empty hit list to a fixed no-results answer.
    pub async fn answer(&self, question: &str, hits: &[SearchHit]) -> String {
        if hits.is_empty() {
            return no_results_answer(question);
        }
        if !self.config.enabled {
            return fallback_answer(question, hits);
        }
        match self.generate(question, &build_context(hits)).await {
            Ok(text) => polish_markdown(&text),
            Err(e) => {
                warn!(error = %e, "generation failed, using extractive summary");
                fallback_answer(question, hits)
            }
        }
    }

    /// Calls the Ollama generate endpoint once. No retries; the extractive
    /// fallback covers failures.
    async fn generate(&self, question: &str, context: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.config.base_url.trim_end_matches('/'));
        let body = json!({
            "model": self.config.model,
            "prompt": build_prompt(question, context),
            "stream": false,
            "options": { "temperature": self.config.temperature },
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("generate request failed")?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            bail!("generate returned {}: {}", status, detail);
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .context("generate response was not JSON")?;
        let answer = payload
            .get("response")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .context("generate response had no text")?;
        Ok(answer.to_string())
    }

    /// Checks whether the Ollama server answers its tags endpoint. Uses a
    /// short per-request timeout so health checks stay fast.
    pub async fn probe(&self) -> bool {
        let url = format!("{}/api/tags", self.config.base_url.trim_end_matches('/'));
        match self
            .client
            .get(&url)
            .timeout(Duration::from_secs(self.config.probe_timeout_secs))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(error = %e, "answer backend unreachable");
                false
            }
        }
    }
}

fn build_prompt(question: &str, context: &str) -> String {
    format!(
        "You are a documentation assistant. Answer the question using only the \
         context below.\n\
         - Synthesize across sources; merge duplicated passages instead of \
         repeating them.\n\
         - Cite the source filename inline, e.g. (setup_guide.md), for every claim.\n\
         - Format the answer as Markdown with short sections.\n\
         - If the context does not contain the answer, say so plainly.\n\n\
         Context:\n{}\n\nQuestion: {}\n\nAnswer:",
        context, question
    )
}

/// Renders hits into per-source context blocks for the prompt. Stronger
/// hits get a larger excerpt budget.
fn build_context(hits: &[SearchHit]) -> String {
    let sections: Vec<String> = hits
        .iter()
        .map(|hit| {
            let budget = if hit.score > STRONG_SOURCE_SCORE {
                CONTEXT_STRONG_CHARS
            } else {
                CONTEXT_WEAK_CHARS
            };
            format!(
                "[Source: {}]\n{}",
                hit.filename,
                truncate_chars(&hit.text, budget)
            )
        })
        .collect();
    sections.join("\n\n")
}

fn no_results_answer(question: &str) -> String {
    format!(
        "## No information found\n\n\
         Nothing in the knowledge base matched \"{}\".\n\n\
         Suggestions:\n\
         - Check the spelling of any document name in the question.\n\
         - Try broader or different keywords.\n\
         - Ingest the relevant document first, then ask again.\n",
        question
    )
}

/// Deterministic extractive summary: one section per source document with
/// its leading excerpts, closed by a coverage line.
fn fallback_answer(question: &str, hits: &[SearchHit]) -> String {
    let mut out = format!("## Summary for \"{}\"\n", question);
    let mut excerpt_count = 0usize;

    for hit in hits {
        out.push_str(&format!("\n### From {}\n\n", hit.filename));
        let mut section = String::new();
        for excerpt in hit.text.split("\n\n").take(FALLBACK_MAX_EXCERPTS) {
            let trimmed = truncate_chars(excerpt.trim(), FALLBACK_EXCERPT_CHARS);
            if trimmed.is_empty() {
                continue;
            }
            if !section.is_empty() {
                section.push_str("\n\n");
            }
            section.push_str(&trimmed);
            excerpt_count += 1;
        }
        out.push_str(&truncate_chars(&section, FALLBACK_SECTION_CHARS));
        out.push('\n');
    }

    out.push_str(&format!(
        "\n*{} excerpts from {} documents*\n",
        excerpt_count,
        hits.len()
    ));
    out
}

/// Light cleanup of generated Markdown. Trailing whitespace always goes;
/// a reply written as flat prose, with no structure marker anywhere, also
/// gets its short colon-terminated lines bolded. A reply the model already
/// structured keeps its formatting.
fn polish_markdown(text: &str) -> String {
    let structured = STRUCTURE_MARKERS.iter().any(|m| text.contains(m));
    let mut lines = Vec::new();
    for raw in text.lines() {
        let line = raw.trim_end();
        let trimmed = line.trim_start();
        let chars = trimmed.chars().count();
        let promote = !structured
            && (trimmed.ends_with(':') || trimmed.ends_with('：'))
            && chars > 1
            && chars <= HEADING_PROMOTE_CHARS;
        if promote {
            lines.push(format!("**{}**", trimmed));
        } else {
            lines.push(line.to_string());
        }
    }
    lines.join("\n").trim().to_string()
}
