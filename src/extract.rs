//! Text extraction for ingestible document formats.
//!
//! PDF bytes go through `pdf_extract`; Markdown is stripped of its markup
//! down to plain text while the original markup is retained alongside it.

use std::path::Path;
use thiserror::Error;

use crate::models::SourceType;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("document contains no extractable text")]
    Empty,
}

/// Extraction output: plain text plus, for markup formats, the original
/// source form.
#[derive(Debug, Clone)]
pub struct Extracted {
    pub text: String,
    pub raw_content: Option<String>,
}

/// Reads and extracts a document from disk.
///
/// Returns [`ExtractError::Empty`] when the file yields no usable text,
/// which keeps empty documents out of the index entirely.
pub fn extract_file(path: &Path, source_type: SourceType) -> Result<Extracted, ExtractError> {
    match source_type {
        SourceType::Pdf => {
            let bytes = std::fs::read(path).map_err(|e| ExtractError::Io {
                path: path.display().to_string(),
                source: e,
            })?;
            let text = extract_pdf(&bytes)?;
            finish(text, None)
        }
        SourceType::Markdown => {
            let markup = std::fs::read_to_string(path).map_err(|e| ExtractError::Io {
                path: path.display().to_string(),
                source: e,
            })?;
            let text = strip_markdown(&markup);
            finish(text, Some(markup))
        }
    }
}

fn finish(text: String, raw_content: Option<String>) -> Result<Extracted, ExtractError> {
    if text.trim().is_empty() {
        return Err(ExtractError::Empty);
    }
    Ok(Extracted { text, raw_content })
}

/// Extracts plain text from in-memory PDF bytes. Page texts arrive
/// concatenated with newline separators.
pub fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
}

/// Strips Markdown markup down to plain text.
///
/// Line-oriented: headings, list bullets, and blockquote markers lose their
/// prefixes; emphasis, inline code, and link syntax lose their markers; code
/// fence delimiters disappear while fenced content is kept. Blank lines
/// survive so paragraph boundaries remain visible to the chunker.
pub fn strip_markdown(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut in_fence = false;
    for line in markup.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            out.push_str(line);
            out.push('\n');
            continue;
        }
        out.push_str(&strip_inline(strip_line_prefix(trimmed)));
        out.push('\n');
    }
    out
}

fn strip_line_prefix(line: &str) -> &str {
    let after_hashes = line.trim_start_matches('#');
    if after_hashes.len() != line.len() {
        return after_hashes.trim_start();
    }
    if let Some(rest) = line.strip_prefix('>') {
        return rest.trim_start();
    }
    for bullet in ["- ", "* ", "+ "] {
        if let Some(rest) = line.strip_prefix(bullet) {
            return rest;
        }
    }
    // Ordered list markers like "1. " or "12. "
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        if let Some(rest) = line[digits..].strip_prefix(". ") {
            return rest;
        }
    }
    line
}

fn strip_inline(line: &str) -> String {
    strip_links(line)
        .chars()
        .filter(|c| !matches!(c, '*' | '`'))
        .collect()
}

/// Replaces `[label](url)` and `![alt](url)` spans with their label text.
fn strip_links(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    loop {
        let Some(open) = rest.find('[') else {
            out.push_str(rest);
            return out;
        };
        let head = if open > 0 && rest.as_bytes()[open - 1] == b'!' {
            &rest[..open - 1]
        } else {
            &rest[..open]
        };
        let after_open = &rest[open + 1..];
        let Some(close) = after_open.find(']') else {
            out.push_str(rest);
            return out;
        };
        let label = &after_open[..close];
        let after_close = &after_open[close + 1..];
        if let Some(in_paren) = after_close.strip_prefix('(') {
            if let Some(paren) = in_paren.find(')') {
                out.push_str(head);
                out.push_str(label);
                rest = &in_paren[paren + 1..];
                continue;
            }
        }
        // Not a link span; keep the bracket literally and move on.
        out.push_str(&rest[..open + 1]);
        rest = after_open;
    }
}
