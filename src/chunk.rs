//! Paragraph-aware text chunking.
//!
//! Extracted text is cleaned, split on blank-line paragraph boundaries, and
//! greedily packed into chunks of at most `max_chars` characters. A paragraph
//! is never split mid-sentence: one that exceeds the budget on its own
//! becomes a single oversized chunk. Chunks shorter than `min_chars` are
//! dropped as noise.
//!
//! All limits are measured in characters, not bytes, so CJK text packs the
//! same way Latin text does.

/// Splits `text` into ordered chunks.
///
/// Within each paragraph, whitespace runs collapse to a single space and
/// characters outside the allow-list (letters, digits, common punctuation)
/// are removed. Paragraphs packed into the same chunk stay separated by a
/// blank line.
pub fn chunk_text(text: &str, max_chars: usize, min_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut buf = String::new();
    let mut buf_chars = 0usize;

    for paragraph in text.split("\n\n") {
        let para = clean_paragraph(paragraph);
        if para.is_empty() {
            continue;
        }
        let para_chars = para.chars().count();
        if buf_chars > 0 && buf_chars + 2 + para_chars > max_chars {
            chunks.push(std::mem::take(&mut buf));
            buf_chars = 0;
        }
        if buf_chars > 0 {
            buf.push_str("\n\n");
            buf_chars += 2;
        }
        buf.push_str(&para);
        buf_chars += para_chars;
    }
    if buf_chars > 0 {
        chunks.push(buf);
    }

    chunks.retain(|c| c.chars().count() >= min_chars);
    chunks
}

fn clean_paragraph(paragraph: &str) -> String {
    let mut out = String::with_capacity(paragraph.len());
    let mut pending_space = false;
    for ch in paragraph.chars() {
        if ch.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if !is_allowed(ch) {
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(ch);
    }
    out
}

fn is_allowed(ch: char) -> bool {
    ch.is_alphanumeric()
        || ch == '_'
        || matches!(
            ch,
            '.' | ',' | '!' | '?' | ';' | ':' | '(' | ')' | '-' | '\'' | '"'
        )
        || matches!(ch, '—' | '“' | '”' | '‘' | '’')
        || matches!(ch, '。' | '，' | '、' | '！' | '？' | '；' | '：' | '（' | '）')
}

/// Truncates to at most `max_chars` characters, appending an ellipsis when
/// text was cut. Safe on multi-byte boundaries.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    let mut it = text.chars();
    let head: String = it.by_ref().take(max_chars).collect();
    if it.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
