//! Mixed-script tokenization and keyword scoring.
//!
//! Queries and documents are lowercased and split into tokens two ways:
//! Latin/alphanumeric runs become whole-word tokens (minimum two
//! characters), while CJK runs emit every sliding n-gram of length 1 to 3
//! so that unsegmented Chinese text still matches. A small curated synonym
//! table bridges vocabulary gaps across both scripts.

use std::collections::HashSet;

/// Longest CJK n-gram emitted by [`tokenize`].
pub const CJK_NGRAM_MAX: usize = 3;

/// Minimum length of a non-CJK token.
const MIN_WORD_LEN: usize = 2;

/// Function words removed from queries before embedding. Mixed Chinese and
/// English because the knowledge base serves both.
const STOP_WORDS: &[&str] = &[
    "的", "了", "在", "是", "我", "有", "和", "就", "不", "人", "都", "一", "一个", "上", "也",
    "很", "到", "说", "要", "去", "你", "会", "着", "没有", "看", "好", "自己", "这", "the", "a",
    "an", "is", "are", "was", "were", "of", "to", "in", "on", "for", "and", "or", "how", "what",
    "why", "do", "does", "can", "i", "you",
];

/// Domain synonym groups. Membership in the same group scores a partial
/// match during keyword retrieval.
const SYNONYM_GROUPS: &[&[&str]] = &[
    &["install", "installation", "setup", "deploy", "安装", "部署"],
    &["config", "configuration", "settings", "配置", "设置"],
    &["guide", "manual", "tutorial", "handbook", "指南", "手册", "教程"],
    &["error", "failure", "bug", "issue", "错误", "故障", "报错"],
    &["usage", "use", "using", "使用", "用法"],
    &["start", "launch", "run", "启动", "运行"],
    &["model", "模型"],
    &["document", "doc", "file", "文档", "文件"],
    &["download", "下载"],
    &["churn", "attrition", "customer loss", "流失"],
    &["retention", "留存"],
    &["question", "query", "问题", "查询"],
];

/// Returns true for characters in the CJK Unified Ideographs block.
pub fn is_cjk(ch: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&ch)
}

/// Tokenizes text into a set of lowercase tokens.
pub fn tokenize(text: &str) -> HashSet<String> {
    let mut tokens = HashSet::new();
    let mut word = String::new();
    let mut cjk_run: Vec<char> = Vec::new();

    // Trailing space acts as a sentinel so both buffers flush at the end.
    for ch in text.to_lowercase().chars().chain(std::iter::once(' ')) {
        if is_cjk(ch) {
            flush_word(&mut word, &mut tokens);
            cjk_run.push(ch);
        } else if ch.is_alphanumeric() || ch == '_' {
            flush_cjk(&mut cjk_run, &mut tokens);
            word.push(ch);
        } else {
            flush_word(&mut word, &mut tokens);
            flush_cjk(&mut cjk_run, &mut tokens);
        }
    }
    tokens
}

fn flush_word(word: &mut String, tokens: &mut HashSet<String>) {
    if word.chars().count() >= MIN_WORD_LEN {
        tokens.insert(std::mem::take(word));
    } else {
        word.clear();
    }
}

fn flush_cjk(run: &mut Vec<char>, tokens: &mut HashSet<String>) {
    for start in 0..run.len() {
        for n in 1..=CJK_NGRAM_MAX.min(run.len() - start) {
            tokens.insert(run[start..start + n].iter().collect());
        }
    }
    run.clear();
}

/// Removes function words from a query before it is embedded.
///
/// Falls back to the original query when stripping would leave nothing,
/// so very short questions still embed.
pub fn strip_stop_words(query: &str) -> String {
    let mut cleaned = query.to_lowercase();
    // Longer CJK stop words first so "一个" is removed before "一" can
    // split it.
    let mut cjk_stops: Vec<&str> = STOP_WORDS
        .iter()
        .copied()
        .filter(|w| w.chars().any(is_cjk))
        .collect();
    cjk_stops.sort_by_key(|w| std::cmp::Reverse(w.chars().count()));
    for word in cjk_stops {
        cleaned = cleaned.replace(word, " ");
    }

    let kept: Vec<&str> = cleaned
        .split_whitespace()
        .filter(|w| !STOP_WORDS.contains(w) && w.chars().count() > 1)
        .collect();
    if kept.is_empty() {
        query.trim().to_string()
    } else {
        kept.join(" ")
    }
}

/// Keyword signals between one query and one document.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordScores {
    /// Fraction of query tokens present verbatim in the document's tokens.
    pub overlap: f64,
    /// Fraction of query tokens present as substrings of the document text.
    pub containment: f64,
    /// Fraction of query tokens matched directly (1.0 each) or through a
    /// synonym group (0.8 each).
    pub synonym: f64,
}

/// Scores a tokenized query against a tokenized document.
///
/// `doc_text_lower` must be the lowercased document text; substring checks
/// run against it directly.
pub fn keyword_scores(
    query_tokens: &HashSet<String>,
    doc_tokens: &HashSet<String>,
    doc_text_lower: &str,
) -> KeywordScores {
    if query_tokens.is_empty() {
        return KeywordScores::default();
    }

    let mut overlap_hits = 0u32;
    let mut containment_hits = 0u32;
    let mut direct_hits = 0u32;
    let mut synonym_hits = 0u32;

    for token in query_tokens {
        let direct = doc_tokens.contains(token);
        if direct {
            overlap_hits += 1;
            direct_hits += 1;
        } else if synonym_group(token)
            .map(|group| group_matches(group, token, doc_tokens, doc_text_lower))
            .unwrap_or(false)
        {
            synonym_hits += 1;
        }
        if doc_text_lower.contains(token.as_str()) {
            containment_hits += 1;
        }
    }

    let total = query_tokens.len() as f64;
    KeywordScores {
        overlap: f64::from(overlap_hits) / total,
        containment: f64::from(containment_hits) / total,
        synonym: (f64::from(direct_hits) + 0.8 * f64::from(synonym_hits)) / total,
    }
}

/// Fraction of query tokens found in the document token set.
pub fn keyword_overlap(query_tokens: &HashSet<String>, doc_tokens: &HashSet<String>) -> f64 {
    if query_tokens.is_empty() {
        return 0.0;
    }
    let hits = query_tokens.iter().filter(|t| doc_tokens.contains(*t)).count();
    hits as f64 / query_tokens.len() as f64
}

fn synonym_group(token: &str) -> Option<&'static [&'static str]> {
    SYNONYM_GROUPS
        .iter()
        .copied()
        .find(|group| group.contains(&token))
}

fn group_matches(
    group: &[&str],
    token: &str,
    doc_tokens: &HashSet<String>,
    doc_text_lower: &str,
) -> bool {
    group.iter().any(|member| {
        *member != token
            && (doc_tokens.contains(*member)
                || (member.contains(' ') && doc_text_lower.contains(member)))
    })
}
