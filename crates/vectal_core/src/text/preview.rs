//! Query-aware previews and sentence highlights for note content.
//!
//! # Responsibility
//! - Produce a markdown-stripped, whitespace-normalized preview.
//! - Center the preview on the first query match when one exists.
//! - Extract sentence-level highlights from raw content.
//!
//! # Invariants
//! - Previews work on stripped text; highlights work on raw text, so
//!   highlights keep the original markdown around a match.
//! - Lengths and offsets count Unicode scalar values, not bytes.
//! - Matching is case-insensitive substring matching.

use once_cell::sync::Lazy;
use regex::Regex;

pub const DEFAULT_PREVIEW_MAX_LENGTH: usize = 200;
pub const DEFAULT_MAX_HIGHLIGHTS: usize = 3;

const CONTEXT_BEFORE_MATCH: usize = 50;
const CONTEXT_AFTER_MATCH: usize = 150;
const ELLIPSIS: &str = "...";

static MARKDOWN_STRUCTURE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[#*`\[\]()]").expect("valid markdown structure regex"));
static SENTENCE_BREAK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]\s+").expect("valid sentence break regex"));

/// Builds a short plain-text preview of `content`.
///
/// With a non-empty `query` found in the stripped text, returns a window
/// from 50 chars before the match to 150 chars after it, with `...` marking
/// cut ends. Otherwise truncates to `max_length` chars plus `...`.
pub fn generate_preview(content: &str, query: &str, max_length: usize) -> String {
    let text = strip_markdown(content);
    let chars: Vec<char> = text.chars().collect();

    if !query.is_empty() {
        let needle: Vec<char> = query.chars().collect();
        if let Some(position) = find_ignore_case(&chars, &needle) {
            let start = position.saturating_sub(CONTEXT_BEFORE_MATCH);
            let end = (position + needle.len() + CONTEXT_AFTER_MATCH).min(chars.len());
            let mut preview = String::new();
            if start > 0 {
                preview.push_str(ELLIPSIS);
            }
            preview.extend(&chars[start..end]);
            if end < chars.len() {
                preview.push_str(ELLIPSIS);
            }
            return preview;
        }
    }

    if chars.len() > max_length {
        let mut preview: String = chars[..max_length].iter().collect();
        preview.push_str(ELLIPSIS);
        return preview;
    }
    text
}

/// Returns up to `max_highlights` sentences of raw `content` containing
/// `query`, trimmed, in document order.
///
/// Sentences are split on `.`, `!` or `?` followed by whitespace.
pub fn extract_highlights(content: &str, query: &str, max_highlights: usize) -> Vec<String> {
    let query_lower = query.to_lowercase();
    SENTENCE_BREAK_RE
        .split(content)
        .filter(|sentence| sentence.to_lowercase().contains(&query_lower))
        .take(max_highlights)
        .map(|sentence| sentence.trim().to_string())
        .collect()
}

/// Removes markdown structure characters and collapses whitespace.
pub fn strip_markdown(content: &str) -> String {
    let without_symbols = MARKDOWN_STRUCTURE_RE.replace_all(content, "");
    without_symbols
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Counts whitespace-separated words.
pub fn word_count(content: &str) -> usize {
    content.split_whitespace().count()
}

fn find_ignore_case(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    let haystack = fold_case(haystack);
    let needle = fold_case(needle);
    haystack
        .windows(needle.len())
        .position(|window| window == needle.as_slice())
}

// One char in, one char out, so match offsets stay valid for the source.
fn fold_case(chars: &[char]) -> Vec<char> {
    chars
        .iter()
        .map(|ch| {
            let mut lower = ch.to_lowercase();
            match (lower.next(), lower.next()) {
                (Some(single), None) => single,
                _ => *ch,
            }
        })
        .collect()
}
