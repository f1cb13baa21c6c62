//! Repair of AI-analysis text.
//!
//! The analysis backend sometimes returns text with every character
//! separated by a space ("E l   m e s ..."), with real word gaps showing up
//! as runs of several spaces. This module detects that shape, glues the
//! characters back together, and splits loose paragraphs into sentences.
//!
//! The repair is lossy: text that merely *looks* spaced out will be
//! mangled, and sentence splitting can cut at abbreviations.

use regex::Regex;
use std::sync::LazyLock;

use crate::models::analysis::TextOrList;

/// Strings at or below this length are never treated as spaced out.
const SPACED_MIN_LEN: usize = 100;

/// Whitespace share above which a string is treated as spaced out.
const SPACED_RATIO: f64 = 0.30;

/// Sentence fragments shorter than this are dropped.
const MIN_SENTENCE_LEN: usize = 10;

static SPACE_BEFORE_PUNCT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+([.,;:!?])").expect("valid regex")
});

static AFTER_SENTENCE_PUNCT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([.!?]) *([^\s.!?,;:)])").expect("valid regex")
});

static LOWER_UPPER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\p{Ll})(\p{Lu})").expect("valid regex")
});

static LIST_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:^|\s)\d{1,2}[.)]\s+").expect("valid regex")
});

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// True when `text` has the per-character spacing pattern.
///
/// Long runs of one-letter words also match, so normalizing such text is
/// not idempotent: a second pass glues the letters together.
pub fn is_spaced_out(text: &str) -> bool {
    let total = text.chars().count();
    if total <= SPACED_MIN_LEN {
        return false;
    }
    let spaces = text.chars().filter(|c| c.is_whitespace()).count();
    spaces as f64 / total as f64 > SPACED_RATIO
}

/// Normalize one string into a single clean line.
pub fn normalize_text(text: &str) -> String {
    clean(text, false)
}

/// Normalize a string-or-list field into a list of entries.
///
/// A single string is split into sentences; a list keeps its entries,
/// each normalized, with empty ones dropped.
pub fn normalize_list(value: &TextOrList) -> Vec<String> {
    match value {
        TextOrList::Text(text) => split_sentences(text),
        TextOrList::List(items) => items
            .iter()
            .map(|item| normalize_text(item))
            .filter(|item| !item.is_empty())
            .collect(),
    }
}

/// Split a block of text into trimmed sentences.
///
/// Delimiters are newlines, `.`/`!`/`?` followed by whitespace, and
/// numbered-list markers such as `1.` or `2)`. Fragments shorter than ten
/// characters are discarded; if nothing survives, the whole normalized
/// text comes back as one entry.
pub fn split_sentences(text: &str) -> Vec<String> {
    let cleaned = clean(text, true);
    if cleaned.is_empty() {
        return Vec::new();
    }

    let marked = LIST_MARKER_RE.replace_all(&cleaned, "\n");

    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = marked.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\n' {
            push_fragment(&mut sentences, &mut current);
            continue;
        }
        current.push(c);
        let at_boundary = match chars.peek() {
            Some(next) => next.is_whitespace(),
            None => true,
        };
        if matches!(c, '.' | '!' | '?') && at_boundary {
            push_fragment(&mut sentences, &mut current);
        }
    }
    push_fragment(&mut sentences, &mut current);

    if sentences.is_empty() {
        let whole = normalize_text(text);
        if whole.is_empty() {
            return Vec::new();
        }
        return vec![whole];
    }
    sentences
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

fn push_fragment(sentences: &mut Vec<String>, current: &mut String) {
    let fragment = current.trim();
    if fragment.chars().count() >= MIN_SENTENCE_LEN {
        sentences.push(fragment.to_string());
    }
    current.clear();
}

/// Shared cleaning pass. With `keep_newlines`, whitespace runs that contain
/// a line break collapse to `\n` instead of a space.
fn clean(text: &str, keep_newlines: bool) -> String {
    if is_spaced_out(text) {
        let joined = join_spaced_chars(text);
        let collapsed = collapse_whitespace(&joined, keep_newlines);
        let punct = SPACE_BEFORE_PUNCT_RE.replace_all(&collapsed, "$1");
        let sentence = AFTER_SENTENCE_PUNCT_RE.replace_all(&punct, "$1 $2");
        let words = LOWER_UPPER_RE.replace_all(&sentence, "$1 $2");
        words.trim().to_string()
    } else {
        collapse_whitespace(text, keep_newlines).trim().to_string()
    }
}

/// Drop every single space that sits between two alphanumeric characters.
/// Longer whitespace runs are real word gaps and are left alone.
fn join_spaced_chars(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());

    for (i, &c) in chars.iter().enumerate() {
        if c == ' ' && i > 0 && i + 1 < chars.len() {
            let prev = chars[i - 1];
            let next = chars[i + 1];
            if prev.is_alphanumeric() && next.is_alphanumeric() {
                continue;
            }
        }
        out.push(c);
    }
    out
}

fn collapse_whitespace(text: &str, keep_newlines: bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending: Option<char> = None;

    for c in text.chars() {
        if c.is_whitespace() {
            let replacement = if keep_newlines && c == '\n' { '\n' } else { ' ' };
            pending = match pending {
                Some('\n') => Some('\n'),
                _ => Some(replacement),
            };
        } else {
            if let Some(ws) = pending.take() {
                out.push(ws);
            }
            out.push(c);
        }
    }
    if let Some(ws) = pending {
        out.push(ws);
    }
    out
}
