//! Cost model: a deterministic token-count estimate for structured values.
//!
//! The estimate approximates a BPE tokenizer applied to the compact JSON form:
//! - every structural character (`{ } [ ] , : "`) costs one token;
//! - string content is split into whitespace runs, punctuation and words,
//!   each priced by a length heuristic;
//! - bare numbers are priced by digit count.
//!
//! Large record arrays are priced by sampling head, middle and tail records
//! and extrapolating the per-record average.

use regex::Regex;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::LazyLock;

const STRUCTURAL: [char; 7] = ['{', '}', '[', ']', ',', ':', '"'];

/// Arrays up to this length are costed exactly.
pub const EXACT_ARRAY_LIMIT: usize = 10;
/// Upper bound on records inspected when sampling.
pub const SAMPLE_LIMIT: usize = 20;
const HEAD_SAMPLE: usize = 7;
const TAIL_SAMPLE: usize = 7;
const MIDDLE_HALF_WIDTH: usize = 3;

static RE_PIECES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?P<ws>\s+)|(?P<punct>[^\w\s]+)|(?P<word>\w+)").unwrap());

/// Estimate the token cost of any value. `null` costs nothing.
pub fn estimate_tokens(value: &Value) -> usize {
    if value.is_null() {
        return 0;
    }
    let text = serde_json::to_string(value).unwrap_or_default();
    structural_tokens(&text) + content_tokens(value)
}

/// Cost of a sequence of values serialized as one JSON array.
pub fn sequence_tokens(items: &[&Value]) -> usize {
    let text = serde_json::to_string(items).unwrap_or_default();
    structural_tokens(&text) + items.iter().map(|v| content_tokens(v)).sum::<usize>()
}

/// Estimate the cost of a record array, sampling when it is large.
pub fn estimate_array_tokens(rows: &[Value]) -> usize {
    estimate_sampled(rows.len(), |i| &rows[i])
}

/// Estimate the cost of the sub-array `rows[indices[0]], rows[indices[1]], ...`
/// without materializing it. `indices` must be in bounds.
pub fn estimate_selection_tokens(rows: &[Value], indices: &[usize]) -> usize {
    estimate_sampled(indices.len(), |i| &rows[indices[i]])
}

fn estimate_sampled<'a>(len: usize, at: impl Fn(usize) -> &'a Value) -> usize {
    if len == 0 {
        return 0;
    }
    if len <= EXACT_ARRAY_LIMIT {
        let all: Vec<&Value> = (0..len).map(&at).collect();
        return sequence_tokens(&all);
    }
    let sample: Vec<&Value> = sample_positions(len).into_iter().map(&at).collect();
    let avg = sequence_tokens(&sample) as f64 / sample.len() as f64;
    // brackets plus the separators between records
    let overhead = 2 + (len - 1);
    (avg * len as f64 + overhead as f64) as usize
}

/// Positions sampled from an array of `len` records: all of them up to
/// [`SAMPLE_LIMIT`], otherwise head, middle and tail windows.
pub fn sample_positions(len: usize) -> Vec<usize> {
    if len <= SAMPLE_LIMIT {
        return (0..len).collect();
    }
    let mut picked = BTreeSet::new();
    picked.extend(0..HEAD_SAMPLE.min(len));
    picked.extend(len.saturating_sub(TAIL_SAMPLE)..len);
    let mid = len / 2;
    picked.extend(mid.saturating_sub(MIDDLE_HALF_WIDTH)..(mid + MIDDLE_HALF_WIDTH).min(len));
    picked.into_iter().take(SAMPLE_LIMIT).collect()
}

fn structural_tokens(text: &str) -> usize {
    text.chars().filter(|c| STRUCTURAL.contains(c)).count()
}

fn content_tokens(value: &Value) -> usize {
    match value {
        Value::String(s) => string_tokens(s),
        Value::Number(n) => number_tokens(&n.to_string()),
        Value::Array(items) => items.iter().map(content_tokens).sum(),
        Value::Object(map) => map.iter().map(|(k, v)| string_tokens(k) + content_tokens(v)).sum(),
        Value::Bool(_) | Value::Null => 0,
    }
}

/// Cost of string content (quotes excluded). Non-empty strings cost at least 1.
pub fn string_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    let mut tokens = 0;
    if text.starts_with(' ') {
        tokens += 1;
    }
    if text.ends_with(' ') {
        tokens += 1;
    }
    for caps in RE_PIECES.captures_iter(text.trim()) {
        if caps.name("ws").is_some() {
            tokens += 1;
        } else if let Some(p) = caps.name("punct") {
            tokens += p.as_str().chars().count();
        } else if let Some(w) = caps.name("word") {
            tokens += word_tokens(w.as_str());
        }
    }
    tokens.max(1)
}

/// Cost of one word run by length and shape.
pub fn word_tokens(word: &str) -> usize {
    let len = word.chars().count();
    if len == 0 {
        return 0;
    }
    let inner_caps = word.chars().skip(1).any(char::is_uppercase);
    match len {
        1..=7 => {
            if inner_caps {
                (len / 4).max(1)
            } else {
                1
            }
        }
        8..=10 => {
            if is_plain_lowercase(word) {
                if len <= 8 { 1 } else { 2 }
            } else {
                (len / 4).max(1)
            }
        }
        _ => {
            if word.contains('_') {
                word.split('_').count()
            } else if inner_caps {
                (len / 5).max(2)
            } else {
                (len / 4).max(2)
            }
        }
    }
}

fn is_plain_lowercase(word: &str) -> bool {
    word.chars().all(char::is_alphabetic)
        && word.chars().any(char::is_lowercase)
        && !word.chars().any(char::is_uppercase)
}

/// Cost of a bare number given its JSON text.
pub fn number_tokens(repr: &str) -> usize {
    let repr = repr.trim();
    if repr.is_empty() {
        return 0;
    }
    if repr.len() <= 3 && repr.bytes().all(|b| b.is_ascii_digit()) {
        return 1;
    }
    if repr.contains('.') {
        let segments: usize = repr
            .split('.')
            .map(|seg| if seg.len() <= 3 { 1 } else { (seg.len() / 3).max(1) })
            .sum();
        // the decimal point itself
        segments + 1
    } else if repr.len() <= 4 {
        1
    } else {
        (repr.len() / 3).max(1)
    }
}
