//! Tokenizing and overlap scoring.

use crate::sanitize::sanitize_free_text;
use regex_lite::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Longest normalized text considered for tokenizing.
pub const NORMALIZE_MAX_LEN: usize = 5000;

const SNIPPET_SANITIZE_LEN: usize = 190;
const SNIPPET_MAX_LEN: usize = 180;

static TOKEN_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9+#.]+").expect("token split pattern is valid"));

const STOP_WORDS: &[&str] = &[
    "and", "the", "with", "for", "from", "that", "this", "into", "your", "their", "have", "has",
    "will", "build", "built", "using", "across", "through", "about", "our", "you", "are", "job",
    "role",
];

pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token)
}

/// Lowercase and sanitize.
pub fn normalize(value: &str) -> String {
    sanitize_free_text(&value.to_lowercase(), NORMALIZE_MAX_LEN)
}

/// Split into lowercase tokens, dropping one-character tokens and stop words.
///
/// `+`, `#` and `.` stay inside tokens so `c++`, `c#` and `node.js` survive.
pub fn tokenize(value: &str) -> Vec<String> {
    let normalized = normalize(value);
    TOKEN_SPLIT
        .split(&normalized)
        .filter(|token| token.chars().count() > 1 && !is_stop_word(token))
        .map(str::to_string)
        .collect()
}

/// Fraction of `needle` tokens present in `haystack`.
pub fn overlap_score(needle: &[String], haystack: &[String]) -> f64 {
    if needle.is_empty() || haystack.is_empty() {
        return 0.0;
    }
    let haystack: HashSet<&str> = haystack.iter().map(String::as_str).collect();
    let hits = needle
        .iter()
        .filter(|token| haystack.contains(token.as_str()))
        .count();
    hits as f64 / needle.len() as f64
}

/// Bound a snippet to 180 chars, marking truncation with `...`.
pub fn compact_snippet(value: &str) -> String {
    let snippet = sanitize_free_text(value, SNIPPET_SANITIZE_LEN);
    if snippet.chars().count() <= SNIPPET_MAX_LEN {
        snippet
    } else {
        let head: String = snippet.chars().take(SNIPPET_MAX_LEN - 3).collect();
        format!("{head}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_drops_stop_words_and_short_tokens() {
        let tokens = tokenize("Build a dbt pipeline with the C# and C++ stack on Node.js");
        assert_eq!(tokens, vec!["dbt", "pipeline", "c#", "c++", "stack", "on", "node.js"]);
    }

    #[test]
    fn tokenize_splits_punctuation() {
        assert_eq!(tokenize("SQL/Python, (dbt)"), vec!["sql", "python", "dbt"]);
    }

    #[test]
    fn overlap_is_fraction_of_needle() {
        let needle = tokenize("dbt pipeline airflow");
        let haystack = tokenize("Batch dbt models feeding a nightly pipeline");
        assert!((overlap_score(&needle, &haystack) - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(overlap_score(&[], &haystack), 0.0);
    }

    #[test]
    fn snippet_is_bounded() {
        let long = "word ".repeat(100);
        let snippet = compact_snippet(&long);
        assert_eq!(snippet.chars().count(), 180);
        assert!(snippet.ends_with("..."));

        assert_eq!(compact_snippet("  short   text "), "short text");
    }
}
