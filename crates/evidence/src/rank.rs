//! Token-overlap relevance ranking.

use crate::text::{overlap_score, tokenize};
use vouch_core::evidence::EvidenceItem;

/// Relevance of `item` to pre-tokenized `query_tokens`, in `[0, 1]`.
pub fn score_evidence(query_tokens: &[String], item: &EvidenceItem) -> f64 {
    overlap_score(query_tokens, &tokenize(&item.haystack()))
}

/// Rank `evidence` against `query`, best first, keeping at most `limit`.
///
/// Items sharing no token with the query are dropped. Ties keep their pool
/// order. A query with no usable tokens returns the first `limit` items.
pub fn rank_evidence(query: &str, evidence: &[EvidenceItem], limit: usize) -> Vec<EvidenceItem> {
    let query_tokens = tokenize(query);
    if query_tokens.is_empty() {
        return evidence.iter().take(limit).cloned().collect();
    }

    let mut scored: Vec<(f64, &EvidenceItem)> = evidence
        .iter()
        .map(|item| (score_evidence(&query_tokens, item), item))
        .filter(|(score, _)| *score > 0.0)
        .collect();

    // `sort_by` is stable, so equal scores keep pool order.
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    scored
        .into_iter()
        .take(limit)
        .map(|(_, item)| item.clone())
        .collect()
}
