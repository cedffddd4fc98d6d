//! Fuzzy re-ranking of already fetched search results.
//!
//! Scores are partial ratios on a 0-100 scale: the best normalized indel
//! similarity between the shorter string and any window of the longer one.

use std::cmp::Ordering;

use super::models::CommandWithMetadata;

/// Normalized indel similarity, `100 * 2 * lcs / (|a| + |b|)`.
pub fn ratio(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    100.0 * (2 * lcs_len(a, b)) as f64 / total as f64
}

/// Best [`ratio`] of the shorter string against every window of the longer
/// one, including windows that overhang either end.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let (short, long) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };
    let (m, n) = (short.len(), long.len());

    let full = (0..=n - m).map(|start| &long[start..start + m]);
    let head = (1..m).map(|len| &long[..len]);
    let tail = (1..m).map(|len| &long[n - len..]);

    let mut best = 0.0_f64;
    for window in full.chain(head).chain(tail) {
        best = best.max(ratio(short, window));
        if best >= 100.0 {
            break;
        }
    }
    best
}

/// Score of one candidate: the better of command text and description,
/// compared case-insensitively.
pub fn score(query: &str, candidate: &CommandWithMetadata) -> f64 {
    let query = query.to_lowercase();
    let command = partial_ratio(&query, &candidate.command.to_lowercase());
    let description = partial_ratio(&query, &candidate.description.to_lowercase());
    command.max(description)
}

/// Drops candidates scoring below `threshold`, orders the rest by score and
/// then use count (both descending) and keeps at most `limit`.
pub fn rerank(
    query: &str,
    candidates: Vec<CommandWithMetadata>,
    threshold: f64,
    limit: usize,
) -> Vec<CommandWithMetadata> {
    let mut scored: Vec<(f64, CommandWithMetadata)> = candidates
        .into_iter()
        .map(|c| (score(query, &c), c))
        .filter(|(s, _)| *s >= threshold)
        .collect();

    scored.sort_by(|(sa, a), (sb, b)| {
        sb.partial_cmp(sa)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.use_count.cmp(&a.use_count))
    });

    tracing::debug!(
        query,
        threshold,
        matched = scored.len(),
        "fuzzy re-rank complete"
    );

    scored.into_iter().take(limit).map(|(_, c)| c).collect()
}

/// Longest common subsequence length, two-row dynamic programming.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
