//! String and token similarity primitives
//!
//! All functions are symmetric and return values in [0, 1].

use std::collections::{BTreeSet, HashSet};

use strsim::normalized_levenshtein;

use crate::error::SignalError;

/// Character-level similarity of two strings.
pub fn char_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    normalized_levenshtein(a, b)
}

/// Jaccard similarity on whitespace-separated words
pub fn token_jaccard(a: &str, b: &str) -> f64 {
    let words_a: HashSet<&str> = a.split_whitespace().collect();
    let words_b: HashSet<&str> = b.split_whitespace().collect();

    let intersection = words_a.intersection(&words_b).count();
    let union = words_a.union(&words_b).count();

    if union == 0 {
        return 0.0;
    }

    intersection as f64 / union as f64
}

/// Weighted Jaccard: shared weight over union weight.
pub fn weighted_overlap<F>(a: &str, b: &str, weight: F) -> f64
where
    F: Fn(&str) -> f64,
{
    // Ordered sets keep the summation order identical for (a, b) and (b, a)
    let words_a: BTreeSet<&str> = a.split_whitespace().collect();
    let words_b: BTreeSet<&str> = b.split_whitespace().collect();

    let shared: f64 = words_a.intersection(&words_b).map(|w| weight(*w)).sum();
    let total: f64 = words_a.union(&words_b).map(|w| weight(*w)).sum();

    if total <= 0.0 {
        return 0.0;
    }

    (shared / total).clamp(0.0, 1.0)
}

/// Token-set ratio
///
/// Compares the sorted shared words against each side's sorted remainder, so
/// word order and repeated words do not matter. A side whose words are all
/// contained in the other scores 1.0.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let set_a: BTreeSet<&str> = a.split_whitespace().collect();
    let set_b: BTreeSet<&str> = b.split_whitespace().collect();

    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }

    let shared: Vec<&str> = set_a.intersection(&set_b).copied().collect();
    let only_a: Vec<&str> = set_a.difference(&set_b).copied().collect();
    let only_b: Vec<&str> = set_b.difference(&set_a).copied().collect();

    if !shared.is_empty() && (only_a.is_empty() || only_b.is_empty()) {
        return 1.0;
    }

    let base = shared.join(" ");
    let with_a = join_nonempty(&base, &only_a.join(" "));
    let with_b = join_nonempty(&base, &only_b.join(" "));

    [
        normalized_levenshtein(&base, &with_a),
        normalized_levenshtein(&base, &with_b),
        normalized_levenshtein(&with_a, &with_b),
    ]
    .into_iter()
    .fold(0.0, f64::max)
}

fn join_nonempty(left: &str, right: &str) -> String {
    match (left.is_empty(), right.is_empty()) {
        (true, _) => right.to_string(),
        (_, true) => left.to_string(),
        _ => format!("{} {}", left, right),
    }
}

/// Longest-common-subsequence ratio: `2 * lcs / (len_a + len_b)`.
pub fn lcs_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    // Two-row dynamic programme
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for ca in &a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    2.0 * prev[b.len()] as f64 / total as f64
}

/// Cosine similarity mapped to [0, 1] (negative similarity counts as 0).
pub fn cosine(a: &[f32], b: &[f32]) -> Result<f64, SignalError> {
    if a.len() != b.len() {
        return Err(SignalError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    let value = dot / (norm_a.sqrt() * norm_b.sqrt());
    if !value.is_finite() {
        return Err(SignalError::NonFinite("cosine"));
    }
    Ok(value.clamp(0.0, 1.0))
}
