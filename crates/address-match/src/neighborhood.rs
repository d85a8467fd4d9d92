//! Neighborhood disambiguation
//!
//! Two addresses can share province, district, and street vocabulary while
//! sitting in different neighborhoods. The penalty computed here is subtracted
//! from both comparator paths; its largest tier is sized to pull a high
//! textual score below the duplicate threshold.

use crate::config::NeighborhoodPenaltyConfig;
use crate::normalization::fold_turkish;
use crate::record::AddressRecord;
use crate::similarity::char_similarity;

/// Words stripped from neighborhood names before comparison
const GENERIC_SUFFIXES: &[&str] = &[
    "mahallesi", "mahalle", "mah", "mh", "sokak", "sokagi", "sok", "sk",
];

#[derive(Debug, Clone, Default)]
pub struct NeighborhoodDisambiguator {
    tiers: NeighborhoodPenaltyConfig,
}

impl NeighborhoodDisambiguator {
    pub fn new(tiers: NeighborhoodPenaltyConfig) -> Self {
        Self { tiers }
    }

    /// Penalty for a pair of records, 0 when either neighborhood is unknown.
    pub fn penalty(&self, a: &AddressRecord, b: &AddressRecord) -> f64 {
        self.penalty_for_names(
            a.components().neighborhood.as_deref(),
            b.components().neighborhood.as_deref(),
        )
    }

    pub fn penalty_for_names(&self, a: Option<&str>, b: Option<&str>) -> f64 {
        let (Some(a), Some(b)) = (a, b) else {
            return 0.0;
        };

        let a = clean_name(a);
        let b = clean_name(b);
        if a.is_empty() || b.is_empty() || a == b {
            return 0.0;
        }

        let similarity = char_similarity(&a, &b);
        if similarity > self.tiers.near_similarity {
            self.tiers.near_penalty
        } else if similarity > self.tiers.partial_similarity {
            self.tiers.partial_penalty
        } else {
            self.tiers.distinct_penalty
        }
    }
}

/// Fold a neighborhood name and drop generic suffix words.
pub fn clean_name(name: &str) -> String {
    fold_turkish(name)
        .split(' ')
        .filter(|w| !w.is_empty() && !GENERIC_SUFFIXES.contains(w))
        .collect::<Vec<_>>()
        .join(" ")
}
