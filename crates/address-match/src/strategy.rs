//! Pair scoring: fused and practical comparators, best one wins
//!
//! The neighborhood penalty is applied to both comparators so neither path
//! can merge addresses from different neighborhoods of the same district.

use serde::{Deserialize, Serialize};

use crate::fusion::{SimilarityFusionEngine, SimilarityResult};
use crate::practical::PracticalComparator;
use crate::record::AddressRecord;

/// Which comparator produced a pair's effective score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "native", derive(uniffi::Enum))]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Practical comparator scored at least as high
    Basic,
    /// Fused engine (after penalty) scored higher
    Fused,
    /// Same normalized text
    Identical,
    /// At least one side was blank
    Invalid,
}

/// Effective similarity of one pair plus the evidence behind it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "native", derive(uniffi::Record))]
pub struct PairScore {
    /// `max(basic, fused - penalty)`
    pub value: f64,
    /// Practical comparator, penalty applied
    pub basic: f64,
    /// Fused engine, before penalty
    pub fused: f64,
    pub penalty: f64,
    pub winner: Strategy,
    /// A fused signal failed and was zeroed
    pub degraded: bool,
}

impl PairScore {
    fn invalid() -> Self {
        Self {
            value: 0.0,
            basic: 0.0,
            fused: 0.0,
            penalty: 0.0,
            winner: Strategy::Invalid,
            degraded: false,
        }
    }

    fn identical() -> Self {
        Self {
            value: 1.0,
            basic: 1.0,
            fused: 1.0,
            penalty: 0.0,
            winner: Strategy::Identical,
            degraded: false,
        }
    }
}

/// Combines both comparators into one effective pair score.
#[derive(Debug, Clone)]
pub struct PairScorer {
    engine: SimilarityFusionEngine,
    practical: PracticalComparator,
}

impl PairScorer {
    pub fn new(engine: SimilarityFusionEngine, practical: PracticalComparator) -> Self {
        Self { engine, practical }
    }

    pub fn score(&self, a: &AddressRecord, b: &AddressRecord) -> PairScore {
        if a.is_blank() || b.is_blank() {
            return PairScore::invalid();
        }
        if a.normalized() == b.normalized() {
            return PairScore::identical();
        }

        let penalty = self.practical.disambiguator().penalty(a, b);
        let basic = self.practical.penalized(a, b, penalty);
        let fused: SimilarityResult = self.engine.compare(a, b);
        let fused_penalized = (fused.overall - penalty).max(0.0);

        let (value, winner) = if fused_penalized > basic {
            (fused_penalized, Strategy::Fused)
        } else {
            (basic, Strategy::Basic)
        };

        PairScore {
            value,
            basic,
            fused: fused.overall,
            penalty,
            winner,
            degraded: fused.breakdown.has_error(),
        }
    }

    pub fn engine(&self) -> &SimilarityFusionEngine {
        &self.engine
    }

    pub fn practical(&self) -> &PracticalComparator {
        &self.practical
    }
}
