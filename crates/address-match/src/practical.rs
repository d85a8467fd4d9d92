//! Cheap heuristic comparator
//!
//! Blends word overlap, character similarity, and an overlap that weights
//! place names above generic address vocabulary. Always computed; on short or
//! heavily abbreviated input it often beats the fused score.

use std::sync::Arc;

use crate::config::PracticalWeights;
use crate::gazetteer::Gazetteer;
use crate::neighborhood::NeighborhoodDisambiguator;
use crate::normalization::canonicalize;
use crate::record::AddressRecord;
use crate::similarity::{char_similarity, token_jaccard, weighted_overlap};

#[derive(Debug, Clone)]
pub struct PracticalComparator {
    gazetteer: Arc<Gazetteer>,
    weights: PracticalWeights,
    disambiguator: NeighborhoodDisambiguator,
}

impl PracticalComparator {
    pub fn new(
        gazetteer: Arc<Gazetteer>,
        weights: PracticalWeights,
        disambiguator: NeighborhoodDisambiguator,
    ) -> Self {
        Self {
            gazetteer,
            weights,
            disambiguator,
        }
    }

    /// Similarity of two prepared records, neighborhood penalty applied.
    pub fn basic_similarity(&self, a: &AddressRecord, b: &AddressRecord) -> f64 {
        let penalty = self.disambiguator.penalty(a, b);
        self.penalized(a, b, penalty)
    }

    /// Similarity of two raw strings. No hierarchy is parsed, so no penalty.
    pub fn basic_text_similarity(&self, a: &str, b: &str) -> f64 {
        let a = canonicalize(a, &self.gazetteer).text;
        let b = canonicalize(b, &self.gazetteer).text;
        self.unpenalized(&a, &b)
    }

    pub(crate) fn penalized(&self, a: &AddressRecord, b: &AddressRecord, penalty: f64) -> f64 {
        (self.unpenalized(a.normalized(), b.normalized()) - penalty).max(0.0)
    }

    /// Blend over canonical text.
    fn unpenalized(&self, a: &str, b: &str) -> f64 {
        if a.trim().is_empty() || b.trim().is_empty() {
            return 0.0;
        }
        if a == b {
            return 1.0;
        }

        let words = token_jaccard(a, b);
        let chars = char_similarity(a, b);
        let important = weighted_overlap(a, b, |w| self.token_weight(w));

        let score = self.weights.word_jaccard * words
            + self.weights.char_sequence * chars
            + self.weights.important_tokens * important;
        score.clamp(0.0, 1.0)
    }

    fn token_weight(&self, word: &str) -> f64 {
        if self.gazetteer.is_place_name(word) {
            self.weights.place_name_weight
        } else if self.gazetteer.is_generic(word) {
            self.weights.generic_weight
        } else {
            1.0
        }
    }

    pub fn disambiguator(&self) -> &NeighborhoodDisambiguator {
        &self.disambiguator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::RecordPipeline;

    fn comparator() -> (PracticalComparator, RecordPipeline) {
        let gazetteer = Arc::new(Gazetteer::turkey());
        (
            PracticalComparator::new(
                gazetteer.clone(),
                PracticalWeights::default(),
                NeighborhoodDisambiguator::default(),
            ),
            RecordPipeline::new(gazetteer),
        )
    }

    #[test]
    fn test_abbreviated_variants_are_identical() {
        let (comparator, _) = comparator();
        let score = comparator.basic_text_similarity(
            "Ankara Çankaya Tunalı Hilmi Caddesi 25",
            "Ankara Çankaya Tunali Hilmi Cd. 25",
        );
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_empty_input_scores_zero() {
        let (comparator, _) = comparator();
        assert_eq!(comparator.basic_text_similarity("", "Ankara"), 0.0);
        assert_eq!(comparator.basic_text_similarity("  ", "  "), 0.0);
    }

    #[test]
    fn test_penalty_applied_for_different_neighborhoods() {
        let (comparator, pipeline) = comparator();
        let a = pipeline.prepare("İstanbul Kadıköy Moda Mahallesi");
        let b = pipeline.prepare("İstanbul Kadıköy Fenerbahçe Mahallesi");

        let raw = comparator.basic_text_similarity(a.raw(), b.raw());
        let basic = comparator.basic_similarity(&a, &b);
        assert!((raw - basic - 0.35).abs() < 1e-9, "raw {} basic {}", raw, basic);
        assert!(basic < 0.5);
    }

    #[test]
    fn test_place_names_outweigh_generic_words() {
        let (comparator, _) = comparator();
        let same_place = comparator.basic_text_similarity("Kadıköy Moda", "Kadıköy Sokak");
        let same_generic = comparator.basic_text_similarity("Kadıköy Sokak", "Bornova Sokak");
        assert!(same_place > same_generic);
    }

    #[test]
    fn test_symmetric() {
        let (comparator, _) = comparator();
        let a = "İzmir Konak Alsancak Mah. Kıbrıs Şehitleri Cd. 45";
        let b = "İzmir Konak Alsancak Kıbrıs Şehitleri Caddesi No:45";
        assert_eq!(
            comparator.basic_text_similarity(a, b),
            comparator.basic_text_similarity(b, a)
        );
    }
}
