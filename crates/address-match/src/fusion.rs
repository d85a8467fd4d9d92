//! Multi-signal similarity fusion
//!
//! Four signals, each in [0, 1], combined with configurable weights:
//!
//! - **Semantic**: word-set Jaccard, optionally blended with embedding cosine,
//!   boosted when both sides name the same major city
//! - **Geographic**: `exp(-d / 10 km)` between coordinates, or a categorical
//!   city comparison when either coordinate is missing
//! - **Textual**: fuzzy token-set ratio (or LCS ratio) plus an abbreviation bonus
//! - **Hierarchical**: weighted agreement of province ... apartment number
//!
//! A signal that fails is zeroed and tagged `Error`; the comparison itself
//! always returns a result.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::collaborators::EmbeddingBackend;
use crate::config::{MatcherConfig, TextualMetric};
use crate::error::SignalError;
use crate::gazetteer::Gazetteer;
use crate::normalization::fold_turkish;
use crate::record::{AddressRecord, Coordinate, HierarchyField};
use crate::similarity::{char_similarity, cosine, lcs_ratio, token_jaccard, token_set_ratio};

/// How a signal value was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "native", derive(uniffi::Enum))]
#[serde(rename_all = "snake_case")]
pub enum SignalStatus {
    /// Computed from the primary evidence
    Ok,
    /// A collaborator or field was missing; the documented fallback was used
    Fallback,
    /// The computation failed; the value is 0
    Error,
    /// Input was empty; nothing was computed
    Skipped,
}

/// One signal's value and provenance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "native", derive(uniffi::Record))]
pub struct SignalScore {
    pub value: f64,
    pub status: SignalStatus,
}

impl SignalScore {
    fn ok(value: f64) -> Self {
        Self {
            value,
            status: SignalStatus::Ok,
        }
    }

    fn fallback(value: f64) -> Self {
        Self {
            value,
            status: SignalStatus::Fallback,
        }
    }

    fn error() -> Self {
        Self {
            value: 0.0,
            status: SignalStatus::Error,
        }
    }

    fn skipped() -> Self {
        Self {
            value: 0.0,
            status: SignalStatus::Skipped,
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == SignalStatus::Error
    }
}

/// Per-signal breakdown of a comparison
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "native", derive(uniffi::Record))]
pub struct SignalBreakdown {
    pub semantic: SignalScore,
    pub geographic: SignalScore,
    pub textual: SignalScore,
    pub hierarchical: SignalScore,
}

impl SignalBreakdown {
    fn uniform(score: SignalScore) -> Self {
        Self {
            semantic: score,
            geographic: score,
            textual: score,
            hierarchical: score,
        }
    }

    pub fn has_error(&self) -> bool {
        [self.semantic, self.geographic, self.textual, self.hierarchical]
            .iter()
            .any(SignalScore::is_error)
    }
}

/// Result of comparing two addresses
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "native", derive(uniffi::Record))]
pub struct SimilarityResult {
    /// Fused score (0.0 to 1.0)
    pub overall: f64,
    pub breakdown: SignalBreakdown,
    /// `overall >= confidence_threshold`
    pub match_decision: bool,
    /// `min(overall + 0.1, 1.0)`
    pub confidence: f64,
}

impl SimilarityResult {
    /// Empty or unusable input.
    pub fn invalid() -> Self {
        Self {
            overall: 0.0,
            breakdown: SignalBreakdown::uniform(SignalScore::skipped()),
            match_decision: false,
            confidence: 0.0,
        }
    }

    fn identical() -> Self {
        Self {
            overall: 1.0,
            breakdown: SignalBreakdown::uniform(SignalScore::ok(1.0)),
            match_decision: true,
            confidence: 1.0,
        }
    }
}

const CONFIDENCE_MARGIN: f64 = 0.1;

/// Weighted four-signal comparator
#[derive(Clone)]
pub struct SimilarityFusionEngine {
    gazetteer: Arc<Gazetteer>,
    config: MatcherConfig,
    embeddings: Option<Arc<dyn EmbeddingBackend>>,
}

impl SimilarityFusionEngine {
    pub fn new(gazetteer: Arc<Gazetteer>, config: MatcherConfig) -> Self {
        Self {
            gazetteer,
            config,
            embeddings: None,
        }
    }

    pub fn with_embeddings(mut self, backend: Arc<dyn EmbeddingBackend>) -> Self {
        self.embeddings = Some(backend);
        self
    }

    /// Compare two prepared records. Pure; never fails.
    pub fn compare(&self, a: &AddressRecord, b: &AddressRecord) -> SimilarityResult {
        if a.is_blank() || b.is_blank() {
            return SimilarityResult::invalid();
        }
        if a.normalized() == b.normalized() {
            return SimilarityResult::identical();
        }

        let breakdown = SignalBreakdown {
            semantic: guard("semantic", || self.semantic(a, b)),
            geographic: guard("geographic", || self.geographic(a, b)),
            textual: guard("textual", || self.textual(a, b)),
            hierarchical: guard("hierarchical", || self.hierarchical(a, b)),
        };

        let weights = &self.config.fusion;
        let overall = (weights.semantic * breakdown.semantic.value
            + weights.geographic * breakdown.geographic.value
            + weights.textual * breakdown.textual.value
            + weights.hierarchical * breakdown.hierarchical.value)
            .clamp(0.0, 1.0);

        SimilarityResult {
            overall,
            breakdown,
            match_decision: overall >= self.config.confidence_threshold,
            confidence: (overall + CONFIDENCE_MARGIN).min(1.0),
        }
    }

    fn semantic(&self, a: &AddressRecord, b: &AddressRecord) -> Result<SignalScore, SignalError> {
        let overlap = token_jaccard(a.normalized(), b.normalized());

        let mut score = match &self.embeddings {
            Some(backend) => match (backend.embed(a.normalized()), backend.embed(b.normalized())) {
                (Ok(left), Ok(right)) => {
                    let blend = self.config.semantic.embedding_blend;
                    SignalScore::ok((1.0 - blend) * overlap + blend * cosine(&left, &right)?)
                }
                (Err(e), _) | (_, Err(e)) => {
                    tracing::debug!(error = %e, "Embedding backend failed, using word overlap");
                    SignalScore::fallback(overlap)
                }
            },
            None => SignalScore::ok(overlap),
        };

        if !self.major_cities(a).is_disjoint(&self.major_cities(b)) {
            score.value += self.config.semantic.major_city_boost;
        }
        score.value = score.value.min(1.0);
        Ok(score)
    }

    /// Major cities named anywhere in the record.
    fn major_cities<'r>(&self, record: &'r AddressRecord) -> BTreeSet<&'r str> {
        record
            .normalized()
            .split_whitespace()
            .chain(record.components().province.as_deref())
            .filter(|w| self.gazetteer.is_major_city(w))
            .collect()
    }

    fn geographic(&self, a: &AddressRecord, b: &AddressRecord) -> Result<SignalScore, SignalError> {
        let geo = &self.config.geographic;

        if let (Some(p), Some(q)) = (a.coordinate(), b.coordinate()) {
            let distance = ordered_distance(p, q);
            if !distance.is_finite() {
                return Err(SignalError::NonFinite("haversine distance"));
            }
            let value = if distance > geo.cutoff_km {
                0.0
            } else {
                (-distance / geo.decay_km).exp()
            };
            return Ok(SignalScore::ok(value));
        }

        // Extractors other than the built-in one may hand back unfolded names
        let value = match (
            a.components().province.as_deref().map(fold_turkish),
            b.components().province.as_deref().map(fold_turkish),
        ) {
            (Some(x), Some(y)) if x == y => geo.same_city,
            (Some(x), Some(y)) if self.gazetteer.are_neighbors(&x, &y) => geo.neighboring_city,
            (Some(_), Some(_)) => geo.different_city,
            _ => geo.unknown_city,
        };
        Ok(SignalScore::fallback(value))
    }

    fn textual(&self, a: &AddressRecord, b: &AddressRecord) -> Result<SignalScore, SignalError> {
        let base = match self.config.textual.metric {
            TextualMetric::TokenSet => token_set_ratio(a.normalized(), b.normalized()),
            TextualMetric::LongestCommonSubsequence => lcs_ratio(a.normalized(), b.normalized()),
        };

        let bonus = if self.uses_abbreviation_of(a, b) || self.uses_abbreviation_of(b, a) {
            self.config.textual.abbreviation_bonus
        } else {
            0.0
        };

        Ok(SignalScore::ok((base + bonus).min(1.0)))
    }

    /// `short_side` writes an abbreviation that `long_side` spells out in full.
    fn uses_abbreviation_of(&self, short_side: &AddressRecord, long_side: &AddressRecord) -> bool {
        let long_words: BTreeSet<&str> = long_side.normalized().split(' ').collect();
        short_side
            .abbreviated()
            .iter()
            .any(|full| long_words.contains(full.as_str()) && !long_side.abbreviates(full))
    }

    fn hierarchical(&self, a: &AddressRecord, b: &AddressRecord) -> Result<SignalScore, SignalError> {
        let weights = &self.config.hierarchy;
        let mut matched = 0.0;
        let mut considered = 0.0;

        for field in HierarchyField::ALL {
            let weight = weights.weight(field);
            match (a.components().get(field), b.components().get(field)) {
                (Some(x), Some(y)) => {
                    considered += weight;
                    matched += weight * field_similarity(field, x, y);
                }
                // Present on one side only: counts against the pair
                (Some(_), None) | (None, Some(_)) => considered += weight,
                (None, None) => {}
            }
        }

        if considered <= 0.0 {
            return Ok(SignalScore::fallback(0.0));
        }
        let value = matched / considered;
        if !value.is_finite() {
            return Err(SignalError::NonFinite("hierarchical"));
        }
        Ok(SignalScore::ok(value.clamp(0.0, 1.0)))
    }
}

impl fmt::Debug for SimilarityFusionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimilarityFusionEngine")
            .field("config", &self.config)
            .field("embeddings", &self.embeddings.is_some())
            .finish_non_exhaustive()
    }
}

/// Run one signal, zeroing it on failure.
fn guard<F>(signal: &'static str, compute: F) -> SignalScore
where
    F: FnOnce() -> Result<SignalScore, SignalError>,
{
    match compute() {
        Ok(score) if score.value.is_finite() => SignalScore {
            value: score.value.clamp(0.0, 1.0),
            status: score.status,
        },
        Ok(_) => {
            tracing::warn!(signal, "Signal produced a non-finite value");
            SignalScore::error()
        }
        Err(e) => {
            tracing::warn!(signal, error = %e, "Signal failed");
            SignalScore::error()
        }
    }
}

/// Distance computed in a fixed argument order so it is exactly symmetric.
fn ordered_distance(p: Coordinate, q: Coordinate) -> f64 {
    let p_first = (p.latitude, p.longitude)
        .partial_cmp(&(q.latitude, q.longitude))
        .is_some_and(|o| o.is_le());
    if p_first {
        p.distance_km(&q)
    } else {
        q.distance_km(&p)
    }
}

fn field_similarity(field: HierarchyField, a: &str, b: &str) -> f64 {
    let a = fold_turkish(a);
    let b = fold_turkish(b);
    if a == b {
        1.0
    } else if field.is_numeric() {
        0.0
    } else {
        char_similarity(&a, &b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollaboratorError;
    use crate::pipeline::RecordPipeline;
    use crate::record::AddressComponents;

    struct FixedEmbeddings;

    impl EmbeddingBackend for FixedEmbeddings {
        fn embed(&self, text: &str) -> Result<Vec<f32>, CollaboratorError> {
            Ok(vec![text.len() as f32, 1.0])
        }
    }

    struct OfflineEmbeddings;

    impl EmbeddingBackend for OfflineEmbeddings {
        fn embed(&self, _text: &str) -> Result<Vec<f32>, CollaboratorError> {
            Err(CollaboratorError::Unavailable("no model".to_string()))
        }
    }

    struct RaggedEmbeddings;

    impl EmbeddingBackend for RaggedEmbeddings {
        fn embed(&self, text: &str) -> Result<Vec<f32>, CollaboratorError> {
            Ok(vec![1.0; text.len() % 3 + 1])
        }
    }

    fn setup() -> (SimilarityFusionEngine, RecordPipeline) {
        let gazetteer = Arc::new(Gazetteer::turkey());
        (
            SimilarityFusionEngine::new(gazetteer.clone(), MatcherConfig::default()),
            RecordPipeline::new(gazetteer),
        )
    }

    fn record(province: Option<&str>, coordinate: Option<Coordinate>, text: &str) -> AddressRecord {
        AddressRecord::new(
            text,
            text,
            AddressComponents {
                province: province.map(str::to_string),
                ..Default::default()
            },
            coordinate,
        )
    }

    #[test]
    fn test_identical_records() {
        let (engine, pipeline) = setup();
        let a = pipeline.prepare("X");
        let result = engine.compare(&a, &a);
        assert_eq!(result.overall, 1.0);
        assert!(result.match_decision);
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_empty_input() {
        let (engine, pipeline) = setup();
        let result = engine.compare(&pipeline.prepare(""), &pipeline.prepare("anything"));
        assert_eq!(result.overall, 0.0);
        assert!(!result.match_decision);
        assert_eq!(result.breakdown.semantic.status, SignalStatus::Skipped);
    }

    #[test]
    fn test_fusion_weights() {
        let (engine, pipeline) = setup();
        let a = pipeline.prepare("İstanbul Kadıköy Moda Mahallesi");
        let b = pipeline.prepare("İstanbul Kadıköy Fenerbahçe Mahallesi");
        let r = engine.compare(&a, &b);
        let expected = 0.4 * r.breakdown.semantic.value
            + 0.3 * r.breakdown.geographic.value
            + 0.2 * r.breakdown.textual.value
            + 0.1 * r.breakdown.hierarchical.value;
        assert!((r.overall - expected).abs() < 1e-9);
        assert!((r.confidence - (r.overall + 0.1).min(1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_major_city_boost() {
        let (engine, _) = setup();
        let a = record(None, None, "istanbul moda");
        let b = record(None, None, "istanbul fenerbahce");
        let r = engine.compare(&a, &b);
        assert!((r.breakdown.semantic.value - (1.0 / 3.0 + 0.2)).abs() < 1e-9);

        let c = record(None, None, "bolu moda");
        let d = record(None, None, "bolu fenerbahce");
        let r = engine.compare(&c, &d);
        assert!((r.breakdown.semantic.value - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_geographic_from_coordinates() {
        let (engine, _) = setup();
        let a = record(None, Some(Coordinate::new(41.0, 29.0)), "a");
        let b = record(None, Some(Coordinate::new(41.0, 29.0)), "b");
        assert_eq!(engine.compare(&a, &b).breakdown.geographic.value, 1.0);

        let far = record(None, Some(Coordinate::new(39.9, 32.8)), "c");
        let r = engine.compare(&a, &far);
        assert_eq!(r.breakdown.geographic.value, 0.0);
        assert_eq!(r.breakdown.geographic.status, SignalStatus::Ok);
    }

    #[test]
    fn test_geographic_distance_decay() {
        let (engine, _) = setup();
        // about 11.1 km apart along a meridian
        let a = record(None, Some(Coordinate::new(41.0, 29.0)), "a");
        let b = record(None, Some(Coordinate::new(41.1, 29.0)), "b");
        let value = engine.compare(&a, &b).breakdown.geographic.value;
        assert!((value - (-11.119f64 / 10.0).exp()).abs() < 0.01, "got {}", value);
    }

    #[test]
    fn test_geographic_categorical_fallback() {
        let (engine, _) = setup();
        let istanbul = record(Some("istanbul"), None, "a");
        let istanbul2 = record(Some("istanbul"), None, "b");
        let kocaeli = record(Some("kocaeli"), None, "c");
        let ankara = record(Some("ankara"), None, "d");
        let unknown = record(None, None, "e");

        let geo = |x: &AddressRecord, y: &AddressRecord| engine.compare(x, y).breakdown.geographic;
        assert_eq!(geo(&istanbul, &istanbul2).value, 0.8);
        assert_eq!(geo(&istanbul, &kocaeli).value, 0.6);
        assert_eq!(geo(&istanbul, &ankara).value, 0.2);
        assert_eq!(geo(&istanbul, &unknown).value, 0.5);
        assert_eq!(geo(&istanbul, &unknown).status, SignalStatus::Fallback);
    }

    #[test]
    fn test_geographic_folds_extracted_provinces() {
        let (engine, _) = setup();
        let dotted = record(Some("İstanbul"), None, "a");
        let folded = record(Some("istanbul"), None, "b");
        let neighbor = record(Some("Kocaeli"), None, "c");

        let geo = |x: &AddressRecord, y: &AddressRecord| engine.compare(x, y).breakdown.geographic;
        assert_eq!(geo(&dotted, &folded).value, 0.8);
        assert_eq!(geo(&dotted, &neighbor).value, 0.6);
    }

    #[test]
    fn test_abbreviation_bonus() {
        let (engine, pipeline) = setup();
        let a = pipeline.prepare("Bağdat Cd. Kadıköy");
        let b = pipeline.prepare("Kadıköy Bağdat Caddesi 5");
        let r = engine.compare(&a, &b);
        // token sets are a subset, so the base ratio is already 1.0
        assert_eq!(r.breakdown.textual.value, 1.0);
        assert!(engine.uses_abbreviation_of(&a, &b));
        assert!(!engine.uses_abbreviation_of(&b, &a));
    }

    #[test]
    fn test_abbreviation_bonus_follows_record_not_raw_text() {
        let (engine, _) = setup();
        let short = record(None, None, "moda caddesi 5 kadikoy").with_abbreviated(["caddesi"]);
        let full = record(None, None, "kadikoy moda caddesi 7");
        let also_short = record(None, None, "kadikoy moda caddesi 7").with_abbreviated(["caddesi"]);

        assert!(engine.uses_abbreviation_of(&short, &full));
        assert!(!engine.uses_abbreviation_of(&short, &also_short));
        assert!(
            engine.compare(&short, &full).breakdown.textual.value
                > engine.compare(&short, &also_short).breakdown.textual.value
        );
    }

    #[test]
    fn test_hierarchical_one_sided_field_penalizes() {
        let (engine, _) = setup();
        let full = AddressRecord::new(
            "a",
            "a",
            AddressComponents {
                province: Some("istanbul".to_string()),
                district: Some("kadikoy".to_string()),
                ..Default::default()
            },
            None,
        );
        let partial = AddressRecord::new(
            "b",
            "b",
            AddressComponents {
                province: Some("istanbul".to_string()),
                ..Default::default()
            },
            None,
        );
        let r = engine.compare(&full, &partial);
        assert!((r.breakdown.hierarchical.value - 0.30 / 0.55).abs() < 1e-9);
    }

    #[test]
    fn test_hierarchical_no_fields_falls_back() {
        let (engine, _) = setup();
        let r = engine.compare(&record(None, None, "a"), &record(None, None, "b"));
        assert_eq!(r.breakdown.hierarchical.value, 0.0);
        assert_eq!(r.breakdown.hierarchical.status, SignalStatus::Fallback);
    }

    #[test]
    fn test_embedding_blend() {
        let (engine, _) = setup();
        let engine = engine.with_embeddings(Arc::new(FixedEmbeddings));
        let r = engine.compare(&record(None, None, "abc"), &record(None, None, "abc def"));
        assert_eq!(r.breakdown.semantic.status, SignalStatus::Ok);
        assert!(r.breakdown.semantic.value > 0.5 * 0.5);
    }

    #[test]
    fn test_unavailable_embeddings_fall_back() {
        let (engine, _) = setup();
        let engine = engine.with_embeddings(Arc::new(OfflineEmbeddings));
        let r = engine.compare(&record(None, None, "a b"), &record(None, None, "a c"));
        assert_eq!(r.breakdown.semantic.status, SignalStatus::Fallback);
        assert!((r.breakdown.semantic.value - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_failing_signal_is_tagged_not_fatal() {
        let (engine, _) = setup();
        let engine = engine.with_embeddings(Arc::new(RaggedEmbeddings));
        // lengths 1 and 2 give vectors of different sizes
        let r = engine.compare(&record(None, None, "a"), &record(None, None, "ab"));
        assert_eq!(r.breakdown.semantic.status, SignalStatus::Error);
        assert_eq!(r.breakdown.semantic.value, 0.0);
        assert!(r.breakdown.has_error());
        assert!(r.overall > 0.0);
    }

    #[test]
    fn test_symmetry() {
        let (engine, pipeline) = setup();
        let a = pipeline.prepare("Ankara Çankaya Kızılay Mah. Atatürk Blv. No: 10");
        let b = pipeline.prepare("Çankaya Ankara Atatürk Bulvarı 12 Daire 3");
        assert_eq!(engine.compare(&a, &b), engine.compare(&b, &a));
    }
}
