//! Configuration for address-match
//!
//! Every weight and tier boundary used by the comparators lives here. The
//! defaults are the empirically tuned values; callers may override any of
//! them through JSON or TOML.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::record::HierarchyField;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Matcher-wide configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Weights of the four fused signals
    pub fusion: FusionWeights,
    /// Weights of the hierarchy levels in the hierarchical signal
    pub hierarchy: HierarchyWeights,
    pub semantic: SemanticConfig,
    pub geographic: GeographicConfig,
    pub textual: TextualConfig,
    /// Penalty tiers for differing neighborhoods
    pub neighborhood: NeighborhoodPenaltyConfig,
    /// Weights of the cheap heuristic comparator
    pub practical: PracticalWeights,
    /// Fused score at or above which `match_decision` is true
    pub confidence_threshold: f64,
    /// Edge threshold used by duplicate clustering
    pub similarity_threshold: f64,
    /// Largest batch one `cluster()` call accepts
    pub max_batch_size: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            fusion: FusionWeights::default(),
            hierarchy: HierarchyWeights::default(),
            semantic: SemanticConfig::default(),
            geographic: GeographicConfig::default(),
            textual: TextualConfig::default(),
            neighborhood: NeighborhoodPenaltyConfig::default(),
            practical: PracticalWeights::default(),
            confidence_threshold: 0.6,
            similarity_threshold: 0.8,
            max_batch_size: 5000,
        }
    }
}

/// Signal weights for the fused score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionWeights {
    pub semantic: f64,
    pub geographic: f64,
    pub textual: f64,
    pub hierarchical: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            semantic: 0.4,
            geographic: 0.3,
            textual: 0.2,
            hierarchical: 0.1,
        }
    }
}

impl FusionWeights {
    fn values(&self) -> [f64; 4] {
        [self.semantic, self.geographic, self.textual, self.hierarchical]
    }
}

/// Per-level weights for the hierarchical signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyWeights {
    pub province: f64,
    pub district: f64,
    pub neighborhood: f64,
    pub street: f64,
    pub building_no: f64,
    pub apartment_no: f64,
}

impl Default for HierarchyWeights {
    fn default() -> Self {
        Self {
            province: 0.30,
            district: 0.25,
            neighborhood: 0.20,
            street: 0.15,
            building_no: 0.05,
            apartment_no: 0.05,
        }
    }
}

impl HierarchyWeights {
    pub fn weight(&self, field: HierarchyField) -> f64 {
        match field {
            HierarchyField::Province => self.province,
            HierarchyField::District => self.district,
            HierarchyField::Neighborhood => self.neighborhood,
            HierarchyField::Street => self.street,
            HierarchyField::BuildingNo => self.building_no,
            HierarchyField::ApartmentNo => self.apartment_no,
        }
    }
}

/// Semantic signal settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticConfig {
    /// Added when both sides name the same major city
    pub major_city_boost: f64,
    /// Share of embedding cosine in the semantic signal when a backend exists
    pub embedding_blend: f64,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            major_city_boost: 0.2,
            embedding_blend: 0.5,
        }
    }
}

/// Geographic signal settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeographicConfig {
    /// Distance scale of `exp(-d / decay_km)`
    pub decay_km: f64,
    /// Beyond this distance the signal is 0
    pub cutoff_km: f64,
    pub same_city: f64,
    pub neighboring_city: f64,
    pub different_city: f64,
    /// Used when either city is unknown
    pub unknown_city: f64,
}

impl Default for GeographicConfig {
    fn default() -> Self {
        Self {
            decay_km: 10.0,
            cutoff_km: 50.0,
            same_city: 0.8,
            neighboring_city: 0.6,
            different_city: 0.2,
            unknown_city: 0.5,
        }
    }
}

/// Fuzzy metric behind the textual signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextualMetric {
    TokenSet,
    LongestCommonSubsequence,
}

/// Textual signal settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextualConfig {
    pub metric: TextualMetric,
    /// Bonus when one side abbreviates a word the other spells out
    pub abbreviation_bonus: f64,
}

impl Default for TextualConfig {
    fn default() -> Self {
        Self {
            metric: TextualMetric::TokenSet,
            abbreviation_bonus: 0.1,
        }
    }
}

/// Neighborhood penalty tiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeighborhoodPenaltyConfig {
    /// Name similarity above this gets `near_penalty`
    pub near_similarity: f64,
    pub near_penalty: f64,
    /// Name similarity above this gets `partial_penalty`
    pub partial_similarity: f64,
    pub partial_penalty: f64,
    /// Everything else
    pub distinct_penalty: f64,
}

impl Default for NeighborhoodPenaltyConfig {
    fn default() -> Self {
        Self {
            near_similarity: 0.8,
            near_penalty: 0.05,
            partial_similarity: 0.6,
            partial_penalty: 0.15,
            distinct_penalty: 0.35,
        }
    }
}

/// Weights of the heuristic comparator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PracticalWeights {
    pub word_jaccard: f64,
    pub char_sequence: f64,
    pub important_tokens: f64,
    /// Weight of province/district names in the important-token overlap
    pub place_name_weight: f64,
    /// Weight of generic vocabulary (mahallesi, sokak, ...)
    pub generic_weight: f64,
}

impl Default for PracticalWeights {
    fn default() -> Self {
        Self {
            word_jaccard: 0.4,
            char_sequence: 0.3,
            important_tokens: 0.3,
            place_name_weight: 2.0,
            generic_weight: 0.5,
        }
    }
}

impl MatcherConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_unit("confidence_threshold", self.confidence_threshold)?;
        check_unit("similarity_threshold", self.similarity_threshold)?;

        if self.max_batch_size == 0 {
            return Err(ConfigError::OutOfRange(
                "max_batch_size must be positive".to_string(),
            ));
        }

        let fusion = self.fusion.values();
        if fusion.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(ConfigError::InvalidWeights(
                "fusion weights must be non-negative".to_string(),
            ));
        }
        let sum: f64 = fusion.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::InvalidWeights(format!(
                "fusion weights must sum to 1.0, got {}",
                sum
            )));
        }

        if HierarchyField::ALL
            .iter()
            .map(|f| self.hierarchy.weight(*f))
            .any(|w| !w.is_finite() || w < 0.0)
        {
            return Err(ConfigError::InvalidWeights(
                "hierarchy weights must be non-negative".to_string(),
            ));
        }

        let practical = [
            self.practical.word_jaccard,
            self.practical.char_sequence,
            self.practical.important_tokens,
        ];
        if practical.iter().any(|w| !w.is_finite() || *w < 0.0)
            || (practical.iter().sum::<f64>() - 1.0).abs() > WEIGHT_SUM_TOLERANCE
        {
            return Err(ConfigError::InvalidWeights(
                "practical weights must be non-negative and sum to 1.0".to_string(),
            ));
        }

        check_unit("semantic.major_city_boost", self.semantic.major_city_boost)?;
        check_unit("semantic.embedding_blend", self.semantic.embedding_blend)?;
        check_unit("textual.abbreviation_bonus", self.textual.abbreviation_bonus)?;

        let geo = &self.geographic;
        if !(geo.decay_km > 0.0 && geo.cutoff_km > 0.0) {
            return Err(ConfigError::OutOfRange(
                "geographic distances must be positive".to_string(),
            ));
        }
        for (name, value) in [
            ("geographic.same_city", geo.same_city),
            ("geographic.neighboring_city", geo.neighboring_city),
            ("geographic.different_city", geo.different_city),
            ("geographic.unknown_city", geo.unknown_city),
        ] {
            check_unit(name, value)?;
        }

        let tiers = &self.neighborhood;
        for (name, value) in [
            ("neighborhood.near_similarity", tiers.near_similarity),
            ("neighborhood.near_penalty", tiers.near_penalty),
            ("neighborhood.partial_similarity", tiers.partial_similarity),
            ("neighborhood.partial_penalty", tiers.partial_penalty),
            ("neighborhood.distinct_penalty", tiers.distinct_penalty),
        ] {
            check_unit(name, value)?;
        }
        if tiers.partial_similarity > tiers.near_similarity
            || tiers.near_penalty > tiers.partial_penalty
            || tiers.partial_penalty > tiers.distinct_penalty
        {
            return Err(ConfigError::OutOfRange(
                "neighborhood tiers must grow stricter as names diverge".to_string(),
            ));
        }

        Ok(())
    }
}

fn check_unit(name: &str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::OutOfRange(format!(
            "{} must be between 0.0 and 1.0, got {}",
            name, value
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MatcherConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.fusion.semantic, 0.4);
        assert_eq!(config.hierarchy.weight(HierarchyField::Province), 0.30);
    }

    #[test]
    fn test_json_serialization() {
        let config = MatcherConfig::default();
        let json = config.to_json().unwrap();
        let parsed = MatcherConfig::from_json(&json).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_toml_partial_override() {
        let config = MatcherConfig::from_toml(
            r#"
            similarity_threshold = 0.75

            [textual]
            metric = "longest_common_subsequence"
            "#,
        )
        .unwrap();
        assert_eq!(config.similarity_threshold, 0.75);
        assert_eq!(config.textual.metric, TextualMetric::LongestCommonSubsequence);
        assert_eq!(config.textual.abbreviation_bonus, 0.1);
        assert_eq!(config.fusion, FusionWeights::default());
    }

    #[test]
    fn test_fusion_weights_must_sum_to_one() {
        let mut config = MatcherConfig::default();
        config.fusion.semantic = 0.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidWeights(_))
        ));
    }

    #[test]
    fn test_negative_hierarchy_weight() {
        let mut config = MatcherConfig::default();
        config.hierarchy.street = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_out_of_range_threshold() {
        let mut config = MatcherConfig::default();
        config.similarity_threshold = 1.5;
        assert!(matches!(config.validate(), Err(ConfigError::OutOfRange(_))));
    }

    #[test]
    fn test_inverted_neighborhood_tiers() {
        let mut config = MatcherConfig::default();
        config.neighborhood.near_penalty = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        assert!(matches!(
            MatcherConfig::from_json("{"),
            Err(ConfigError::Parse(_))
        ));
    }
}
