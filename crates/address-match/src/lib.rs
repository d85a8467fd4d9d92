//! address-match: duplicate detection for free-text Turkish postal addresses
//!
//! This library provides:
//! - Turkish text folding and abbreviation expansion
//! - Multi-signal similarity fusion (semantic, geographic, textual, hierarchical)
//! - Neighborhood disambiguation to suppress false positives
//! - Cache-assisted duplicate clustering with batch statistics
//!
//! Parsing, geocoding, and embeddings are pluggable collaborators; built-in
//! fallbacks driven by the gazetteer are used when none are supplied.
//!
//! Bindings for Swift/Kotlin are exposed via UniFFI with the `native` feature.

pub mod cache;
pub mod cluster;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod fusion;
pub mod gazetteer;
pub mod matcher;
pub mod neighborhood;
pub mod normalization;
pub mod pipeline;
pub mod practical;
pub mod record;
pub mod similarity;
pub mod stats;
pub mod strategy;

pub use cache::PairwiseSimilarityCache;
pub use cluster::{
    connected_components, ClusterOutcome, DuplicateClusterer, SimilarityMatrix, StrategyWins,
};
pub use collaborators::{
    CentroidGeocoder, ComponentExtractor, EmbeddingBackend, Geocoder, MarkerExtractor, Normalizer,
    ParsedComponents, TurkishNormalizer,
};
pub use config::{
    FusionWeights, GeographicConfig, HierarchyWeights, MatcherConfig, NeighborhoodPenaltyConfig,
    PracticalWeights, SemanticConfig, TextualConfig, TextualMetric,
};
pub use error::{ClusterError, CollaboratorError, ConfigError, MatchError, Result, SignalError};
pub use fusion::{
    SignalBreakdown, SignalScore, SignalStatus, SimilarityFusionEngine, SimilarityResult,
};
pub use gazetteer::{Gazetteer, GazetteerData};
pub use matcher::{AddressMatcher, AddressMatcherBuilder, Deduplication, RankedCandidate};
#[cfg(feature = "native")]
pub use matcher::{
    compare_addresses, deduplicate_addresses, duplicate_statistics, find_duplicate_groups,
    DeduplicatedAddresses,
};
pub use neighborhood::NeighborhoodDisambiguator;
pub use normalization::{canonicalize, fold_turkish, Correction, NormalizedText};
pub use pipeline::RecordPipeline;
pub use practical::PracticalComparator;
pub use record::{AddressComponents, AddressRecord, Coordinate, HierarchyField};
pub use stats::DuplicateStatistics;
pub use strategy::{PairScore, PairScorer, Strategy};

// Setup UniFFI - use proc macros only, no UDL file
#[cfg(feature = "native")]
uniffi::setup_scaffolding!();

/// Returns the version of address-match
#[cfg(feature = "native")]
#[uniffi::export]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
