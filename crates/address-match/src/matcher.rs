//! Public entry point
//!
//! `AddressMatcher` wires the gazetteer, collaborators, comparators, and the
//! clusterer together from one `MatcherConfig`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cache::PairwiseSimilarityCache;
use crate::cluster::{ClusterOutcome, DuplicateClusterer};
use crate::collaborators::{ComponentExtractor, EmbeddingBackend, Geocoder, Normalizer};
use crate::config::MatcherConfig;
use crate::error::Result;
use crate::fusion::{SimilarityFusionEngine, SimilarityResult};
use crate::gazetteer::Gazetteer;
use crate::neighborhood::NeighborhoodDisambiguator;
use crate::pipeline::RecordPipeline;
use crate::practical::PracticalComparator;
use crate::record::AddressRecord;
use crate::stats::DuplicateStatistics;
use crate::strategy::{PairScore, PairScorer};

/// Representatives and groups of a deduplicated batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deduplication {
    /// First member of each group, in group order
    pub representatives: Vec<String>,
    pub groups: Vec<Vec<usize>>,
}

/// A candidate address and its score against a query
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    /// Position in the candidate list
    pub index: usize,
    pub score: PairScore,
}

/// Builder for [`AddressMatcher`]
#[derive(Default)]
pub struct AddressMatcherBuilder {
    config: MatcherConfig,
    gazetteer: Option<Arc<Gazetteer>>,
    normalizer: Option<Arc<dyn Normalizer>>,
    extractor: Option<Arc<dyn ComponentExtractor>>,
    geocoder: Option<Arc<dyn Geocoder>>,
    embeddings: Option<Arc<dyn EmbeddingBackend>>,
}

impl AddressMatcherBuilder {
    pub fn config(mut self, config: MatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Reference data; defaults to [`Gazetteer::turkey`].
    pub fn gazetteer(mut self, gazetteer: Arc<Gazetteer>) -> Self {
        self.gazetteer = Some(gazetteer);
        self
    }

    pub fn normalizer(mut self, normalizer: Arc<dyn Normalizer>) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    pub fn extractor(mut self, extractor: Arc<dyn ComponentExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn geocoder(mut self, geocoder: Arc<dyn Geocoder>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    pub fn embeddings(mut self, backend: Arc<dyn EmbeddingBackend>) -> Self {
        self.embeddings = Some(backend);
        self
    }

    /// Validate the configuration and assemble the matcher.
    pub fn build(self) -> Result<AddressMatcher> {
        self.config.validate()?;

        let gazetteer = self
            .gazetteer
            .unwrap_or_else(|| Arc::new(Gazetteer::turkey()));

        let mut pipeline = RecordPipeline::new(gazetteer.clone());
        if let Some(normalizer) = self.normalizer {
            pipeline = pipeline.with_normalizer(normalizer);
        }
        if let Some(extractor) = self.extractor {
            pipeline = pipeline.with_extractor(extractor);
        }
        if let Some(geocoder) = self.geocoder {
            pipeline = pipeline.with_geocoder(geocoder);
        }

        let mut engine = SimilarityFusionEngine::new(gazetteer.clone(), self.config.clone());
        if let Some(backend) = self.embeddings {
            engine = engine.with_embeddings(backend);
        }
        let practical = PracticalComparator::new(
            gazetteer,
            self.config.practical.clone(),
            NeighborhoodDisambiguator::new(self.config.neighborhood.clone()),
        );

        let clusterer = DuplicateClusterer::new(
            pipeline,
            PairScorer::new(engine, practical),
            self.config.max_batch_size,
        );

        Ok(AddressMatcher {
            config: self.config,
            clusterer,
        })
    }
}

/// Address comparison and duplicate detection
#[derive(Debug, Clone)]
pub struct AddressMatcher {
    config: MatcherConfig,
    clusterer: DuplicateClusterer,
}

impl AddressMatcher {
    /// Default configuration and the built-in Turkish gazetteer.
    pub fn new() -> Self {
        let config = MatcherConfig::default();
        let gazetteer = Arc::new(Gazetteer::turkey());
        let engine = SimilarityFusionEngine::new(gazetteer.clone(), config.clone());
        let practical = PracticalComparator::new(
            gazetteer.clone(),
            config.practical.clone(),
            NeighborhoodDisambiguator::new(config.neighborhood.clone()),
        );
        let clusterer = DuplicateClusterer::new(
            RecordPipeline::new(gazetteer),
            PairScorer::new(engine, practical),
            config.max_batch_size,
        );
        Self { config, clusterer }
    }

    pub fn builder() -> AddressMatcherBuilder {
        AddressMatcherBuilder::default()
    }

    pub fn with_config(config: MatcherConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Normalize, parse, and locate one raw address.
    pub fn prepare(&self, raw: &str) -> AddressRecord {
        self.clusterer.pipeline().prepare(raw)
    }

    /// Fused comparison of two raw addresses. Never fails.
    pub fn compare_addresses(&self, a: &str, b: &str) -> SimilarityResult {
        self.compare_records(&self.prepare(a), &self.prepare(b))
    }

    pub fn compare_records(&self, a: &AddressRecord, b: &AddressRecord) -> SimilarityResult {
        self.clusterer.scorer().engine().compare(a, b)
    }

    /// Effective similarity the clusterer uses, with the winning strategy.
    pub fn pair_score(&self, a: &str, b: &str) -> PairScore {
        self.clusterer
            .scorer()
            .score(&self.prepare(a), &self.prepare(b))
    }

    /// Full clustering outcome at an explicit threshold.
    pub fn cluster<S: AsRef<str>>(&self, addresses: &[S], threshold: f64) -> Result<ClusterOutcome> {
        Ok(self.clusterer.cluster(addresses, threshold)?)
    }

    /// Cluster reusing a caller-owned cache.
    pub fn cluster_with_cache<S: AsRef<str>>(
        &self,
        addresses: &[S],
        threshold: f64,
        cache: &mut PairwiseSimilarityCache,
    ) -> Result<ClusterOutcome> {
        Ok(self.clusterer.cluster_with_cache(addresses, threshold, cache)?)
    }

    /// Cluster, polling `should_stop(completed_rows)` between matrix rows.
    pub fn cluster_with_cancel<S, F>(
        &self,
        addresses: &[S],
        threshold: f64,
        should_stop: F,
    ) -> Result<ClusterOutcome>
    where
        S: AsRef<str>,
        F: Fn(usize) -> bool,
    {
        Ok(self
            .clusterer
            .cluster_with_cancel(addresses, threshold, should_stop)?)
    }

    /// Groups of indices at the configured similarity threshold.
    pub fn find_duplicate_groups<S: AsRef<str>>(&self, addresses: &[S]) -> Result<Vec<Vec<usize>>> {
        Ok(self
            .cluster(addresses, self.config.similarity_threshold)?
            .groups)
    }

    pub fn get_duplicate_statistics<S: AsRef<str>>(
        &self,
        addresses: &[S],
    ) -> Result<DuplicateStatistics> {
        let outcome = self.cluster(addresses, self.config.similarity_threshold)?;
        Ok(DuplicateStatistics::from_outcome(&outcome))
    }

    /// Keep the first member of each duplicate group.
    pub fn deduplicate<S: AsRef<str>>(&self, addresses: &[S]) -> Result<Deduplication> {
        let groups = self.find_duplicate_groups(addresses)?;
        let representatives = groups
            .iter()
            .map(|group| addresses[group[0]].as_ref().to_string())
            .collect();
        Ok(Deduplication {
            representatives,
            groups,
        })
    }

    /// Candidates ordered by effective similarity to `query`, best first.
    ///
    /// Ties keep candidate order. At most `limit` results.
    pub fn rank_candidates<S: AsRef<str>>(
        &self,
        query: &str,
        candidates: &[S],
        limit: usize,
    ) -> Vec<RankedCandidate> {
        let query = self.prepare(query);
        let scorer = self.clusterer.scorer();

        let mut ranked: Vec<RankedCandidate> = candidates
            .iter()
            .enumerate()
            .map(|(index, candidate)| RankedCandidate {
                index,
                score: scorer.score(&query, &self.prepare(candidate.as_ref())),
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .value
                .total_cmp(&a.score.value)
                .then(a.index.cmp(&b.index))
        });
        ranked.truncate(limit);
        ranked
    }
}

impl Default for AddressMatcher {
    fn default() -> Self {
        Self::new()
    }
}

// ===== FFI Functions =====

#[cfg(feature = "native")]
mod ffi {
    use lazy_static::lazy_static;

    use super::AddressMatcher;
    use crate::error::MatchError;
    use crate::fusion::SimilarityResult;
    use crate::stats::DuplicateStatistics;

    lazy_static! {
        static ref DEFAULT_MATCHER: AddressMatcher = AddressMatcher::new();
    }

    /// Deduplicated batch with FFI-friendly indices
    #[derive(Debug, Clone, uniffi::Record)]
    pub struct DeduplicatedAddresses {
        pub representatives: Vec<String>,
        pub groups: Vec<Vec<u32>>,
    }

    fn to_u32(groups: Vec<Vec<usize>>) -> Vec<Vec<u32>> {
        groups
            .into_iter()
            .map(|g| g.into_iter().map(|i| i as u32).collect())
            .collect()
    }

    /// Compare two addresses with the default configuration
    #[uniffi::export]
    pub fn compare_addresses(a: String, b: String) -> SimilarityResult {
        DEFAULT_MATCHER.compare_addresses(&a, &b)
    }

    /// Group duplicate addresses with the default configuration
    #[uniffi::export]
    pub fn find_duplicate_groups(addresses: Vec<String>) -> Result<Vec<Vec<u32>>, MatchError> {
        Ok(to_u32(DEFAULT_MATCHER.find_duplicate_groups(&addresses)?))
    }

    #[uniffi::export]
    pub fn duplicate_statistics(addresses: Vec<String>) -> Result<DuplicateStatistics, MatchError> {
        DEFAULT_MATCHER.get_duplicate_statistics(&addresses)
    }

    #[uniffi::export]
    pub fn deduplicate_addresses(
        addresses: Vec<String>,
    ) -> Result<DeduplicatedAddresses, MatchError> {
        let dedup = DEFAULT_MATCHER.deduplicate(&addresses)?;
        Ok(DeduplicatedAddresses {
            representatives: dedup.representatives,
            groups: to_u32(dedup.groups),
        })
    }
}

#[cfg(feature = "native")]
pub use ffi::{
    compare_addresses, deduplicate_addresses, duplicate_statistics, find_duplicate_groups,
    DeduplicatedAddresses,
};
