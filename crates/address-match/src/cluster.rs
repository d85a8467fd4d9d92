//! Duplicate clustering
//!
//! Builds the full N×N effective-similarity matrix for one batch, treats it
//! as a graph at the threshold, and returns its connected components.
//!
//! ## Complexity
//!
//! O(n²) comparisons and O(n²) memory. Batches above `max_batch_size` are
//! rejected; bucket larger corpora (e.g. by province) before calling.
//!
//! Grouping is transitive: two addresses below the threshold can share a
//! group through a third address similar to both.

use crate::cache::PairwiseSimilarityCache;
use crate::error::ClusterError;
use crate::pipeline::RecordPipeline;
use crate::record::AddressRecord;
use crate::strategy::{PairScore, PairScorer, Strategy};

/// Symmetric similarity matrix with a unit diagonal
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    size: usize,
    values: Vec<f64>,
}

impl SimilarityMatrix {
    fn new(size: usize) -> Self {
        let mut values = vec![0.0; size * size];
        for i in 0..size {
            values[i * size + i] = 1.0;
        }
        Self { size, values }
    }

    fn set(&mut self, i: usize, j: usize, value: f64) {
        self.values[i * self.size + j] = value;
        self.values[j * self.size + i] = value;
    }

    /// Panics when either index is out of bounds.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(i < self.size && j < self.size, "matrix index out of bounds");
        self.values[i * self.size + j]
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.size..(i + 1) * self.size]
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

/// How often each comparator decided a pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StrategyWins {
    pub basic: usize,
    pub fused: usize,
    pub identical: usize,
    pub invalid: usize,
}

impl StrategyWins {
    fn record(&mut self, strategy: Strategy) {
        match strategy {
            Strategy::Basic => self.basic += 1,
            Strategy::Fused => self.fused += 1,
            Strategy::Identical => self.identical += 1,
            Strategy::Invalid => self.invalid += 1,
        }
    }
}

/// Everything one `cluster()` call produced
#[derive(Debug, Clone)]
pub struct ClusterOutcome {
    /// Connected components, each sorted ascending, ordered by first member
    pub groups: Vec<Vec<usize>>,
    pub matrix: SimilarityMatrix,
    pub edge_count: usize,
    /// Indices of blank inputs, always singletons
    pub failed_items: Vec<usize>,
    /// Pairs where a fused signal failed and was zeroed
    pub failed_pairs: usize,
    pub strategy_wins: StrategyWins,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

impl ClusterOutcome {
    /// Groups with more than one member.
    pub fn duplicate_groups(&self) -> impl Iterator<Item = &Vec<usize>> {
        self.groups.iter().filter(|g| g.len() > 1)
    }
}

/// Partitions a batch of addresses into duplicate groups.
///
/// Holds no mutable state; each call owns its matrix and (unless supplied)
/// its cache.
#[derive(Debug, Clone)]
pub struct DuplicateClusterer {
    pipeline: RecordPipeline,
    scorer: PairScorer,
    max_batch_size: usize,
}

impl DuplicateClusterer {
    pub fn new(pipeline: RecordPipeline, scorer: PairScorer, max_batch_size: usize) -> Self {
        Self {
            pipeline,
            scorer,
            max_batch_size,
        }
    }

    pub fn cluster<S: AsRef<str>>(
        &self,
        addresses: &[S],
        threshold: f64,
    ) -> Result<ClusterOutcome, ClusterError> {
        let mut cache = PairwiseSimilarityCache::new();
        self.run(addresses, threshold, &mut cache, |_| false)
    }

    /// Cluster with a caller-owned cache, e.g. across overlapping batches.
    pub fn cluster_with_cache<S: AsRef<str>>(
        &self,
        addresses: &[S],
        threshold: f64,
        cache: &mut PairwiseSimilarityCache,
    ) -> Result<ClusterOutcome, ClusterError> {
        self.run(addresses, threshold, cache, |_| false)
    }

    /// Cluster, asking `should_stop(completed_rows)` before each matrix row.
    pub fn cluster_with_cancel<S, F>(
        &self,
        addresses: &[S],
        threshold: f64,
        should_stop: F,
    ) -> Result<ClusterOutcome, ClusterError>
    where
        S: AsRef<str>,
        F: Fn(usize) -> bool,
    {
        let mut cache = PairwiseSimilarityCache::new();
        self.run(addresses, threshold, &mut cache, should_stop)
    }

    fn run<S, F>(
        &self,
        addresses: &[S],
        threshold: f64,
        cache: &mut PairwiseSimilarityCache,
        should_stop: F,
    ) -> Result<ClusterOutcome, ClusterError>
    where
        S: AsRef<str>,
        F: Fn(usize) -> bool,
    {
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            return Err(ClusterError::InvalidThreshold(threshold));
        }
        if addresses.len() > self.max_batch_size {
            return Err(ClusterError::BatchTooLarge {
                size: addresses.len(),
                max: self.max_batch_size,
            });
        }

        let records = self.pipeline.prepare_all(addresses);
        self.cluster_records(&records, threshold, cache, should_stop)
    }

    /// Cluster already prepared records.
    pub fn cluster_records<F>(
        &self,
        records: &[AddressRecord],
        threshold: f64,
        cache: &mut PairwiseSimilarityCache,
        should_stop: F,
    ) -> Result<ClusterOutcome, ClusterError>
    where
        F: Fn(usize) -> bool,
    {
        let n = records.len();
        let hits_before = cache.hits();
        let misses_before = cache.misses();

        let mut matrix = SimilarityMatrix::new(n);
        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut wins = StrategyWins::default();
        let mut failed_pairs = 0;
        let mut edge_count = 0;

        for i in 0..n {
            if should_stop(i) {
                tracing::debug!(completed_rows = i, n, "Clustering cancelled");
                return Err(ClusterError::Cancelled { completed_rows: i });
            }

            for j in (i + 1)..n {
                let score: PairScore =
                    cache.get_or_compute(&records[i], &records[j], || {
                        self.scorer.score(&records[i], &records[j])
                    });

                tracing::trace!(
                    i,
                    j,
                    value = score.value,
                    winner = ?score.winner,
                    penalty = score.penalty,
                    "Scored pair"
                );

                matrix.set(i, j, score.value);
                wins.record(score.winner);
                if score.degraded {
                    failed_pairs += 1;
                }
                if score.winner != Strategy::Invalid && score.value >= threshold {
                    adjacency[i].push(j);
                    adjacency[j].push(i);
                    edge_count += 1;
                }
            }
        }

        let groups = connected_components(&adjacency);
        let failed_items: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_blank())
            .map(|(i, _)| i)
            .collect();

        let outcome = ClusterOutcome {
            groups,
            matrix,
            edge_count,
            failed_items,
            failed_pairs,
            strategy_wins: wins,
            cache_hits: cache.hits() - hits_before,
            cache_misses: cache.misses() - misses_before,
        };

        tracing::debug!(
            n,
            threshold,
            edges = outcome.edge_count,
            groups = outcome.groups.len(),
            duplicate_groups = outcome.duplicate_groups().count(),
            cache_hits = outcome.cache_hits,
            cache_misses = outcome.cache_misses,
            basic_wins = wins.basic,
            fused_wins = wins.fused,
            failed_items = outcome.failed_items.len(),
            failed_pairs,
            "Clustered batch"
        );

        Ok(outcome)
    }

    pub fn pipeline(&self) -> &RecordPipeline {
        &self.pipeline
    }

    pub fn scorer(&self) -> &PairScorer {
        &self.scorer
    }
}

/// Connected components of an undirected graph.
///
/// Iterative depth-first search from each unvisited node in ascending order;
/// members of each component are sorted ascending.
pub fn connected_components(adjacency: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let mut visited = vec![false; adjacency.len()];
    let mut components = Vec::new();
    let mut stack = Vec::new();

    for start in 0..adjacency.len() {
        if visited[start] {
            continue;
        }

        let mut component = Vec::new();
        visited[start] = true;
        stack.push(start);

        while let Some(node) = stack.pop() {
            component.push(node);
            for &next in &adjacency[node] {
                if !visited[next] {
                    visited[next] = true;
                    stack.push(next);
                }
            }
        }

        component.sort_unstable();
        components.push(component);
    }

    components
}
