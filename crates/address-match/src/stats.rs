//! Batch duplicate statistics

use serde::{Deserialize, Serialize};

use crate::cluster::ClusterOutcome;

/// Summary of one clustered batch
///
/// `total_duplicates` counts the redundant members: a group of k addresses
/// contributes k - 1, so `unique_count` is the number of distinct locations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "native", derive(uniffi::Record))]
pub struct DuplicateStatistics {
    pub total: u32,
    /// Groups with more than one member
    pub duplicate_group_count: u32,
    pub total_duplicates: u32,
    pub unique_count: u32,
    /// `total_duplicates / total`, 0 for an empty batch
    pub duplication_rate: f64,
    pub largest_group_size: u32,
    /// Pairs scored with at least one failed signal
    pub failed_pairs: u32,
    /// Blank inputs skipped by the comparators
    pub failed_items: u32,
}

impl DuplicateStatistics {
    pub fn from_groups(groups: &[Vec<usize>], failed_items: usize, failed_pairs: usize) -> Self {
        let total: usize = groups.iter().map(Vec::len).sum();
        let duplicates: Vec<&Vec<usize>> = groups.iter().filter(|g| g.len() > 1).collect();
        let total_duplicates: usize = duplicates.iter().map(|g| g.len() - 1).sum();
        let largest = groups.iter().map(Vec::len).max().unwrap_or(0);

        let duplication_rate = if total == 0 {
            0.0
        } else {
            total_duplicates as f64 / total as f64
        };

        Self {
            total: saturate(total),
            duplicate_group_count: saturate(duplicates.len()),
            total_duplicates: saturate(total_duplicates),
            unique_count: saturate(total - total_duplicates),
            duplication_rate,
            largest_group_size: saturate(largest),
            failed_pairs: saturate(failed_pairs),
            failed_items: saturate(failed_items),
        }
    }

    pub fn from_outcome(outcome: &ClusterOutcome) -> Self {
        Self::from_groups(
            &outcome.groups,
            outcome.failed_items.len(),
            outcome.failed_pairs,
        )
    }
}

fn saturate(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
