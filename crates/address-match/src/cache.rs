//! Pairwise similarity cache
//!
//! Keyed by the unordered pair of record identities, so (a, b) and (b, a)
//! share one entry and textual duplicates across batches are scored once.
//! An identity holds everything a pair score reads from a record beyond what
//! the normalized text determines: the abbreviations written in the raw text
//! and the coordinate. Identities are interned to small ids; the cache owns
//! one copy of each.

use std::collections::HashMap;

use crate::record::AddressRecord;
use crate::strategy::PairScore;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RecordKey {
    normalized: String,
    abbreviated: Vec<String>,
    coordinate: Option<(u64, u64)>,
}

impl RecordKey {
    fn of(record: &AddressRecord) -> Self {
        Self {
            normalized: record.normalized().to_string(),
            abbreviated: record.abbreviated().iter().cloned().collect(),
            coordinate: record
                .coordinate()
                .map(|c| (c.latitude.to_bits(), c.longitude.to_bits())),
        }
    }
}

#[derive(Debug, Default)]
pub struct PairwiseSimilarityCache {
    ids: HashMap<RecordKey, usize>,
    scores: HashMap<(usize, usize), PairScore>,
    hits: u64,
    misses: u64,
}

impl PairwiseSimilarityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached score for the pair, computing and storing it on miss.
    pub fn get_or_compute<F>(&mut self, a: &AddressRecord, b: &AddressRecord, compute: F) -> PairScore
    where
        F: FnOnce() -> PairScore,
    {
        let key = ordered(self.intern(a), self.intern(b));
        if let Some(score) = self.scores.get(&key) {
            self.hits += 1;
            return *score;
        }
        self.misses += 1;
        let score = compute();
        self.scores.insert(key, score);
        score
    }

    /// Look up without computing.
    pub fn get(&self, a: &AddressRecord, b: &AddressRecord) -> Option<PairScore> {
        let x = *self.ids.get(&RecordKey::of(a))?;
        let y = *self.ids.get(&RecordKey::of(b))?;
        self.scores.get(&ordered(x, y)).copied()
    }

    fn intern(&mut self, record: &AddressRecord) -> usize {
        let key = RecordKey::of(record);
        let next = self.ids.len();
        *self.ids.entry(key).or_insert(next)
    }

    /// Number of cached pairs
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.scores.clear();
        self.hits = 0;
        self.misses = 0;
    }
}

fn ordered(x: usize, y: usize) -> (usize, usize) {
    if x <= y {
        (x, y)
    } else {
        (y, x)
    }
}
