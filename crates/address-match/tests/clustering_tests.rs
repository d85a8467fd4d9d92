//! Duplicate clustering integration tests
//!
//! Grouping, statistics, and deduplication through the public matcher,
//! with property-based checks for partition and idempotence.

mod common;

use address_match::{AddressMatcher, MatcherConfig, PairwiseSimilarityCache};
use common::fixtures::load_address_batch;
use proptest::prelude::*;

fn matcher() -> AddressMatcher {
    AddressMatcher::new()
}

// === Scenarios ===

#[test]
fn test_abbreviation_variants_form_one_group() {
    let addresses = [
        "İstanbul Kadıköy Moda Mahallesi Caferağa Sokak 10",
        "İstanbul Kadıköy Moda Mah. Caferağa Sk. 10",
    ];
    let m = matcher();
    assert_eq!(m.find_duplicate_groups(&addresses).unwrap(), vec![vec![0, 1]]);

    let stats = m.get_duplicate_statistics(&addresses).unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.duplicate_group_count, 1);
    assert_eq!(stats.duplication_rate, 0.5);
    assert_eq!(stats.largest_group_size, 2);
}

#[test]
fn test_different_neighborhoods_stay_apart() {
    let addresses = [
        "İstanbul Kadıköy Moda Mahallesi",
        "İstanbul Kadıköy Fenerbahçe Mahallesi",
    ];
    assert_eq!(
        matcher().find_duplicate_groups(&addresses).unwrap(),
        vec![vec![0], vec![1]]
    );
}

#[test]
fn test_street_abbreviation_groups() {
    let addresses = [
        "Ankara Çankaya Tunalı Hilmi Caddesi 25",
        "Ankara Çankaya Tunali Hilmi Cd. 25",
    ];
    assert_eq!(
        matcher().find_duplicate_groups(&addresses).unwrap(),
        vec![vec![0, 1]]
    );
}

#[test]
fn test_mixed_batch() {
    let addresses = load_address_batch("mixed_batch.txt");
    assert_eq!(addresses.len(), 8);

    let m = matcher();
    let groups = m.find_duplicate_groups(&addresses).unwrap();
    assert_eq!(
        groups,
        vec![vec![0, 4], vec![1], vec![2, 6], vec![3], vec![5], vec![7]]
    );

    let stats = m.get_duplicate_statistics(&addresses).unwrap();
    assert_eq!(stats.duplicate_group_count, 2);
    assert_eq!(stats.total_duplicates, 2);
    assert_eq!(stats.unique_count, 6);
    assert_eq!(stats.duplication_rate, 0.25);
    assert_eq!(stats.failed_items, 0);
    assert_eq!(stats.failed_pairs, 0);
}

#[test]
fn test_mixed_batch_deduplicate() {
    let addresses = load_address_batch("mixed_batch.txt");
    let m = matcher();
    let dedup = m.deduplicate(&addresses).unwrap();
    assert_eq!(dedup.representatives.len(), 6);
    assert_eq!(dedup.representatives[0], addresses[0]);
    assert_eq!(dedup.representatives[2], addresses[2]);

    let again = m.deduplicate(&dedup.representatives).unwrap();
    assert_eq!(again.representatives, dedup.representatives);
}

#[test]
fn test_threshold_monotonicity_on_mixed_batch() {
    let addresses = load_address_batch("mixed_batch.txt");
    let m = matcher();

    let counts: Vec<usize> = [0.6, 0.7, 0.8, 0.9, 0.99, 1.0]
        .iter()
        .map(|t| m.cluster(&addresses, *t).unwrap().duplicate_groups().count())
        .collect();
    assert_eq!(counts[2], 2);
    for pair in counts.windows(2) {
        assert!(pair[0] >= pair[1], "counts {:?}", counts);
    }
}

#[test]
fn test_transitive_grouping_through_bridge() {
    // 0 and 2 share no words; 1 shares half its words with each
    let addresses = [
        "aaaa bbbb cccc dddd",
        "cccc dddd eeee ffff",
        "eeee ffff gggg hhhh",
    ];
    let m = matcher();
    let scored = m.cluster(&addresses, 1.0).unwrap();
    let direct = scored.matrix.get(0, 2);
    let bridged = scored.matrix.get(0, 1).min(scored.matrix.get(1, 2));
    assert!(direct < bridged, "direct {} bridged {}", direct, bridged);

    let outcome = m.cluster(&addresses, bridged).unwrap();
    assert_eq!(outcome.edge_count, 2);
    assert_eq!(outcome.groups, vec![vec![0, 1, 2]]);
}

#[test]
fn test_matrix_independent_of_input_order() {
    let short = "Moda Cd. 5 Kadıköy";
    let spelled = "Moda Caddesi 5 Kadıköy";
    let other = "Kadıköy Moda Caddesi 7";
    let m = matcher();

    let forward = m.cluster(&[short, spelled, other], 0.8).unwrap().matrix;
    let reversed = m.cluster(&[spelled, short, other], 0.8).unwrap().matrix;

    assert_eq!(forward.get(0, 2), m.pair_score(short, other).value);
    assert_eq!(forward.get(1, 2), m.pair_score(spelled, other).value);
    assert_eq!(forward.get(0, 2), reversed.get(1, 2));
    assert_eq!(forward.get(1, 2), reversed.get(0, 2));
}

#[test]
fn test_district_named_neighborhoods_stay_apart() {
    let m = matcher();
    for (a, b) in [
        (
            "Ankara Çankaya Bahçelievler Mahallesi Aşkabat Caddesi 10",
            "Ankara Çankaya Emek Mahallesi Aşkabat Caddesi 10",
        ),
        (
            "İzmir Konak Merkez Mahallesi Atatürk Caddesi 5",
            "İzmir Konak Cumhuriyet Mahallesi Atatürk Caddesi 5",
        ),
    ] {
        let score = m.pair_score(a, b);
        assert_eq!(score.penalty, 0.35, "{} / {}", a, b);
        assert_eq!(m.find_duplicate_groups(&[a, b]).unwrap(), vec![vec![0], vec![1]]);
    }
}

#[test]
fn test_blank_inputs_reported() {
    let addresses = ["", "Ankara Çankaya", "   ", "Ankara Çankaya"];
    let stats = matcher().get_duplicate_statistics(&addresses).unwrap();
    assert_eq!(stats.total, 4);
    assert_eq!(stats.failed_items, 2);
    assert_eq!(stats.duplicate_group_count, 1);
}

#[test]
fn test_cache_retained_across_overlapping_batches() {
    let m = matcher();
    let mut cache = PairwiseSimilarityCache::new();

    let first = ["Ankara Çankaya Kızılay", "İzmir Konak Alsancak"];
    let second = ["İzmir Konak Alsancak", "Ankara Çankaya Kızılay", "Bursa Nilüfer"];

    m.cluster_with_cache(&first, 0.8, &mut cache).unwrap();
    let outcome = m.cluster_with_cache(&second, 0.8, &mut cache).unwrap();
    assert_eq!(outcome.cache_hits, 1);
    assert_eq!(outcome.cache_misses, 2);
    assert_eq!(cache.len(), 3);
}

#[test]
fn test_cancel_reports_completed_rows() {
    let addresses = load_address_batch("mixed_batch.txt");
    let err = matcher()
        .cluster_with_cancel(&addresses, 0.8, |rows| rows >= 3)
        .unwrap_err();
    assert!(err.to_string().contains("Cancelled after 3 matrix rows"));
}

#[test]
fn test_config_threshold_drives_find_duplicate_groups() {
    let config = MatcherConfig {
        similarity_threshold: 1.0,
        ..Default::default()
    };
    let m = AddressMatcher::with_config(config).unwrap();
    let addresses = load_address_batch("mixed_batch.txt");
    let groups = m.find_duplicate_groups(&addresses).unwrap();
    assert!(groups.iter().all(|g| g.len() == 1));
}

// === Properties ===

fn address_batch() -> impl Strategy<Value = Vec<String>> {
    let fragments = prop::sample::select(vec![
        "İstanbul Kadıköy Moda Mah.",
        "İstanbul Kadıköy Moda Mahallesi",
        "İstanbul Kadıköy Fenerbahçe Mahallesi",
        "Ankara Çankaya Tunalı Hilmi Cd. 25",
        "Ankara Çankaya Tunali Hilmi Caddesi 25",
        "Ankara Çankaya Kızılay",
        "İzmir Konak Alsancak",
        "Bursa Nilüfer",
        "",
    ]);
    prop::collection::vec(fragments.prop_map(str::to_string), 0..8)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn test_groups_partition_input(addresses in address_batch()) {
        let groups = matcher().find_duplicate_groups(&addresses).unwrap();
        let mut seen: Vec<usize> = groups.iter().flatten().copied().collect();
        seen.sort_unstable();
        prop_assert_eq!(seen, (0..addresses.len()).collect::<Vec<_>>());

        for group in &groups {
            prop_assert!(group.windows(2).all(|w| w[0] < w[1]));
        }
        for pair in groups.windows(2) {
            prop_assert!(pair[0][0] < pair[1][0]);
        }
    }

    #[test]
    fn test_deduplicate_idempotent(addresses in address_batch()) {
        let m = matcher();
        let once = m.deduplicate(&addresses).unwrap();
        let twice = m.deduplicate(&once.representatives).unwrap();
        prop_assert_eq!(twice.representatives, once.representatives);
    }

    #[test]
    fn test_raising_threshold_never_adds_duplicates(
        addresses in address_batch(),
        low in 0.0f64..1.0,
        step in 0.0f64..0.5,
    ) {
        let high = (low + step).min(1.0);
        let m = matcher();
        let members = |t: f64| -> usize {
            m.cluster(&addresses, t)
                .unwrap()
                .duplicate_groups()
                .map(Vec::len)
                .sum()
        };
        prop_assert!(members(high) <= members(low));
    }

    #[test]
    fn test_clustering_deterministic(addresses in address_batch()) {
        let m = matcher();
        prop_assert_eq!(
            m.find_duplicate_groups(&addresses).unwrap(),
            m.find_duplicate_groups(&addresses).unwrap()
        );
    }
}
