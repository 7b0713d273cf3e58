//! Behavioral tests for the public sorted set API.

use ranked::{Config, RangeSpec, Record, SortedSet};

// =============================================================================
// Test helpers
// =============================================================================

fn pairs(records: &[Record]) -> Vec<(i64, i64)> {
    return records.iter().map(|r| (r.score, r.key)).collect();
}

fn scenario_set() -> SortedSet {
    let set = SortedSet::with_seed(42);
    set.add(10, 100);
    set.add(20, 200);
    set.add(10, 50);
    return set;
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn score_ties_are_broken_by_key() {
    let set = scenario_set();
    assert_eq!(set.len(), 3);

    let all = set.range_by_rank(1, 3, false);
    assert_eq!(pairs(&all), vec![(10, 50), (10, 100), (20, 200)]);
    assert_eq!(all.iter().map(|r| r.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
}

#[test]
fn middle_rank_is_symmetric() {
    let set = scenario_set();
    assert_eq!(set.rank(100, false), Some(2));
    assert_eq!(set.rank(100, true), Some(2));
    assert_eq!(set.rank(50, true), Some(3));
    assert_eq!(set.rank(999, false), None);
}

#[test]
fn remove_lowest_then_scan_scores() {
    let set = scenario_set();
    assert_eq!(set.remove_by_rank(1, 1, false), 1);
    assert_eq!(set.score(50), None);

    let rest = set.range_by_score(10, 20, false);
    assert_eq!(pairs(&rest), vec![(10, 100), (20, 200)]);
    assert_eq!(rest.iter().map(|r| r.rank).collect::<Vec<_>>(), vec![1, 2]);
    set.check_invariants();
}

#[test]
fn inverted_rank_range_is_empty() {
    let set = scenario_set();
    assert!(set.range_by_rank(2, 1, false).is_empty());
    assert!(set.range_by_rank(2, 1, true).is_empty());
    assert!(set.range_by_score(20, 10, false).is_empty());
}

// =============================================================================
// Properties on a fixed population
// =============================================================================

#[test]
fn add_twice_keeps_one_entry() {
    let set = scenario_set();
    let before = set.len();
    set.add(5, 7);
    set.add(99, 7);
    assert_eq!(set.len(), before + 1);
    assert_eq!(set.score(7), Some(99));
    assert_eq!(set.rank(7, true), Some(1));
    set.check_invariants();
}

#[test]
fn add_then_remove_restores_size() {
    let set = scenario_set();
    let before = set.len();
    set.add(15, 7);
    assert!(set.remove(7));
    assert_eq!(set.score(7), None);
    assert_eq!(set.len(), before);
    assert!(!set.remove(7));
}

#[test]
fn leaderboard_queries() {
    let set = SortedSet::with_seed(7);
    // key = player id, score = points
    set.add_all((1..=100).map(|id| ((id * 37) % 1000, id)));
    set.check_invariants();

    let top = set.range_by_rank(1, 10, true);
    assert_eq!(top.len(), 10);
    for pair in top.windows(2) {
        assert!((pair[0].score, pair[0].key) > (pair[1].score, pair[1].key));
        assert_eq!(pair[0].rank + 1, pair[1].rank);
    }
    for record in &top {
        assert_eq!(set.rank(record.key, true), Some(record.rank));
        assert_eq!(set.by_rank(record.rank, true), Some(*record));
    }

    // Ranks from score scans match point lookups in both directions.
    for reverse in [false, true] {
        for record in set.range_by_score(200, 600, reverse) {
            assert_eq!(set.rank(record.key, reverse), Some(record.rank));
        }
    }
}

#[test]
fn reverse_score_scan_is_mirror_of_forward() {
    let set = SortedSet::with_seed(3);
    for key in 0..50 {
        set.add(key % 7, key);
    }
    let spec = RangeSpec::new(1, 5, true, false);
    let forward = set.range_by_spec(&spec, false);
    let mut backward = set.range_by_spec(&spec, true);
    backward.reverse();

    assert_eq!(pairs(&forward), pairs(&backward));
    for (f, b) in forward.iter().zip(&backward) {
        assert_eq!(f.rank, set.len() + 1 - b.rank);
    }
    assert_eq!(set.count_by_score(&spec), forward.len());
}

#[test]
fn remove_by_score_with_exclusive_bounds() {
    let set = SortedSet::with_seed(8);
    for key in 0..10 {
        set.add(key, key);
    }
    assert_eq!(set.remove_by_score(&RangeSpec::open(2, 6)), 3);
    let left: Vec<i64> = set.to_vec().iter().map(|r| r.key).collect();
    assert_eq!(left, vec![0, 1, 2, 6, 7, 8, 9]);

    // Malformed specs match nothing.
    assert_eq!(set.remove_by_score(&RangeSpec::closed(9, 0)), 0);
    assert_eq!(set.remove_by_score(&RangeSpec::new(6, 6, false, true)), 0);
    assert_eq!(set.len(), 7);
    set.check_invariants();
}

#[test]
fn reverse_remove_by_rank_takes_from_top() {
    let set = SortedSet::with_seed(9);
    for key in 1..=10 {
        set.add(key, key);
    }
    assert_eq!(set.remove_by_rank(2, 4, true), 3);
    let left: Vec<i64> = set.to_vec().iter().map(|r| r.key).collect();
    assert_eq!(left, vec![1, 2, 3, 4, 5, 6, 10]);
    set.check_invariants();
}

#[test]
fn extreme_scores() {
    let set = SortedSet::with_seed(10);
    set.add(i64::MAX, 1);
    set.add(i64::MIN, 2);
    set.add(0, 3);

    assert_eq!(set.first().map(|r| r.key), Some(2));
    assert_eq!(set.last().map(|r| r.key), Some(1));
    assert_eq!(set.range_by_score(i64::MIN, i64::MAX, false).len(), 3);
    assert_eq!(set.count_by_score(&RangeSpec::new(i64::MIN, i64::MAX, true, true)), 1);
}

#[test]
fn clear_then_reuse() {
    let set = SortedSet::with_config(&Config::seeded(11)).unwrap();
    set.add_all((0..1000).map(|k| (k, k)));
    set.clear();
    assert_eq!(set.len(), 0);
    assert!(set.range_by_rank(1, 10, false).is_empty());
    assert_eq!(set.by_rank(1, false), None);

    set.add(1, 1);
    assert_eq!(set.to_vec(), vec![Record::new(1, 1, 1)]);
    set.check_invariants();
}

#[test]
fn records_serialize() {
    let record = Record::new(10, 50, 1);
    let json = serde_json::to_string(&record).unwrap();
    assert_eq!(json, r#"{"score":10,"key":50,"rank":1}"#);
    let spec: RangeSpec = serde_json::from_str(
        r#"{"min":1,"max":2,"min_exclusive":false,"max_exclusive":true}"#,
    )
    .unwrap();
    assert_eq!(spec, RangeSpec::new(1, 2, false, true));
}
