// Sorted set benchmarks
//
// Measures the operations a leaderboard leans on:
// - add: fresh inserts and score updates of existing keys
// - rank: point rank lookups
// - range_by_rank: top-N pages
// - range_by_score: score windows
// - remove_by_rank: trimming the tail

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ranked::{RangeSpec, SortedSet};

const SIZES: [usize; 3] = [1_000, 10_000, 100_000];

/// A set of `n` keys with random scores.
fn populated(n: usize, rng: &mut StdRng) -> SortedSet {
    let set = SortedSet::with_seed(1);
    set.add_all((0..n as i64).map(|key| (rng.gen_range(0..1_000_000), key)));
    return set;
}

// =============================================================================
// Mutation
// =============================================================================

fn bench_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("add");
    for &n in &SIZES {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("fresh", n), &n, |b, &n| {
            let mut rng = StdRng::seed_from_u64(42);
            let scores: Vec<i64> = (0..n).map(|_| rng.gen_range(0..1_000_000)).collect();
            b.iter(|| {
                let set = SortedSet::with_seed(1);
                for (key, score) in scores.iter().enumerate() {
                    set.add(*score, key as i64);
                }
                black_box(set.len())
            });
        });
        group.bench_with_input(BenchmarkId::new("update", n), &n, |b, &n| {
            let mut rng = StdRng::seed_from_u64(42);
            let set = populated(n, &mut rng);
            b.iter(|| {
                for _ in 0..1000 {
                    let key = rng.gen_range(0..n as i64);
                    set.add(rng.gen_range(0..1_000_000), key);
                }
            });
        });
    }
    group.finish();
}

fn bench_remove_by_rank(c: &mut Criterion) {
    let mut group = c.benchmark_group("remove_by_rank");
    for &n in &SIZES {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let mut rng = StdRng::seed_from_u64(7);
            b.iter_batched(
                || populated(n, &mut rng),
                |set| black_box(set.remove_by_rank(1, n / 10, true)),
                criterion::BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

// =============================================================================
// Queries
// =============================================================================

fn bench_rank(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank");
    for &n in &SIZES {
        let mut rng = StdRng::seed_from_u64(3);
        let set = populated(n, &mut rng);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let key = rng.gen_range(0..n as i64);
                black_box(set.rank(key, true))
            });
        });
    }
    group.finish();
}

fn bench_ranges(c: &mut Criterion) {
    let mut group = c.benchmark_group("range");
    for &n in &SIZES {
        let mut rng = StdRng::seed_from_u64(5);
        let set = populated(n, &mut rng);
        group.bench_with_input(BenchmarkId::new("top_100", n), &n, |b, _| {
            b.iter(|| black_box(set.range_by_rank(1, 100, true)));
        });
        group.bench_with_input(BenchmarkId::new("page_middle", n), &n, |b, &n| {
            b.iter(|| black_box(set.range_by_rank(n / 2, n / 2 + 50, false)));
        });
        group.bench_with_input(BenchmarkId::new("score_window", n), &n, |b, _| {
            b.iter(|| black_box(set.range_by_score(500_000, 501_000, false)));
        });
        group.bench_with_input(BenchmarkId::new("count", n), &n, |b, _| {
            let spec = RangeSpec::closed(250_000, 750_000);
            b.iter(|| black_box(set.count_by_score(&spec)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_add, bench_remove_by_rank, bench_rank, bench_ranges);
criterion_main!(benches);
