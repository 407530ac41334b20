use cmdbench::metrics::LatencyStats;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::Rng;
use std::time::Duration;

const PERCENTILES: [f64; 4] = [50.0, 95.0, 99.0, 99.9];

fn random_samples(len: usize) -> Vec<Duration> {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| Duration::from_nanos(rng.gen_range(10_000..50_000_000)))
        .collect()
}

fn bench_from_samples(c: &mut Criterion) {
    let mut group = c.benchmark_group("latency_stats");
    for len in [1_000usize, 100_000, 1_000_000] {
        let samples = random_samples(len);
        group.bench_with_input(BenchmarkId::from_parameter(len), &samples, |b, samples| {
            b.iter(|| LatencyStats::from_samples(black_box(samples), &PERCENTILES))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_from_samples);
criterion_main!(benches);
