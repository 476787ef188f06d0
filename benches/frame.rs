//! Frame computation throughput, sequential against fork-join.
//!
//! Run with: `cargo bench --bench frame`

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rboids::{BatchScheduler, ExecutionMode, FlockParams, Population};

fn populated(boids: usize, predators: usize) -> Population {
    let mut rng = StdRng::seed_from_u64(42);
    let mut population = Population::new();
    population.populate(&mut rng, &FlockParams::default(), boids, predators);
    population
}

fn bench_compute(c: &mut Criterion) {
    let params = FlockParams::default();
    let mut group = c.benchmark_group("compute_frame");
    group.sample_size(20);

    for &count in &[250usize, 1000, 4000] {
        let snapshot = populated(count, 4).capture_snapshot();
        for (label, mode) in [
            ("sequential", ExecutionMode::Sequential),
            ("parallel", ExecutionMode::Parallel),
        ] {
            let scheduler = BatchScheduler::new(64, mode);
            group.bench_with_input(BenchmarkId::new(label, count), &snapshot, |b, snapshot| {
                b.iter(|| black_box(scheduler.compute(snapshot, &params)))
            });
        }
    }
    group.finish();
}

fn bench_chunk_size(c: &mut Criterion) {
    let params = FlockParams::default();
    let snapshot = populated(2000, 2).capture_snapshot();
    let mut group = c.benchmark_group("chunk_size");
    group.sample_size(20);
    for &chunk in &[8usize, 32, 128, 512] {
        let scheduler = BatchScheduler::new(chunk, ExecutionMode::Parallel);
        group.bench_function(BenchmarkId::from_parameter(chunk), |b| {
            b.iter(|| black_box(scheduler.compute(&snapshot, &params)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_compute, bench_chunk_size);
criterion_main!(benches);
