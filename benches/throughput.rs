//! Benchmarks for task submission and join throughput.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lazypool::{Pool, Task};

fn sequential_squares(n: u64) -> u64 {
    (0..n).map(|x| black_box(x) * x).sum()
}

fn pooled_squares(pool: &Pool, n: u64) -> u64 {
    let tasks: Vec<Task<u64>> = (0..n)
        .map(|x| pool.spawn(|x: u64| black_box(x) * x, x).unwrap())
        .collect();
    tasks.iter().map(|t| t.join().unwrap()).sum()
}

fn bench_submit_join(c: &mut Criterion) {
    let mut group = c.benchmark_group("submit_join");

    for &n in &[100u64, 1_000] {
        group.bench_with_input(BenchmarkId::new("sequential", n), &n, |b, &n| {
            b.iter(|| sequential_squares(n));
        });

        for workers in [1usize, 4, 8] {
            let pool = Pool::new(workers).unwrap();
            group.bench_with_input(
                BenchmarkId::new(format!("pool_{}", workers), n),
                &n,
                |b, &n| {
                    b.iter(|| pooled_squares(&pool, n));
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_submit_join);
criterion_main!(benches);
