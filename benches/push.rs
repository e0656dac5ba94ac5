use criterion::{black_box, BatchSize, BenchmarkId, Criterion};
use criterion::{criterion_group, criterion_main};
use tempfile::tempdir;

use diskqueue::{FileQueue, QueueConfig};

const PUSHES_PER_ITER: usize = 1_000;

fn bench_push(c: &mut Criterion) {
    let mut group = c.benchmark_group("push");
    for &size in &[64_usize, 256, 1024] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter_batched(
                || {
                    let dir = tempdir().expect("tempdir");
                    let queue = FileQueue::open(QueueConfig::new(dir.path().join("bench_queue")))
                        .expect("queue open");
                    let payload = vec![0u8; size];
                    (dir, queue, payload)
                },
                |(_dir, queue, payload)| {
                    for _ in 0..PUSHES_PER_ITER {
                        queue.push(black_box(&payload)).expect("push");
                    }
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_push);
criterion_main!(benches);
