//! Throughput of the keyed queue across lock backends and allocation
//! strategies.
//!
//! Run with: cargo bench --bench keyed_queue

use std::thread;

use criterion::measurement::WallTime;
use criterion::{
    BenchmarkGroup, BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main,
};
use nexus_keyed::{
    AllocStrategy, BlockingLock, Item, Key, KeyedQueue, Lock, NoLock, QueueBuilder, SpinLock,
};

const BATCH: u32 = 10_000;
const PAYLOAD: [u8; 32] = [0xAB; 32];

fn scrambled(i: u32) -> Key {
    // Odd multiplier: a bijection on u32, and far from sorted order
    i.wrapping_mul(0x9E37_79B9)
}

fn fill<L: Lock>(queue: &KeyedQueue<L>, keys: impl Iterator<Item = Key>) {
    for key in keys {
        black_box(queue.enqueue(&Item::new(key, PAYLOAD)).unwrap());
    }
}

fn drain<L: Lock>(queue: &KeyedQueue<L>) {
    while let Some(item) = queue.dequeue() {
        black_box(item);
    }
}

// ============================================================================
// Single-threaded enqueue + drain
// ============================================================================

fn round_trip<L: Lock>(group: &mut BenchmarkGroup<'_, WallTime>, name: &str) {
    let queue: KeyedQueue<L> = QueueBuilder::default().build().unwrap();
    group.bench_function(name, |b| {
        b.iter(|| {
            fill(&queue, (0..BATCH).map(scrambled));
            drain(&queue);
        });
    });
}

fn bench_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("round_trip");
    group.throughput(Throughput::Elements(BATCH as u64));

    round_trip::<SpinLock>(&mut group, "spin");
    round_trip::<BlockingLock>(&mut group, "blocking");
    #[cfg(all(feature = "futex", target_os = "linux"))]
    round_trip::<nexus_keyed::FutexLock>(&mut group, "futex");
    round_trip::<NoLock>(&mut group, "none");

    group.finish();
}

// ============================================================================
// Overwrite (dedup) path
// ============================================================================

fn bench_overwrite(c: &mut Criterion) {
    let mut group = c.benchmark_group("overwrite");
    group.throughput(Throughput::Elements(BATCH as u64));

    let queue = KeyedQueue::new();
    fill(&queue, (0..1_000).map(scrambled));

    group.bench_function("spin", |b| {
        b.iter(|| fill(&queue, (0..BATCH).map(|i| scrambled(i % 1_000))));
    });

    group.finish();
}

// ============================================================================
// Pooled vs direct node allocation
// ============================================================================

fn bench_strategy(c: &mut Criterion) {
    let mut group = c.benchmark_group("strategy");
    group.throughput(Throughput::Elements(BATCH as u64));

    for (name, strategy) in [
        ("pooled", AllocStrategy::Pooled),
        ("direct", AllocStrategy::Direct),
    ] {
        let queue: KeyedQueue<SpinLock> =
            QueueBuilder::default().strategy(strategy).build().unwrap();
        group.bench_function(name, |b| {
            b.iter(|| {
                fill(&queue, (0..BATCH).map(scrambled));
                drain(&queue);
            });
        });
    }

    group.finish();
}

// ============================================================================
// Range extraction
// ============================================================================

fn bench_range(c: &mut Criterion) {
    let mut group = c.benchmark_group("range");

    let queue = KeyedQueue::new();
    fill(&queue, (0..BATCH).map(scrambled));

    for pct in [1u64, 10, 50] {
        let end = (u32::MAX as u64 * pct / 100) as Key;
        group.bench_with_input(BenchmarkId::new("percent", pct), &end, |b, &end| {
            b.iter(|| black_box(queue.range(0, end).unwrap()));
        });
    }

    group.finish();
}

// ============================================================================
// Contended: producers + one consumer
// ============================================================================

fn contended<L: Lock + Sync>(producers: u32) {
    let queue: KeyedQueue<L> = QueueBuilder::default().build().unwrap();
    let per = BATCH / producers;
    let total = (per * producers) as usize;

    thread::scope(|s| {
        for p in 0..producers {
            let queue = &queue;
            s.spawn(move || fill(queue, (0..per).map(|i| scrambled(p * per + i))));
        }

        let mut seen = 0;
        while seen < total {
            match queue.dequeue() {
                Some(item) => {
                    black_box(item);
                    seen += 1;
                }
                None => std::hint::spin_loop(),
            }
        }
    });
}

fn bench_contended(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended");
    group.throughput(Throughput::Elements(BATCH as u64));
    group.sample_size(20);

    for producers in [1u32, 4] {
        group.bench_with_input(BenchmarkId::new("spin", producers), &producers, |b, &p| {
            b.iter(|| contended::<SpinLock>(p));
        });
        group.bench_with_input(BenchmarkId::new("blocking", producers), &producers, |b, &p| {
            b.iter(|| contended::<BlockingLock>(p));
        });
        #[cfg(all(feature = "futex", target_os = "linux"))]
        group.bench_with_input(BenchmarkId::new("futex", producers), &producers, |b, &p| {
            b.iter(|| contended::<nexus_keyed::FutexLock>(p));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_round_trip,
    bench_overwrite,
    bench_strategy,
    bench_range,
    bench_contended
);
criterion_main!(benches);
