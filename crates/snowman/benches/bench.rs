use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use snowman::{AtomicSnowflakeGenerator, SnowflakeId, TimeSource, WallClock};
use std::{
    sync::{Arc, Barrier},
    thread::scope,
    time::Instant,
};

struct FixedMockTime {
    millis: u64,
}

impl TimeSource for FixedMockTime {
    fn current_millis(&self) -> u64 {
        self.millis
    }
}

// Number of IDs generated per benchmark iteration (per-thread for
// multi-threaded).
const TOTAL_IDS: usize = 4096;

/// Hot path with a frozen clock: every call increments the sequence and,
/// once per 4096 calls, borrows the next millisecond.
fn bench_fixed_clock(c: &mut Criterion) {
    let mut group = c.benchmark_group("atomic/fixed");
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    group.bench_function(format!("elems/{TOTAL_IDS}"), |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();
            for _ in 0..iters {
                let generator =
                    AtomicSnowflakeGenerator::new(0, FixedMockTime { millis: 1 }).unwrap();
                for _ in 0..TOTAL_IDS {
                    black_box(generator.next_id());
                }
            }
            start.elapsed()
        });
    });

    group.finish();
}

fn bench_wall_clock(c: &mut Criterion) {
    let mut group = c.benchmark_group("atomic/wall_clock");
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    let generator = AtomicSnowflakeGenerator::new(0, WallClock::default()).unwrap();
    group.bench_function(format!("elems/{TOTAL_IDS}"), |b| {
        b.iter(|| {
            for _ in 0..TOTAL_IDS {
                black_box(generator.next_id());
            }
        });
    });

    group.finish();
}

/// Shared generator hammered by several threads at once; measures the cost
/// of CAS contention.
fn bench_contended(c: &mut Criterion) {
    let thread_counts = [2, 4, 8, 16];

    for threads in thread_counts {
        let mut group = c.benchmark_group(format!("atomic/threads/{threads}"));
        group.throughput(Throughput::Elements((TOTAL_IDS * threads) as u64));

        group.bench_function(format!("elems/{TOTAL_IDS}"), |b| {
            b.iter_custom(|iters| {
                let generator =
                    Arc::new(AtomicSnowflakeGenerator::new(0, WallClock::default()).unwrap());
                let barrier = Arc::new(Barrier::new(threads + 1));

                let start = scope(|s| {
                    for _ in 0..threads {
                        let generator = Arc::clone(&generator);
                        let barrier = Arc::clone(&barrier);
                        s.spawn(move || {
                            barrier.wait();
                            for _ in 0..iters {
                                for _ in 0..TOTAL_IDS {
                                    let id: SnowflakeId = generator.next_id();
                                    black_box(id);
                                }
                            }
                        });
                    }
                    barrier.wait();
                    Instant::now()
                });

                start.elapsed()
            });
        });

        group.finish();
    }
}

criterion_group!(benches, bench_fixed_clock, bench_wall_clock, bench_contended);
criterion_main!(benches);
