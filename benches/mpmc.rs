//! Benchmarks for the MPMC queue against crossbeam-queue's ArrayQueue.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use crossbeam_queue::ArrayQueue;
use riptide::mpmc;
use std::sync::Arc;
use std::thread;

fn bench_uncontended(c: &mut Criterion) {
    let mut group = c.benchmark_group("mpmc_uncontended");

    group.bench_function("riptide/u64", |b| {
        let q = mpmc::Queue::<u64, 1024>::new();
        b.iter(|| {
            q.push(black_box(42)).unwrap();
            black_box(q.pop().unwrap())
        });
    });

    group.bench_function("crossbeam_array/u64", |b| {
        let q = ArrayQueue::<u64>::new(1024);
        b.iter(|| {
            q.push(black_box(42)).unwrap();
            black_box(q.pop().unwrap())
        });
    });

    group.bench_function("riptide_priority/u64", |b| {
        let q = mpmc::PriorityQueue::<u64, 1024, 4>::new();
        b.iter(|| {
            q.push(black_box(42), 2).unwrap();
            black_box(q.pop().unwrap())
        });
    });

    group.finish();
}

fn bench_contended(c: &mut Criterion) {
    const PER_THREAD: u64 = 50_000;
    const THREADS: usize = 4;

    let mut group = c.benchmark_group("mpmc_contended");
    group.throughput(Throughput::Elements(PER_THREAD * THREADS as u64));
    group.sample_size(10);

    group.bench_function("riptide/4p4c", |b| {
        b.iter(|| {
            let q = Arc::new(mpmc::Queue::<u64, 1024>::new());
            let mut handles = Vec::new();

            for _ in 0..THREADS {
                let q = Arc::clone(&q);
                handles.push(thread::spawn(move || {
                    for i in 0..PER_THREAD {
                        while q.push(i).is_err() {
                            std::hint::spin_loop();
                        }
                    }
                }));
            }

            for _ in 0..THREADS {
                let q = Arc::clone(&q);
                handles.push(thread::spawn(move || {
                    let mut received = 0;
                    while received < PER_THREAD {
                        if q.pop().is_some() {
                            received += 1;
                        }
                    }
                }));
            }

            for h in handles {
                h.join().unwrap();
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_uncontended, bench_contended);
criterion_main!(benches);
