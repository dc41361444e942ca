//! # Message Buffer Benchmarks
//!
//! | Workload | What it measures |
//! |----------|------------------|
//! | append | Publish-side cost of one buffered message |
//! | replay_full | Participant owed the whole window |
//! | replay_mostly_expired | Scan over a long expired prefix |
//! | replay_caught_up | Participant whose watermark is at the tail |
//! | compact | Dropping the expired prefix |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

use mc_01_coordinator::{MessageBuffer, MessageStamp, RetentionConfig, Timestamp};
use mc_tests::benchmarks::buffer::{filled_buffer, owed};
use shared_types::ParticipantId;

fn bench_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer-append");
    group.throughput(Throughput::Elements(1));

    let buffer = MessageBuffer::new(RetentionConfig::from_secs(60));
    let sender = ParticipantId::new("bench").unwrap();
    let mut now = 0u64;
    group.bench_function("append", |b| {
        b.iter(|| {
            now += 1;
            black_box(buffer.append(sender.clone(), "payload".to_string(), Timestamp::new(now)))
        })
    });
    group.finish();
}

fn bench_replay_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer-replay");
    group.measurement_time(Duration::from_secs(5));

    for size in [1_000u64, 10_000, 100_000] {
        let now = Timestamp::new(size - 1);
        group.throughput(Throughput::Elements(size));

        let everything = filled_buffer(size, size);
        group.bench_with_input(BenchmarkId::new("replay_full", size), &size, |b, _| {
            b.iter(|| black_box(owed(&everything, MessageStamp::ORIGIN, now)))
        });

        let narrow = filled_buffer(size, size / 100);
        group.bench_with_input(
            BenchmarkId::new("replay_mostly_expired", size),
            &size,
            |b, _| b.iter(|| black_box(owed(&narrow, MessageStamp::ORIGIN, now))),
        );

        let tail = MessageStamp::new(now, size);
        group.bench_with_input(BenchmarkId::new("replay_caught_up", size), &size, |b, _| {
            b.iter(|| black_box(owed(&everything, tail, now)))
        });
    }
    group.finish();
}

fn bench_compact(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer-compact");

    for size in [1_000u64, 10_000] {
        group.bench_with_input(BenchmarkId::new("compact", size), &size, |b, &size| {
            b.iter_batched(
                || filled_buffer(size, size / 2),
                |buffer| black_box(buffer.compact(Timestamp::new(size - 1))),
                criterion::BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_append, bench_replay_scan, bench_compact);
criterion_main!(benches);
