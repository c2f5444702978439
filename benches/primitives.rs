//! Latency benchmarks for the core coordination primitives.
//!
//! Measures the hot paths a caller actually hits:
//! - Settled-promise reads (the memoized fast path)
//! - Full promise lifecycle: spawn, produce, join
//! - Thunk first-run claim and memoized re-reads
//! - Bounded channel send/recv in a single thread
//! - Wait gate lock/broadcast without contention
//! - Attempt capture and unwrap overhead

#![allow(missing_docs)]
#![allow(clippy::semicolon_if_nothing_returned)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};

use deferral::{Attempt, Chan, Promise, Thunk, WaitGate};

// =============================================================================
// PROMISE
// =============================================================================

/// Benchmarks reads against an already-settled promise.
fn bench_promise_settled_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("promise_settled");

    let promise = Promise::resolved(42_u64);
    group.bench_function("wait_and_result", |b| {
        b.iter(|| black_box(promise.wait().result()))
    });
    group.bench_function("is_done", |b| b.iter(|| black_box(promise.is_done())));

    group.finish();
}

/// Benchmarks the full lifecycle: spawn a producer thread, wait, join.
/// Dominated by thread spawn cost; tracked to catch regressions in the
/// settle path riding along with it.
fn bench_promise_lifecycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("promise_lifecycle");
    group.sample_size(30);

    group.bench_function("spawn_and_join", |b| {
        b.iter(|| {
            let promise = Promise::new(|| black_box(7_u64));
            black_box(promise.join().expect("producer failed"))
        })
    });

    group.finish();
}

// =============================================================================
// THUNK
// =============================================================================

fn bench_thunk(c: &mut Criterion) {
    let mut group = c.benchmark_group("thunk");

    group.bench_function("first_run", |b| {
        b.iter_batched(
            || Thunk::new(|| black_box(99_u64)),
            |thunk| black_box(thunk.wait().result()),
            BatchSize::SmallInput,
        )
    });

    let memoized = Thunk::new(|| 99_u64);
    memoized.wait();
    group.bench_function("memoized_read", |b| {
        b.iter(|| black_box(memoized.result()))
    });

    group.finish();
}

// =============================================================================
// CHANNEL
// =============================================================================

fn bench_chan_pipe(c: &mut Criterion) {
    const BATCH: usize = 64;

    let mut group = c.benchmark_group("chan_pipe");
    group.throughput(Throughput::Elements(BATCH as u64));

    group.bench_function("send_recv_64", |b| {
        let chan = Chan::<u64>::bounded(BATCH);
        b.iter(|| {
            for i in 0..BATCH as u64 {
                chan.send(i).expect("send failed");
            }
            for _ in 0..BATCH {
                black_box(chan.recv().expect("recv failed"));
            }
        })
    });

    group.finish();
}

// =============================================================================
// WAIT GATE
// =============================================================================

fn bench_gate(c: &mut Criterion) {
    let mut group = c.benchmark_group("wait_gate");

    let gate = WaitGate::new(1_u32, |count: &u32| *count > 0);
    group.bench_function("is_ready", |b| b.iter(|| black_box(gate.is_ready())));
    group.bench_function("lock_and_broadcast", |b| {
        b.iter(|| {
            {
                let mut count = gate.lock();
                *count += 1;
            }
            gate.broadcast();
        })
    });

    group.finish();
}

// =============================================================================
// ATTEMPT
// =============================================================================

fn bench_attempt(c: &mut Criterion) {
    let mut group = c.benchmark_group("attempt");

    group.bench_function("capture_ok", |b| {
        b.iter(|| {
            let attempt = Attempt::capture(|| Ok(black_box(5_u64)));
            black_box(attempt.into_result().expect("capture failed"))
        })
    });

    group.finish();
}

// =============================================================================
// MAIN
// =============================================================================

criterion_group!(
    benches,
    bench_promise_settled_reads,
    bench_promise_lifecycle,
    bench_thunk,
    bench_chan_pipe,
    bench_gate,
    bench_attempt,
);

criterion_main!(benches);
