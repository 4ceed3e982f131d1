//! benchmark: uncontended read cost per field count and wait strategy
//!
//! run with: cargo run --release --example bench_read

use std::hint::black_box;
use std::time::Instant;
use vrec_sync::{BackoffWait, BusySpin, SpinHint, VersionedRecord, WaitStrategy};

const ITERATIONS: u64 = 10_000_000;
const WARMUP: u64 = 100_000;

fn bench_read<const N: usize, W: WaitStrategy>(
    record: &VersionedRecord<N>,
    wait: &W,
) -> (u64, u128) {
    // warmup
    for _ in 0..WARMUP {
        black_box(black_box(record).read_with(wait));
    }

    let start = Instant::now();
    let mut sum = 0u64;

    for _ in 0..ITERATIONS {
        let fields = black_box(record).read_with(wait);
        sum = sum.wrapping_add(black_box(fields)[N - 1]);
    }

    let elapsed_ns = start.elapsed().as_nanos();
    (black_box(sum), elapsed_ns)
}

fn bench_write<const N: usize>(record: &VersionedRecord<N>) -> u128 {
    let start = Instant::now();
    for i in 0..ITERATIONS {
        black_box(record).write([i; N]);
    }
    start.elapsed().as_nanos()
}

fn report(label: &str, ns: u128) {
    let per_op = ns as f64 / ITERATIONS as f64;
    println!("{:<24} {:.2} ns/op  (total: {} ms)", label, per_op, ns / 1_000_000);
}

fn run<const N: usize>() {
    println!("--- {} fields ({} bytes) ---", N, std::mem::size_of::<VersionedRecord<N>>());
    let record = VersionedRecord::<N>::with_values([1; N]);

    let (a, ns) = bench_read(&record, &BusySpin);
    report("read (busy spin):", ns);
    let (b, ns) = bench_read(&record, &SpinHint);
    report("read (spin hint):", ns);
    let (c, ns) = bench_read(&record, &BackoffWait::default());
    report("read (backoff):", ns);
    let verdict = if a == b && b == c { "OK" } else { "MISMATCH" };
    println!("checksum:                {} {} {} ({})", a, b, c, verdict);

    report("write:", bench_write(&record));
    println!("final version:           {}", record.version());
    println!();
}

fn main() {
    println!("VersionedRecord Read/Write Benchmark");
    println!("====================================");
    println!("iterations: {}", ITERATIONS);
    println!();

    run::<1>();
    run::<8>();
    run::<64>();
}
