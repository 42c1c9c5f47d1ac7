//! Compare a serial workload against the pool's parallel for_each.
//!
//! Run with `cargo run --release --example speedup`.

use std::time::Instant;

use workpool::util::telemetry::init_tracing;
use workpool::{AppResult, Pool, PoolConfig};

/// A deliberately CPU-bound mixing function.
fn crunch(seed: u64) -> u64 {
    let mut x = seed;
    for _ in 0..2_000_000 {
        x = x
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
    }
    x
}

fn main() -> AppResult<()> {
    init_tracing();

    let inputs: Vec<u64> = (0..64).collect();

    let start = Instant::now();
    let mut serial = inputs.clone();
    for value in &mut serial {
        *value = crunch(*value);
    }
    let serial_time = start.elapsed();

    let pool = Pool::new(PoolConfig::default())?;
    let mut parallel = inputs;
    let start = Instant::now();
    pool.for_each(|value: &mut u64| *value = crunch(*value), &mut parallel)?;
    let parallel_time = start.elapsed();

    assert_eq!(serial, parallel);
    println!(
        "serial: {serial_time:?}, parallel on {} workers: {parallel_time:?}",
        pool.size()
    );

    pool.shutdown();
    Ok(())
}
