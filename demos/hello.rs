//! Minimal pool usage: submit a handful of tasks and wait on their handles.
//!
//! Run with `cargo run --example hello`.

use workpool::util::telemetry::init_tracing;
use workpool::{AppResult, Pool, PoolConfig};

fn main() -> AppResult<()> {
    init_tracing();

    let pool = Pool::new(PoolConfig::new().with_worker_count(4))?;

    let mut handles = Vec::new();
    for i in 0..8 {
        handles.push(pool.submit(move || {
            println!("hello from task {i} on {:?}", std::thread::current().name());
        })?);
    }

    pool.wait_all(&handles);
    println!("all {} tasks terminal", handles.len());

    pool.shutdown();
    Ok(())
}
