//! # workpool
//!
//! A fixed-size worker thread pool with a bounded backpressure queue and
//! per-item completion tracking.
//!
//! Callers submit units of work (closures with no arguments and no return
//! value); a fixed set of background OS threads executes them. The pool
//! enforces backpressure by blocking producers when the queue is at capacity,
//! and every submitted item carries an observable lifecycle state that other
//! threads can wait on.
//!
//! ## Core pieces
//!
//! - [`core::BoundedQueue`]: thread-safe FIFO with optional capacity; blocks
//!   producers when full and consumers when empty.
//! - [`core::WorkHandle`]: handle to a submitted item with a monotonic state
//!   machine (`Queued -> Running -> Completed/Errored`, or
//!   `Queued -> Cancelled`) and a blocking `wait()`.
//! - [`core::Pool`]: owns the queue and the workers; exposes submission,
//!   bulk waiting, shutdown, and parallel-map convenience operations.
//!
//! ## Example
//!
//! ```
//! use workpool::{Pool, PoolConfig};
//!
//! let pool = Pool::new(PoolConfig::new().with_worker_count(4)).unwrap();
//!
//! let mut handles = Vec::new();
//! for i in 0..8 {
//!     handles.push(pool.submit(move || { let _ = i * i; }).unwrap());
//! }
//! pool.wait_all(&handles);
//! assert!(handles.iter().all(|h| h.is_completed()));
//!
//! pool.shutdown();
//! ```
//!
//! ## Failure semantics
//!
//! A panic inside a submitted closure is caught at the worker boundary and
//! converted into the `Errored` terminal state; it never unwinds into the
//! submitter or takes down the worker thread. Callers observe failures by
//! inspecting the handle state after `wait()`, or through a
//! [`core::FailureObserver`] registered on the pool.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![warn(clippy::all)]

/// Core queue, work item, worker, and pool primitives.
pub mod core;
/// Configuration models for the pool.
pub mod config;
/// Shared utilities.
pub mod util;

pub use crate::config::PoolConfig;
pub use crate::core::{
    AppResult, BoundedQueue, FailureInfo, FailureObserver, Pool, PoolError, WorkHandle, WorkState,
};
