//! Core queue, work item, worker, and pool primitives.

pub mod error;
pub mod pool;
pub mod queue;
pub mod work;

pub(crate) mod worker;

pub use error::{AppResult, PoolError};
pub use pool::Pool;
pub use queue::BoundedQueue;
pub use work::{FailureInfo, FailureObserver, WorkHandle, WorkState};
