//! Error types for pool operations.

use thiserror::Error;

/// Errors produced by the worker pool.
///
/// Note what is *not* here: a full queue is backpressure, resolved by
/// blocking the producer, and a panicking payload is contained at the worker
/// boundary and surfaced as the `Errored` item state. Neither is an `Err`.
#[derive(Debug, Error)]
pub enum PoolError {
    /// The pool has been shut down and accepts no further submissions.
    #[error("pool has been stopped")]
    PoolStopped,
    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A worker thread could not be spawned.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_error_display() {
        assert_eq!(format!("{}", PoolError::PoolStopped), "pool has been stopped");
        assert_eq!(
            format!("{}", PoolError::InvalidConfig("bad".into())),
            "invalid configuration: bad"
        );
    }
}
