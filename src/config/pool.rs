//! Pool configuration structures.

use serde::{Deserialize, Serialize};

/// Upper bound on configurable worker threads; guards against runaway
/// configuration values taking the process down.
const MAX_WORKER_COUNT: usize = 1024;

/// Worker pool configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Number of worker threads. `0` (the default) selects a
    /// platform-derived parallelism hint, with a minimum of two workers.
    #[serde(default)]
    pub worker_count: usize,
    /// Maximum queued work items before producers block. `0` (the default)
    /// means unbounded.
    #[serde(default)]
    pub queue_capacity: usize,
}

impl PoolConfig {
    /// Default configuration: automatic worker count, unbounded queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an explicit worker count; `0` keeps automatic selection.
    #[must_use]
    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Bound the queue at `queue_capacity` items; `0` keeps it unbounded.
    #[must_use]
    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    /// The worker count the pool will actually start: the configured value,
    /// or the platform parallelism hint (minimum 2) when unset.
    pub fn effective_worker_count(&self) -> usize {
        if self.worker_count == 0 {
            num_cpus::get().max(2)
        } else {
            self.worker_count
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.worker_count > MAX_WORKER_COUNT {
            return Err(format!(
                "worker_count must not exceed {MAX_WORKER_COUNT}"
            ));
        }
        Ok(())
    }

    /// Parse pool configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: PoolConfig =
            serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_chain() {
        let cfg = PoolConfig::new().with_worker_count(4).with_queue_capacity(16);
        assert_eq!(cfg.worker_count, 4);
        assert_eq!(cfg.queue_capacity, 16);
        assert_eq!(cfg.effective_worker_count(), 4);
    }

    #[test]
    fn test_effective_worker_count_minimum() {
        let cfg = PoolConfig::new();
        assert!(cfg.effective_worker_count() >= 2);
    }

    #[test]
    fn test_validate_rejects_excessive_worker_count() {
        let cfg = PoolConfig::new().with_worker_count(MAX_WORKER_COUNT + 1);
        assert!(cfg.validate().is_err());
        assert!(PoolConfig::new().with_worker_count(MAX_WORKER_COUNT).validate().is_ok());
    }

    #[test]
    fn test_from_json_str() {
        let cfg = PoolConfig::from_json_str(r#"{"worker_count": 8, "queue_capacity": 32}"#).unwrap();
        assert_eq!(cfg.worker_count, 8);
        assert_eq!(cfg.queue_capacity, 32);

        // Missing fields fall back to defaults.
        let cfg = PoolConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg.worker_count, 0);
        assert_eq!(cfg.queue_capacity, 0);

        assert!(PoolConfig::from_json_str("not json").is_err());
    }
}
