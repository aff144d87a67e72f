//! Configuration types for the teardown orchestrator

use crate::wait::WaitConfig;
use cf_teardown_common::defaults::{DEFAULT_CONFLICT_RETRIES, DEFAULT_READ_RETRIES};

// Re-export harness settings so binaries only depend on this crate
pub use cf_teardown_common::HarnessConfig;

/// Orchestrator tuning
#[derive(Debug, Clone, PartialEq)]
pub struct TeardownConfig {
    /// Propagation polling after every accepted write
    pub wait: WaitConfig,
    /// Retries of a read that failed with a transient error
    pub read_retries: usize,
    /// Re-read-and-recompute attempts after a concurrency conflict
    pub conflict_retries: u32,
    /// Disable the distribution and wait for it before deleting
    pub disable_before_delete: bool,
}

impl Default for TeardownConfig {
    fn default() -> Self {
        Self {
            wait: WaitConfig::default(),
            read_retries: DEFAULT_READ_RETRIES,
            conflict_retries: DEFAULT_CONFLICT_RETRIES,
            disable_before_delete: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn defaults() {
        let config = TeardownConfig::default();
        assert_eq!(config.read_retries, 3);
        assert_eq!(config.conflict_retries, 1);
        assert!(!config.disable_before_delete);
        assert_eq!(config.wait.timeout, Duration::from_secs(600));
        assert_eq!(config.wait.initial_delay, Duration::from_secs(5));
        assert_eq!(config.wait.max_delay, Duration::from_secs(30));
    }
}
