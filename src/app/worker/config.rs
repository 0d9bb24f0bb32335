//! Worker configuration management
//!
//! This module provides the configuration structure and validation for the
//! fetch lanes: how many there are, how deep their queues are and how long a
//! page fetch may run.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::workers;
use crate::errors::CoordinatorError;

/// Configuration for the worker pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Number of concurrent lanes to spawn
    pub worker_count: usize,
    /// Jobs that may wait for a free lane before dispatch applies backpressure
    pub queue_capacity: usize,
    /// Deadline for one listing page fetch
    pub page_timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            worker_count: workers::DEFAULT_WORKER_COUNT,
            queue_capacity: workers::JOB_QUEUE_CAPACITY,
            page_timeout: workers::PAGE_TIMEOUT,
        }
    }
}

impl WorkerConfig {
    /// Validate configuration values and return errors for invalid settings
    pub fn validate(&self) -> Result<(), CoordinatorError> {
        if self.worker_count == 0 {
            return Err(CoordinatorError::Configuration(
                "Worker count cannot be zero".to_string(),
            ));
        }

        if self.worker_count > workers::MAX_WORKER_COUNT {
            return Err(CoordinatorError::Configuration(format!(
                "Worker count ({}) exceeds maximum ({})",
                self.worker_count,
                workers::MAX_WORKER_COUNT
            )));
        }

        if self.queue_capacity == 0 {
            return Err(CoordinatorError::Configuration(
                "Job queue capacity cannot be zero".to_string(),
            ));
        }

        if self.page_timeout.is_zero() {
            return Err(CoordinatorError::Configuration(
                "Page timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Set the number of lanes
    pub fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_count = count;
        self
    }

    /// Set the page fetch deadline
    pub fn with_page_timeout(mut self, timeout: Duration) -> Self {
        self.page_timeout = timeout;
        self
    }
}
