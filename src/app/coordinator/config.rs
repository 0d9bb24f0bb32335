//! Configuration structures for the fetch coordinator
//!
//! This module defines the configuration options for coordinating page and
//! thumbnail fetches, including the worker pool settings.

use serde::{Deserialize, Serialize};

use crate::app::worker::WorkerConfig;
use crate::constants::{api, coordinator, paging};

/// Configuration for the fetch coordinator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Page size used by navigation commands
    pub items_per_page: u32,
    /// Number of finished fetch tasks kept for snapshots
    pub task_history: usize,
    /// Fetch the thumbnails of every accepted page
    pub auto_thumbnails: bool,
    /// Worker configuration
    pub worker_config: WorkerConfig,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            items_per_page: paging::DEFAULT_ITEMS_PER_PAGE,
            task_history: coordinator::TASK_HISTORY,
            auto_thumbnails: true,
            worker_config: WorkerConfig::default(),
        }
    }
}

impl CoordinatorConfig {
    /// Set the page size used by navigation commands
    pub fn with_items_per_page(mut self, items_per_page: u32) -> Self {
        self.items_per_page = items_per_page;
        self
    }

    /// Set the number of lanes
    pub fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_config.worker_count = count;
        self
    }

    /// Replace the worker configuration
    pub fn with_worker_config(mut self, worker_config: WorkerConfig) -> Self {
        self.worker_config = worker_config;
        self
    }

    /// Set how many tasks snapshots remember
    pub fn with_task_history(mut self, task_history: usize) -> Self {
        self.task_history = task_history;
        self
    }

    /// Enable or disable the per-page thumbnail fan-out
    pub fn with_auto_thumbnails(mut self, enabled: bool) -> Self {
        self.auto_thumbnails = enabled;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.items_per_page == 0 || self.items_per_page > api::MAX_PAGE_SIZE {
            return Err(format!(
                "Items per page must be between 1 and {}",
                api::MAX_PAGE_SIZE
            ));
        }

        if self.task_history == 0 {
            return Err("Task history cannot be zero".to_string());
        }

        self.worker_config.validate().map_err(|e| e.to_string())
    }
}
