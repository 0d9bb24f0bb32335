//! Cache configuration types and defaults
//!
//! This module contains the configuration structure for the thumbnail cache,
//! including default values and validation logic.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::thumbnails;

/// Configuration for the thumbnail cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Root directory for cache storage (OS-specific if None)
    pub cache_root: Option<PathBuf>,
    /// Longest edge of a stored thumbnail in pixels
    pub max_thumbnail_dimension: u32,
    /// Deadline for receiving one thumbnail body, connection included
    pub download_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_root: None, // Will use OS-specific cache directory
            max_thumbnail_dimension: thumbnails::MAX_DIMENSION,
            download_timeout: thumbnails::DOWNLOAD_TIMEOUT,
        }
    }
}

impl CacheConfig {
    /// Create a new cache configuration with custom cache root
    pub fn with_cache_root(cache_root: PathBuf) -> Self {
        Self {
            cache_root: Some(cache_root),
            ..Default::default()
        }
    }

    /// Set the thumbnail size bound
    pub fn with_max_thumbnail_dimension(mut self, dimension: u32) -> Self {
        self.max_thumbnail_dimension = dimension;
        self
    }

    /// Set the thumbnail download deadline
    pub fn with_download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = timeout;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_thumbnail_dimension == 0 {
            return Err("max_thumbnail_dimension must be greater than 0".to_string());
        }
        if self.download_timeout.is_zero() {
            return Err("download_timeout must be greater than 0".to_string());
        }
        Ok(())
    }
}
