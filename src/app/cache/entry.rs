//! Cache entry state tracking
//!
//! Every key the cache has seen owns one [`CacheEntry`] behind its own lock.
//! The entry records where the thumbnail lives and how the last attempt to
//! produce it went.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use super::key::CacheKey;

/// State of a cache entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheState {
    /// Never looked at, or the file has disappeared
    Missing,
    /// A download for this key is in progress
    Downloading,
    /// The thumbnail file is published at `local_path`
    Ready,
    /// The last attempt failed; the next reference tries again
    Failed { error: String },
}

/// One thumbnail slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub local_path: PathBuf,
    pub state: CacheState,
    /// When the state last changed
    pub updated_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Create a Missing entry
    pub fn new(key: CacheKey, local_path: PathBuf) -> Self {
        Self {
            key,
            local_path,
            state: CacheState::Missing,
            updated_at: Utc::now(),
        }
    }

    fn set_state(&mut self, state: CacheState) {
        self.state = state;
        self.updated_at = Utc::now();
    }

    pub fn mark_downloading(&mut self) {
        self.set_state(CacheState::Downloading);
    }

    pub fn mark_ready(&mut self) {
        self.set_state(CacheState::Ready);
    }

    pub fn mark_failed(&mut self, error: String) {
        self.set_state(CacheState::Failed { error });
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, CacheState::Ready)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, CacheState::Failed { .. })
    }

    /// Get the error message if the entry failed
    pub fn error(&self) -> Option<&str> {
        match &self.state {
            CacheState::Failed { error } => Some(error),
            _ => None,
        }
    }
}
