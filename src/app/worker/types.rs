//! Worker type definitions
//!
//! Jobs flow from the coordinator to the lanes, outcomes flow back. Both carry
//! the generation they were issued under so the coordinator can tell stale
//! results from current ones.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::app::cache::CacheKey;
use crate::app::models::{ModelPage, PageQuery};
use crate::errors::FetchResult;

/// Unit of network work executed on a lane
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    /// Fetch one listing page
    FetchPage { generation: u64, query: PageQuery },
    /// Fetch (or reuse) one thumbnail
    FetchThumbnail {
        generation: u64,
        model_id: u64,
        key: CacheKey,
        url: String,
    },
}

impl Job {
    /// Generation the job was issued under
    pub fn generation(&self) -> u64 {
        match self {
            Job::FetchPage { generation, .. } | Job::FetchThumbnail { generation, .. } => {
                *generation
            }
        }
    }
}

/// Result of a thumbnail job: the published file, or why there is none
pub type ThumbnailResult = Result<PathBuf, String>;

/// What a lane reports back after finishing a job
#[derive(Debug, Clone)]
pub enum JobOutcome {
    Page {
        generation: u64,
        result: FetchResult<ModelPage>,
    },
    Thumbnail {
        generation: u64,
        model_id: u64,
        result: ThumbnailResult,
    },
    /// A page job was superseded before a lane started it
    Skipped { generation: u64 },
}

/// Counters shared by every lane of a pool
#[derive(Debug, Default)]
pub struct PoolCounters {
    dispatched: AtomicU64,
    completed: AtomicU64,
    skipped: AtomicU64,
    timed_out: AtomicU64,
}

impl PoolCounters {
    pub fn record_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_timed_out(&self) {
        self.timed_out.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, worker_count: usize) -> WorkerPoolStats {
        WorkerPoolStats {
            worker_count,
            jobs_dispatched: self.dispatched.load(Ordering::Relaxed),
            jobs_completed: self.completed.load(Ordering::Relaxed),
            jobs_skipped: self.skipped.load(Ordering::Relaxed),
            jobs_timed_out: self.timed_out.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time pool statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WorkerPoolStats {
    pub worker_count: usize,
    pub jobs_dispatched: u64,
    /// Jobs that ran to an outcome, including failed and timed-out ones
    pub jobs_completed: u64,
    /// Jobs dropped unrun because a newer generation was issued
    pub jobs_skipped: u64,
    /// Page fetches that hit their deadline
    pub jobs_timed_out: u64,
}

impl WorkerPoolStats {
    /// Jobs queued or running
    pub fn in_flight(&self) -> u64 {
        self.jobs_dispatched
            .saturating_sub(self.jobs_completed + self.jobs_skipped)
    }
}
