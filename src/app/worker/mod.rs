//! Fetch worker system for concurrent network operations
//!
//! This module implements the small fixed-size pool of lanes that perform
//! every network operation of the browser. The coordinator queues jobs, idle
//! lanes pick them up, and each outcome is sent back as a message. Nothing in
//! this module touches the coordinator's state.
//!
//! # Key Features
//!
//! - **Bounded concurrency**: A fixed number of lanes, no task per request
//! - **Page priority**: Idle lanes take queued page jobs before thumbnails
//! - **Stale skipping**: Jobs from a superseded generation are dropped unrun
//! - **Page deadlines**: A page fetch runs under a timeout; thumbnail
//!   downloads are bounded inside the cache
//! - **Graceful shutdown**: Running jobs finish, queued jobs are dropped
//!
//! # Module Organization
//!
//! - [`config`] - Worker configuration with validation
//! - [`types`] - Jobs, outcomes and counters
//! - [`core`] - Individual worker implementation
//! - [`pool`] - Worker pool management
//!
//! # Basic Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use civitai_browser::app::cache::{CacheConfig, ImageCache};
//! use civitai_browser::app::client::{ClientConfig, HttpHandler, PageFetcher};
//! use civitai_browser::app::models::PageQuery;
//! use civitai_browser::app::worker::{Job, JobOutcome, WorkerConfig, WorkerPool};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client_config = ClientConfig::default();
//! let transport = Arc::new(HttpHandler::new(&client_config)?);
//! let fetcher = PageFetcher::new(transport.clone(), &client_config.api_base_url)?;
//! let cache = Arc::new(ImageCache::new(CacheConfig::default(), transport).await?);
//!
//! let (outcome_tx, mut outcome_rx) = tokio::sync::mpsc::unbounded_channel();
//! let mut pool = WorkerPool::start(WorkerConfig::default(), fetcher, cache, outcome_tx)?;
//!
//! pool.dispatch(Job::FetchPage { generation: 1, query: PageQuery::first(10)? }).await?;
//! if let Some(JobOutcome::Page { result, .. }) = outcome_rx.recv().await {
//!     println!("{} models", result?.items.len());
//! }
//!
//! pool.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod pool;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export main public API
pub use config::WorkerConfig;
pub use self::core::FetchWorker;
pub use pool::{PoolState, WorkerPool};
pub use types::{Job, JobOutcome, ThumbnailResult, WorkerPoolStats};
