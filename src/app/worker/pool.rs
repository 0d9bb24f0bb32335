//! Worker pool management and coordination
//!
//! This module provides a WorkerPool that owns a fixed number of fetch lanes
//! fed from two bounded job queues, one for pages and one for thumbnails,
//! handling their lifecycle and graceful shutdown.

use std::sync::Arc;

use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::config::WorkerConfig;
use super::core::{FetchWorker, JobQueues};
use super::types::{Job, JobOutcome, PoolCounters, WorkerPoolStats};
use crate::app::cache::ImageCache;
use crate::app::client::PageFetcher;
use crate::errors::CoordinatorError;

/// Pool of fetch lanes sharing the job queues
#[derive(Debug)]
pub struct WorkerPool {
    /// Worker configuration
    config: WorkerConfig,
    page_tx: mpsc::Sender<Job>,
    thumbnail_tx: mpsc::Sender<Job>,
    /// Latest generation, watched by every lane
    generation_tx: watch::Sender<u64>,
    /// Worker task handles
    worker_handles: Vec<JoinHandle<()>>,
    /// Shutdown signal senders
    shutdown_senders: Vec<mpsc::Sender<()>>,
    counters: Arc<PoolCounters>,
    /// Pool state
    state: PoolState,
}

/// Current state of the worker pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    /// Pool is running with active workers
    Running,
    /// Pool is shutting down
    ShuttingDown,
    /// Pool has been shut down
    Shutdown,
}

impl WorkerPool {
    /// Spawn `config.worker_count` lanes
    ///
    /// Every finished job is reported on `outcomes`.
    ///
    /// # Errors
    ///
    /// Returns `CoordinatorError::Configuration` if the configuration is invalid
    pub fn start(
        config: WorkerConfig,
        fetcher: PageFetcher,
        cache: Arc<ImageCache>,
        outcomes: mpsc::UnboundedSender<JobOutcome>,
    ) -> Result<Self, CoordinatorError> {
        config.validate()?;

        info!("Starting {} workers", config.worker_count);

        let (page_tx, page_rx) = mpsc::channel(config.queue_capacity);
        let (thumbnail_tx, thumbnail_rx) = mpsc::channel(config.queue_capacity);
        let (generation_tx, generation_rx) = watch::channel(0);
        let queues = JobQueues {
            pages: Arc::new(Mutex::new(page_rx)),
            thumbnails: Arc::new(Mutex::new(thumbnail_rx)),
            latest: generation_rx,
        };
        let counters = Arc::new(PoolCounters::default());

        let mut worker_handles = Vec::with_capacity(config.worker_count);
        let mut shutdown_senders = Vec::with_capacity(config.worker_count);

        for worker_id in 0..config.worker_count {
            let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

            let worker = FetchWorker::new(
                worker_id as u32,
                config.clone(),
                fetcher.clone(),
                cache.clone(),
                queues.clone(),
                outcomes.clone(),
                counters.clone(),
                shutdown_rx,
            );

            worker_handles.push(tokio::spawn(worker.run()));
            shutdown_senders.push(shutdown_tx);
        }

        Ok(Self {
            config,
            page_tx,
            thumbnail_tx,
            generation_tx,
            worker_handles,
            shutdown_senders,
            counters,
            state: PoolState::Running,
        })
    }

    /// Mark every job issued before `generation` as superseded
    ///
    /// Lanes skip such jobs instead of running them. Older generations are
    /// ignored, so the watched value only moves forward.
    pub fn advance_generation(&self, generation: u64) {
        self.generation_tx.send_if_modified(|latest| {
            if generation > *latest {
                *latest = generation;
                true
            } else {
                false
            }
        });
    }

    /// Queue a job for the next free lane
    ///
    /// Page jobs go to their own queue, which lanes drain before thumbnails.
    /// Waits only when the target queue is full.
    ///
    /// # Errors
    ///
    /// Returns `CoordinatorError::Closed` once the pool is shut down
    pub async fn dispatch(&self, job: Job) -> Result<(), CoordinatorError> {
        if self.state != PoolState::Running {
            return Err(CoordinatorError::Closed);
        }

        let queue = match job {
            Job::FetchPage { .. } => &self.page_tx,
            Job::FetchThumbnail { .. } => &self.thumbnail_tx,
        };
        queue.send(job).await.map_err(|_| CoordinatorError::Closed)?;
        self.counters.record_dispatched();
        Ok(())
    }

    /// Shutdown all workers gracefully
    ///
    /// Jobs already running finish; jobs still queued are dropped.
    pub async fn shutdown(&mut self) {
        if self.state == PoolState::Shutdown {
            return;
        }

        self.state = PoolState::ShuttingDown;
        info!("Shutting down worker pool");

        for shutdown_tx in self.shutdown_senders.drain(..) {
            let _ = shutdown_tx.send(()).await; // Worker might already be done
        }

        let mut panicked = 0;
        for handle in self.worker_handles.drain(..) {
            if let Err(e) = handle.await {
                debug!("Worker panicked: {}", e);
                panicked += 1;
            }
        }

        if panicked > 0 {
            warn!("{} workers panicked before shutdown", panicked);
        }

        self.state = PoolState::Shutdown;
        info!("Worker pool shutdown complete");
    }

    /// Get the current pool state
    pub fn state(&self) -> PoolState {
        self.state
    }

    /// Get pool configuration
    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Get current pool statistics
    pub fn stats(&self) -> WorkerPoolStats {
        self.counters.snapshot(self.config.worker_count)
    }
}
