//! Core fetch worker implementation
//!
//! A worker is one lane: it takes the next job from the shared queues, page
//! jobs first, runs it and reports the outcome. Jobs issued under a generation
//! older than the latest one are skipped without touching the network; the
//! coordinator still decides which results are delivered.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, info, warn};

use super::config::WorkerConfig;
use super::types::{Job, JobOutcome, PoolCounters, ThumbnailResult};
use crate::app::cache::{CacheKey, CacheState, ImageCache};
use crate::app::client::PageFetcher;
use crate::app::models::{ModelPage, PageQuery};
use crate::errors::{FetchError, FetchResult};

/// Shared receiving end of one job queue
pub type JobReceiver = Arc<Mutex<mpsc::Receiver<Job>>>;

/// Everything a lane reads work from
#[derive(Debug, Clone)]
pub struct JobQueues {
    /// Page fetches, always taken before thumbnails
    pub pages: JobReceiver,
    pub thumbnails: JobReceiver,
    /// Latest generation issued by the coordinator
    pub latest: watch::Receiver<u64>,
}

impl JobQueues {
    /// Wait for the next job, preferring page fetches
    async fn next(&self) -> Option<Job> {
        tokio::select! {
            biased;
            job = Self::recv(&self.pages) => job,
            job = Self::recv(&self.thumbnails) => job,
        }
    }

    async fn recv(queue: &JobReceiver) -> Option<Job> {
        queue.lock().await.recv().await
    }

    /// A job from an older generation can no longer be delivered
    fn is_superseded(&self, job: &Job) -> bool {
        job.generation() < *self.latest.borrow()
    }
}

/// One fetch lane
#[derive(Debug)]
pub struct FetchWorker {
    /// Worker identifier, for logs
    id: u32,
    config: WorkerConfig,
    fetcher: PageFetcher,
    cache: Arc<ImageCache>,
    queues: JobQueues,
    outcomes: mpsc::UnboundedSender<JobOutcome>,
    counters: Arc<PoolCounters>,
    shutdown_rx: mpsc::Receiver<()>,
}

impl FetchWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u32,
        config: WorkerConfig,
        fetcher: PageFetcher,
        cache: Arc<ImageCache>,
        queues: JobQueues,
        outcomes: mpsc::UnboundedSender<JobOutcome>,
        counters: Arc<PoolCounters>,
        shutdown_rx: mpsc::Receiver<()>,
    ) -> Self {
        Self {
            id,
            config,
            fetcher,
            cache,
            queues,
            outcomes,
            counters,
            shutdown_rx,
        }
    }

    /// Start the worker loop
    ///
    /// Returns when a shutdown signal arrives, the job queues close, or
    /// nobody is listening for outcomes any more.
    pub async fn run(mut self) {
        debug!("Worker {} ready for work", self.id);

        loop {
            let job = tokio::select! {
                biased;
                _ = self.shutdown_rx.recv() => {
                    info!("Worker {} received shutdown signal", self.id);
                    break;
                }
                job = self.queues.next() => job,
            };

            let Some(job) = job else {
                debug!("Worker {} found the job queue closed", self.id);
                break;
            };

            let outcome = if self.queues.is_superseded(&job) {
                self.counters.record_skipped();
                debug!(worker = self.id, generation = job.generation(), "Skipping superseded job");
                match job {
                    Job::FetchPage { generation, .. } => JobOutcome::Skipped { generation },
                    Job::FetchThumbnail { .. } => continue,
                }
            } else {
                let outcome = self.process(job).await;
                self.counters.record_completed();
                outcome
            };

            if self.outcomes.send(outcome).is_err() {
                debug!("Worker {} has no outcome listener, stopping", self.id);
                break;
            }
        }

        debug!("Worker {} shutting down", self.id);
    }

    async fn process(&self, job: Job) -> JobOutcome {
        match job {
            Job::FetchPage { generation, query } => {
                debug!(worker = self.id, generation, page = query.page(), "Fetching page");
                JobOutcome::Page {
                    generation,
                    result: self.fetch_page(&query).await,
                }
            }
            Job::FetchThumbnail {
                generation,
                model_id,
                key,
                url,
            } => {
                debug!(worker = self.id, generation, model_id, key = %key, "Fetching thumbnail");
                JobOutcome::Thumbnail {
                    generation,
                    model_id,
                    result: self.fetch_thumbnail(&key, &url).await,
                }
            }
        }
    }

    async fn fetch_page(&self, query: &PageQuery) -> FetchResult<ModelPage> {
        match tokio::time::timeout(self.config.page_timeout, self.fetcher.fetch(query)).await {
            Ok(result) => result,
            Err(_) => {
                self.counters.record_timed_out();
                warn!(
                    "Worker {} page {} fetch exceeded {:?}",
                    self.id,
                    query.page(),
                    self.config.page_timeout
                );
                Err(FetchError::Timeout {
                    seconds: whole_seconds(self.config.page_timeout),
                })
            }
        }
    }

    /// The cache applies its own download deadline and always resolves the entry
    async fn fetch_thumbnail(&self, key: &CacheKey, url: &str) -> ThumbnailResult {
        let entry = self.cache.get_or_fetch(key, url).await;

        match entry.state {
            CacheState::Ready => Ok(entry.local_path),
            CacheState::Failed { error } => Err(error),
            other => Err(format!("thumbnail left in state {:?}", other)),
        }
    }
}

fn whole_seconds(duration: Duration) -> u64 {
    duration.as_secs().max(1)
}
