//! The coordinator task
//!
//! A single task owns the current generation, the active page and the task
//! history, and is the only code that changes them. Commands from handles and
//! outcomes from the worker lanes arrive as messages and are applied one at a
//! time.

use std::ops::ControlFlow;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::app::cache::CacheKey;
use crate::app::models::{ModelPage, PageQuery};
use crate::app::worker::{Job, JobOutcome, WorkerPool};
use crate::errors::{FetchError, FetchResult};

use super::config::CoordinatorConfig;
use super::events::{Command, Navigation, PresentationEvent};
use super::task::{FetchTask, TaskHistory, TaskStatus};
use super::CoordinatorSnapshot;

pub(crate) struct Actor {
    config: CoordinatorConfig,
    pool: WorkerPool,
    commands: mpsc::UnboundedReceiver<Command>,
    outcomes: mpsc::UnboundedReceiver<JobOutcome>,
    events: mpsc::UnboundedSender<PresentationEvent>,
    /// Latest generation issued; only results tagged with it are delivered
    generation: u64,
    active_page: Option<ModelPage>,
    tasks: TaskHistory,
}

impl Actor {
    pub(crate) fn new(
        config: CoordinatorConfig,
        pool: WorkerPool,
        commands: mpsc::UnboundedReceiver<Command>,
        outcomes: mpsc::UnboundedReceiver<JobOutcome>,
        events: mpsc::UnboundedSender<PresentationEvent>,
    ) -> Self {
        let tasks = TaskHistory::new(config.task_history);
        Self {
            config,
            pool,
            commands,
            outcomes,
            events,
            generation: 0,
            active_page: None,
            tasks,
        }
    }

    /// Process messages until shut down or every handle is dropped
    pub(crate) async fn run(mut self) {
        info!("Fetch coordinator started");

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => {
                        if self.handle_command(command).await.is_break() {
                            return;
                        }
                    }
                    None => {
                        debug!("All coordinator handles dropped");
                        self.stop().await;
                        return;
                    }
                },
                Some(outcome) = self.outcomes.recv() => self.handle_outcome(outcome).await,
            }
        }
    }

    async fn stop(&mut self) {
        self.pool.shutdown().await;
        info!(generation = self.generation, "Fetch coordinator stopped");
    }

    async fn handle_command(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::RequestPage(query) => self.request(query).await,
            Command::Navigate(navigation) => match self.resolve(navigation) {
                Ok(query) => self.request(query).await,
                Err(e) => self.reject(e),
            },
            Command::RequestThumbnail { model_id, url } => {
                self.dispatch_thumbnail(self.generation, model_id, url)
                    .await;
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
            Command::Shutdown(ack) => {
                self.stop().await;
                let _ = ack.send(());
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    /// Issue a new generation for `query` and hand it to a lane
    async fn request(&mut self, query: PageQuery) {
        if let Err(e) = self.check_range(&query) {
            self.reject(e);
            return;
        }

        self.generation += 1;
        let generation = self.generation;
        self.tasks.push(FetchTask::new(generation, query.clone()));
        self.pool.advance_generation(generation);

        info!(
            generation,
            page = query.page(),
            search = query.search().unwrap_or(""),
            "Requesting page"
        );

        if let Err(e) = self.pool.dispatch(Job::FetchPage { generation, query }).await {
            error!(generation, "Could not dispatch page fetch: {}", e);
            self.tasks.resolve(
                generation,
                TaskStatus::Failed {
                    reason: e.to_string(),
                },
            );
        }
    }

    /// Reject a request that can be decided without the network
    fn reject(&self, error: FetchError) {
        warn!("Navigation rejected: {}", error);
        self.emit(PresentationEvent::PageFailed(error));
    }

    /// A page outside the active listing's known range is never requested
    fn check_range(&self, query: &PageQuery) -> FetchResult<()> {
        let Some(active) = &self.active_page else {
            return Ok(());
        };

        let same_listing = active.query.page_size() == query.page_size()
            && active.query.search() == query.search();
        if same_listing && active.total_pages > 0 && !active.contains_page(query.page()) {
            return Err(FetchError::PageOutOfRange {
                requested: query.page(),
                total: active.total_pages,
            });
        }
        Ok(())
    }

    /// Turn a navigation command into a concrete query
    fn resolve(&self, navigation: Navigation) -> FetchResult<PageQuery> {
        let base = match &self.active_page {
            Some(page) => page.query.clone(),
            None => PageQuery::first(self.config.items_per_page)?,
        };

        match navigation {
            Navigation::Next => {
                let page = self.loaded_page()?;
                if !page.has_next() {
                    return Err(FetchError::PageOutOfRange {
                        requested: page.current_page + 1,
                        total: page.total_pages,
                    });
                }
                base.with_page(page.current_page + 1)
            }
            Navigation::Previous => {
                let page = self.loaded_page()?;
                if !page.has_previous() {
                    return Err(FetchError::PageOutOfRange {
                        requested: page.current_page.saturating_sub(1),
                        total: page.total_pages,
                    });
                }
                base.with_page(page.current_page - 1)
            }
            Navigation::GoTo(number) => base.with_page(number),
            Navigation::Search(text) => base.with_search(Some(text)),
            Navigation::Home => PageQuery::first(base.page_size()),
        }
    }

    fn loaded_page(&self) -> FetchResult<&ModelPage> {
        self.active_page.as_ref().ok_or_else(|| FetchError::InvalidQuery {
            reason: "no page has been loaded yet".to_string(),
        })
    }

    async fn handle_outcome(&mut self, outcome: JobOutcome) {
        match outcome {
            JobOutcome::Page { generation, result } => self.on_page(generation, result).await,
            JobOutcome::Skipped { generation } => {
                debug!(generation, "Superseded page was never fetched");
                self.tasks.resolve(generation, TaskStatus::Superseded);
            }
            JobOutcome::Thumbnail {
                generation,
                model_id,
                result,
            } => {
                if generation != self.generation {
                    debug!(generation, model_id, "Dropping stale thumbnail");
                    return;
                }
                match result {
                    Ok(path) => {
                        self.emit(PresentationEvent::ThumbnailReady { model_id, path })
                    }
                    Err(reason) => {
                        self.emit(PresentationEvent::ThumbnailFailed { model_id, reason })
                    }
                }
            }
        }
    }

    async fn on_page(&mut self, generation: u64, result: FetchResult<ModelPage>) {
        if generation != self.generation {
            debug!(
                generation,
                current = self.generation,
                "Discarding superseded page result"
            );
            self.tasks.resolve(generation, TaskStatus::Superseded);
            return;
        }

        match result {
            Ok(page) => {
                info!(generation, "{} with {} models", page.label(), page.items.len());
                self.tasks.resolve(generation, TaskStatus::Completed);

                let targets: Vec<(u64, String)> = if self.config.auto_thumbnails {
                    page.thumbnail_targets()
                        .map(|(model_id, url)| (model_id, url.to_string()))
                        .collect()
                } else {
                    Vec::new()
                };

                self.active_page = Some(page.clone());
                self.emit(PresentationEvent::PageReady(page));

                for (model_id, url) in targets {
                    self.dispatch_thumbnail(generation, model_id, url).await;
                }
            }
            Err(e) => {
                warn!(generation, "Page fetch failed: {}", e);
                self.tasks.resolve(
                    generation,
                    TaskStatus::Failed {
                        reason: e.to_string(),
                    },
                );
                self.emit(PresentationEvent::PageFailed(e));
            }
        }
    }

    async fn dispatch_thumbnail(&self, generation: u64, model_id: u64, url: String) {
        let job = Job::FetchThumbnail {
            generation,
            model_id,
            key: CacheKey::for_model(model_id, &url),
            url,
        };
        if let Err(e) = self.pool.dispatch(job).await {
            error!(model_id, "Could not dispatch thumbnail fetch: {}", e);
        }
    }

    fn emit(&self, event: PresentationEvent) {
        if self.events.send(event).is_err() {
            debug!("Presentation layer is gone; event dropped");
        }
    }

    fn snapshot(&self) -> CoordinatorSnapshot {
        CoordinatorSnapshot {
            generation: self.generation,
            active_page: self.active_page.clone(),
            tasks: self.tasks.to_vec(),
            pool: self.pool.stats(),
        }
    }
}
