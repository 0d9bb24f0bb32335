//! Fetch orchestration for the presentation layer
//!
//! This module provides the concurrency core of the browser. A
//! [`FetchCoordinator`] handle accepts page, navigation and thumbnail requests
//! without ever blocking; a single coordinator task applies them, dispatches
//! the network work onto the worker pool and turns results into
//! [`PresentationEvent`]s.
//!
//! # Key Features
//!
//! - **Last request wins**: Every page request gets a fresh generation and only
//!   the latest one is ever delivered
//! - **Single writer**: All mutable state lives in one task, fed by messages
//! - **Local rejection**: Navigation past the known page range never reaches
//!   the network
//! - **Thumbnail fan-out**: Accepted pages trigger one thumbnail fetch per item
//!   with an image, dropped if a newer page request arrives
//! - **Graceful shutdown**: Stops the coordinator task and its lanes
//!
//! # Architecture
//!
//! - [`config`] - Configuration structures and validation
//! - [`task`] - Generation-tagged fetch task bookkeeping
//! - [`events`] - Presentation events and navigation commands
//! - `actor` - The coordinator task itself
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use civitai_browser::app::cache::{CacheConfig, ImageCache};
//! use civitai_browser::app::client::{ClientConfig, HttpHandler, PageFetcher};
//! use civitai_browser::app::coordinator::{CoordinatorConfig, FetchCoordinator, PresentationEvent};
//! use civitai_browser::app::models::PageQuery;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client_config = ClientConfig::default();
//! let transport = Arc::new(HttpHandler::new(&client_config)?);
//! let fetcher = PageFetcher::new(transport.clone(), &client_config.api_base_url)?;
//! let cache = Arc::new(ImageCache::new(CacheConfig::default(), transport).await?);
//!
//! let (coordinator, mut events) =
//!     FetchCoordinator::start(CoordinatorConfig::default(), fetcher, cache)?;
//! coordinator.request_page(PageQuery::first(10)?)?;
//!
//! while let Some(event) = events.recv().await {
//!     match event {
//!         PresentationEvent::PageReady(page) => println!("{}", page.label()),
//!         PresentationEvent::ThumbnailReady { model_id, path } => {
//!             println!("{} -> {}", model_id, path.display())
//!         }
//!         _ => {}
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod actor;
pub mod config;
pub mod events;
pub mod task;


use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::app::cache::ImageCache;
use crate::app::client::PageFetcher;
use crate::app::models::{ModelPage, PageQuery};
use crate::app::worker::{WorkerPool, WorkerPoolStats};
use crate::errors::CoordinatorError;

use actor::Actor;
use events::Command;

pub use config::CoordinatorConfig;
pub use events::{Navigation, PresentationEvent};
pub use task::{FetchTask, TaskStatus};

/// Receiving end of the presentation events
pub type PresentationReceiver = mpsc::UnboundedReceiver<PresentationEvent>;

/// Point-in-time view of the coordinator state
#[derive(Debug, Clone)]
pub struct CoordinatorSnapshot {
    /// Latest generation issued
    pub generation: u64,
    /// Page currently shown, if any
    pub active_page: Option<ModelPage>,
    /// Recent page requests, oldest first
    pub tasks: Vec<FetchTask>,
    pub pool: WorkerPoolStats,
}

/// Cloneable handle to the coordinator task
///
/// Every command returns immediately; results arrive on the
/// [`PresentationReceiver`] returned by [`FetchCoordinator::start`].
#[derive(Debug, Clone)]
pub struct FetchCoordinator {
    commands: mpsc::UnboundedSender<Command>,
}

impl FetchCoordinator {
    /// Spawn the worker pool and the coordinator task
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `CoordinatorError::Configuration` if the configuration is invalid
    pub fn start(
        config: CoordinatorConfig,
        fetcher: PageFetcher,
        cache: Arc<ImageCache>,
    ) -> Result<(Self, PresentationReceiver), CoordinatorError> {
        config.validate().map_err(CoordinatorError::Configuration)?;

        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let pool = WorkerPool::start(config.worker_config.clone(), fetcher, cache, outcome_tx)?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let actor = Actor::new(config, pool, command_rx, outcome_rx, event_tx);
        tokio::spawn(actor.run());

        Ok((
            Self {
                commands: command_tx,
            },
            event_rx,
        ))
    }

    fn send(&self, command: Command) -> Result<(), CoordinatorError> {
        self.commands
            .send(command)
            .map_err(|_| CoordinatorError::Closed)
    }

    /// Request a page; supersedes every earlier request
    pub fn request_page(&self, query: PageQuery) -> Result<(), CoordinatorError> {
        self.send(Command::RequestPage(query))
    }

    /// Fetch one thumbnail outside the automatic per-page fan-out
    pub fn request_thumbnail(
        &self,
        model_id: u64,
        url: impl Into<String>,
    ) -> Result<(), CoordinatorError> {
        self.send(Command::RequestThumbnail {
            model_id,
            url: url.into(),
        })
    }

    /// Move within the listing relative to the active page
    pub fn navigate(&self, navigation: Navigation) -> Result<(), CoordinatorError> {
        self.send(Command::Navigate(navigation))
    }

    pub fn next_page(&self) -> Result<(), CoordinatorError> {
        self.navigate(Navigation::Next)
    }

    pub fn previous_page(&self) -> Result<(), CoordinatorError> {
        self.navigate(Navigation::Previous)
    }

    /// Jump to page `number` of the active listing
    pub fn go_to_page(&self, number: u32) -> Result<(), CoordinatorError> {
        self.navigate(Navigation::GoTo(number))
    }

    /// Page 1 filtered by `text`; blank text clears the filter
    pub fn search(&self, text: impl Into<String>) -> Result<(), CoordinatorError> {
        self.navigate(Navigation::Search(text.into()))
    }

    /// Page 1 without a search filter
    pub fn home(&self) -> Result<(), CoordinatorError> {
        self.navigate(Navigation::Home)
    }

    /// Current generation, active page, recent tasks and pool counters
    pub async fn snapshot(&self) -> Result<CoordinatorSnapshot, CoordinatorError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::Snapshot(reply_tx))?;
        reply_rx.await.map_err(|_| CoordinatorError::Closed)
    }

    /// Stop the coordinator task and its worker pool
    ///
    /// Waits until running jobs have finished. Calling it again after the
    /// coordinator has stopped returns `CoordinatorError::Closed`.
    pub async fn shutdown(&self) -> Result<(), CoordinatorError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.send(Command::Shutdown(ack_tx))?;
        ack_rx.await.map_err(|_| CoordinatorError::Closed)
    }
}
