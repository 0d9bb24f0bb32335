//! Core application logic for the CivitAI browser
//!
//! This module contains the main application components: the data models, the
//! HTTP client and listing fetcher, the thumbnail cache, the worker pool and
//! the coordinator that ties them together for a presentation layer.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use civitai_browser::app::{ClientConfig, HttpHandler, PageFetcher, PageQuery};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::default();
//! let transport = Arc::new(HttpHandler::new(&config)?);
//! let fetcher = PageFetcher::new(transport, &config.api_base_url)?;
//!
//! let page = fetcher.fetch(&PageQuery::new(1, 10, Some("anime".to_string()))?).await?;
//! for model in &page.items {
//!     println!("{} {}", model.display_id(), model.name);
//! }
//! println!("{}", page.label());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod coordinator;
pub mod models;
pub mod worker;

// Re-export main public API
pub use cache::{CacheConfig, CacheEntry, CacheKey, CacheState, CacheStats, ImageCache};
pub use client::{ClientConfig, HttpHandler, HttpTransport, PageFetcher};
pub use coordinator::{
    CoordinatorConfig, CoordinatorSnapshot, FetchCoordinator, FetchTask, Navigation,
    PresentationEvent, PresentationReceiver, TaskStatus,
};
pub use models::{ModelPage, ModelSummary, ModelVersion, PageQuery};
pub use worker::{WorkerConfig, WorkerPool};
