//! Prelude module for the CivitAI browser library
//!
//! This module re-exports the most commonly used items from the library,
//! providing a convenient way to import everything needed for typical usage
//! with a single `use civitai_browser::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use civitai_browser::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client_config = ClientConfig::default();
//!     let transport: Arc<dyn HttpTransport> = Arc::new(HttpHandler::new(&client_config)?);
//!     let fetcher = PageFetcher::new(transport.clone(), &client_config.api_base_url)?;
//!     let cache = Arc::new(ImageCache::new(CacheConfig::default(), transport).await?);
//!
//!     let (coordinator, mut events) =
//!         FetchCoordinator::start(CoordinatorConfig::default(), fetcher, cache)?;
//!     coordinator.request_page(PageQuery::first(DEFAULT_ITEMS_PER_PAGE)?)?;
//!
//!     if let Some(PresentationEvent::PageReady(page)) = events.recv().await {
//!         println!("{}", page.label());
//!     }
//!     coordinator.shutdown().await?;
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, FetchError, Result};

// Essential app components that are used in most integrations
pub use crate::app::{
    CacheConfig, CacheKey, CacheStats, ClientConfig, CoordinatorConfig, FetchCoordinator,
    HttpHandler, HttpTransport, ImageCache, ModelPage, ModelSummary, Navigation, PageFetcher,
    PageQuery, PresentationEvent,
};

pub use crate::config::AppConfig;

// Commonly used constants
pub use crate::constants::{DEFAULT_ITEMS_PER_PAGE, DEFAULT_WORKER_COUNT, USER_AGENT};

// Standard library re-exports that are commonly needed
pub use std::path::{Path, PathBuf};
pub use std::sync::Arc;

pub use tokio;
