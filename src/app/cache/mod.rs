//! Thumbnail cache with per-key locking and atomic operations
//!
//! This module stores one resized PNG per model thumbnail in a single flat
//! directory. It prevents duplicate downloads by serialising work on each key
//! and never exposes a partially written file.
//!
//! # Key Features
//!
//! - **OS-specific cache directories**: Uses the standard system cache location
//! - **Per-key locking**: Concurrent requests for one key download once
//! - **Atomic operations**: Temp file in the cache directory + rename
//! - **Bounded thumbnails**: Decoded and resized to a maximum edge, stored as PNG
//! - **Collision-safe names**: Keys combine the model id with a URL digest
//!
//! # Module Organization
//!
//! - [`config`] - Configuration types and defaults
//! - [`key`] - Cache key derivation
//! - [`entry`] - Per-key state tracking
//! - [`stats`] - Cache statistics and disk usage
//! - [`manager`] - The cache itself
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use civitai_browser::app::cache::{CacheConfig, CacheKey, ImageCache};
//! use civitai_browser::app::client::{ClientConfig, HttpHandler};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = Arc::new(HttpHandler::new(&ClientConfig::default())?);
//! let cache = ImageCache::new(CacheConfig::default(), transport).await?;
//!
//! let url = "https://image.civitai.com/example/preview.jpeg";
//! let key = CacheKey::for_model(4201, url);
//! let entry = cache.get_or_fetch(&key, url).await;
//! if entry.is_ready() {
//!     println!("Thumbnail at {}", entry.local_path.display());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod entry;
pub mod key;
pub mod manager;
pub mod stats;

#[cfg(test)]
mod tests;

// Re-export main public API
pub use config::CacheConfig;
pub use entry::{CacheEntry, CacheState};
pub use key::CacheKey;
pub use manager::ImageCache;
pub use stats::CacheStats;
