//! CivitAI Browser Library
//!
//! The responsive core of a CivitAI model browser: paginated listing fetches
//! where only the most recent request is ever delivered, and an on-disk
//! thumbnail cache that downloads each image at most once.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
