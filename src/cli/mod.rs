//! Command-line interface components
//!
//! This module contains CLI-specific code for the CivitAI browser,
//! including argument parsing, command handlers and terminal presentation.

pub mod args;
pub mod commands;
pub mod progress;

pub use args::{
    BrowseArgs, CacheAction, CacheArgs, Cli, Commands, ConfigAction, ConfigArgs, GlobalArgs,
};
pub use commands::{handle_browse, handle_cache, handle_config};
pub use progress::{ProgressConfig, ThumbnailProgress};
