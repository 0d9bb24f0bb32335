//! Command-line argument parsing for the CivitAI browser
//!
//! This module defines the CLI structure using clap derive macros,
//! providing a terminal interface for browsing the model listing and
//! managing the thumbnail cache and configuration.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::constants::api;

/// CivitAI Browser - Browse models hosted on CivitAI
#[derive(Parser, Debug)]
#[command(
    name = "civitai_browser",
    version,
    about = "Browse the CivitAI model listing from the terminal",
    long_about = "Browse the paginated CivitAI model listing with keyword search.
Thumbnails are downloaded once, resized and kept in a local cache."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Thumbnail cache directory path
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show one page of the model listing
    Browse(BrowseArgs),

    /// Thumbnail cache management
    Cache(CacheArgs),

    /// Configuration file management
    Config(ConfigArgs),
}

/// Arguments for the browse command
#[derive(Args, Debug, Clone)]
pub struct BrowseArgs {
    /// Page number to show (1-based)
    #[arg(short, long, default_value = "1")]
    pub page: u32,

    /// Keyword filter for the listing
    #[arg(short, long)]
    pub search: Option<String>,

    /// Models per page (overrides the configuration file)
    #[arg(short, long)]
    pub limit: Option<u32>,

    /// Do not download thumbnails
    #[arg(long)]
    pub no_thumbnails: bool,

    /// Show version and download details for every model
    #[arg(short, long)]
    pub details: bool,
}

/// Arguments for cache management
#[derive(Args, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache management actions
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show cache location, file count and size
    Info,

    /// Remove every cached thumbnail
    Clear,
}

/// Arguments for configuration management
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Write a commented default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level, falling back to the configured one
    pub fn log_level<'a>(&self, configured: &'a str) -> &'a str {
        if self.global.quiet {
            "error"
        } else if self.global.very_verbose {
            "debug"
        } else if self.global.verbose {
            "info"
        } else {
            configured
        }
    }
}

impl BrowseArgs {
    /// Check page and limit bounds before anything touches the network
    pub fn validate(&self) -> Result<(), String> {
        if self.page == 0 {
            return Err("Page numbers start at 1".to_string());
        }

        if let Some(limit) = self.limit {
            if limit == 0 || limit > api::MAX_PAGE_SIZE {
                return Err(format!(
                    "Limit must be between 1 and {}",
                    api::MAX_PAGE_SIZE
                ));
            }
        }

        Ok(())
    }

    /// Search text with surrounding whitespace removed, `None` when blank
    pub fn search_text(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
    }
}
