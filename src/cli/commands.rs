//! Command handlers for the CivitAI browser CLI
//!
//! This module implements the command handlers that wire CLI arguments and
//! the loaded configuration to the core application components.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::app::{
    FetchCoordinator, HttpHandler, HttpTransport, ImageCache, ModelPage, PageFetcher, PageQuery,
    PresentationEvent, PresentationReceiver,
};
use crate::cli::progress::{self, ProgressConfig, ThumbnailProgress};
use crate::cli::{BrowseArgs, CacheAction, CacheArgs, ConfigAction, ConfigArgs};
use crate::config::AppConfig;
use crate::errors::{AppError, CoordinatorError, Result};

/// Handle the browse command
///
/// Starts the fetch coordinator, shows the requested page as soon as it
/// arrives and then reports each thumbnail of that page until all of them
/// have resolved. Ctrl-C stops waiting and shuts the coordinator down.
pub async fn handle_browse(args: BrowseArgs, config: &AppConfig, quiet: bool) -> Result<()> {
    args.validate().map_err(AppError::generic)?;

    let (client_config, cache_config, coordinator_config) = config.to_runtime_config();
    let limit = args.limit.unwrap_or(config.browser.items_per_page);
    let coordinator_config = coordinator_config
        .with_items_per_page(limit)
        .with_auto_thumbnails(!args.no_thumbnails);

    let display = ProgressConfig {
        enable_progress_bars: !quiet,
        show_details: args.details,
        ..Default::default()
    };

    let transport: Arc<dyn HttpTransport> = Arc::new(HttpHandler::new(&client_config)?);
    let fetcher = PageFetcher::new(transport.clone(), &client_config.api_base_url)?;
    let cache = Arc::new(ImageCache::new(cache_config, transport).await?);
    debug!("Thumbnail cache at {}", cache.cache_root().display());

    let (coordinator, mut events) = FetchCoordinator::start(coordinator_config, fetcher, cache)?;

    let query = PageQuery::new(args.page, limit, args.search_text())?;
    let started = Instant::now();
    coordinator.request_page(query)?;

    let spinner = progress::spinner(&display, format!("Fetching page {}...", args.page));
    let outcome = tokio::select! {
        outcome = wait_for_page(&mut events) => outcome,
        _ = tokio::signal::ctrl_c() => Err(AppError::generic("Interrupted while fetching the page")),
    };
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let page = match outcome {
        Ok(page) => page,
        Err(e) => {
            coordinator.shutdown().await?;
            return Err(e);
        }
    };
    info!(elapsed = ?started.elapsed(), "{} received", page.label());

    print!("{}", progress::format_page(&page, &display));

    if !args.no_thumbnails {
        collect_thumbnails(&page, &mut events, &display).await;
    }

    coordinator.shutdown().await?;
    Ok(())
}

/// Wait for the outcome of the page request
async fn wait_for_page(events: &mut PresentationReceiver) -> Result<ModelPage> {
    while let Some(event) = events.recv().await {
        match event {
            PresentationEvent::PageReady(page) => return Ok(page),
            PresentationEvent::PageFailed(error) => {
                warn!(kind = ?error.kind(), "Page request failed");
                return Err(AppError::Fetch(error));
            }
            other => debug!("Ignoring event before page: {:?}", other),
        }
    }
    Err(CoordinatorError::Closed.into())
}

/// Report thumbnails of `page` as they arrive
async fn collect_thumbnails(
    page: &ModelPage,
    events: &mut PresentationReceiver,
    display: &ProgressConfig,
) {
    let mut thumbnails = ThumbnailProgress::new(page, display);
    if thumbnails.is_done() {
        return;
    }

    println!();
    loop {
        let event = tokio::select! {
            event = events.recv() => event,
            _ = tokio::signal::ctrl_c() => {
                warn!(remaining = thumbnails.remaining(), "Interrupted while fetching thumbnails");
                None
            }
        };

        match event {
            Some(PresentationEvent::ThumbnailReady { model_id, path }) => {
                thumbnails.ready(model_id, &path);
            }
            Some(PresentationEvent::ThumbnailFailed { model_id, reason }) => {
                thumbnails.failed(model_id, &reason);
            }
            Some(other) => debug!("Ignoring event: {:?}", other),
            None => break,
        }

        if thumbnails.is_done() {
            break;
        }
    }

    let remaining = thumbnails.remaining();
    let (ready, failed) = thumbnails.finish();
    println!(
        "🖼  {} thumbnails cached, {} failed{}",
        ready,
        failed,
        if remaining > 0 {
            format!(", {} not fetched", remaining)
        } else {
            String::new()
        }
    );
}

/// Handle cache management commands
pub async fn handle_cache(args: CacheArgs, config: &AppConfig) -> Result<()> {
    let (client_config, cache_config, _) = config.to_runtime_config();
    let transport: Arc<dyn HttpTransport> = Arc::new(HttpHandler::new(&client_config)?);
    let cache = ImageCache::new(cache_config, transport).await?;

    match args.action {
        CacheAction::Info => {
            let stats = cache.stats().await;

            println!("💾 Cache Information");
            println!("===================");
            println!("Location: {}", stats.cache_root.display());
            println!("Cached thumbnails: {}", stats.cached_files_count);
            println!("Cache size: {}", stats.format_cache_size());
        }
        CacheAction::Clear => {
            println!("🧹 Cache Cleanup");
            println!("===============");

            let removed = cache.clear().await?;
            println!("🗑️  Removed {} cached thumbnails", removed);
        }
    }

    Ok(())
}

/// Handle configuration management commands
///
/// `explicit` is the `--config` file the configuration was loaded from, if any.
pub async fn handle_config(
    args: ConfigArgs,
    config: &AppConfig,
    explicit: Option<&Path>,
) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            let source = explicit
                .map(Path::to_path_buf)
                .or_else(AppConfig::find_config_file);
            match source {
                Some(path) => println!("# Loaded from {}", path.display()),
                None => println!("# No configuration file found; showing defaults"),
            }
            print!("{}", config.to_toml_string()?);
        }
        ConfigAction::Init { force } => {
            let path = AppConfig::get_default_config_path()?;
            if force {
                AppConfig::write_default_config(&path).await?;
                println!("📁 Wrote default configuration file:");
                println!("   {}", path.display());
            } else if path.exists() {
                println!("Configuration file already exists: {}", path.display());
                println!("Use --force to overwrite it with the defaults.");
            } else {
                AppConfig::initialize_first_run().await?;
            }
        }
    }

    Ok(())
}
