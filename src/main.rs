//! CivitAI Browser CLI application
//!
//! Command-line front end for browsing the CivitAI model listing.
//! Pages are fetched in the background and thumbnails are cached on disk.

use std::process;

use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

// Import CLI modules through the library (module is public but not re-exported)
use civitai_browser::cli::{handle_browse, handle_cache, handle_config, Cli, Commands};
use civitai_browser::config::AppConfig;
use civitai_browser::errors::Result;

#[tokio::main]
async fn main() {
    // Initialize program
    let result = run().await;

    // Handle any errors that occurred
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        if e.is_recoverable() {
            eprintln!("This looks temporary; try again in a moment.");
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Configuration is read once and passed down explicitly
    let mut config = AppConfig::load(cli.global.config.clone()).await?;
    if let Some(cache_dir) = &cli.global.cache_dir {
        config.cache.cache_root = Some(cache_dir.clone());
    }

    // Initialize logging based on verbosity
    init_logging(&cli, &config);

    info!("CivitAI Browser v{} starting", env!("CARGO_PKG_VERSION"));
    debug!(?config, "Effective configuration");

    // Execute the appropriate command
    match cli.command {
        Commands::Browse(args) => {
            info!("Executing browse command");
            handle_browse(args, &config, cli.global.quiet).await
        }
        Commands::Cache(args) => {
            info!("Executing cache command");
            handle_cache(args, &config).await
        }
        Commands::Config(args) => {
            info!("Executing config command");
            handle_config(args, &config, cli.global.config.as_deref()).await
        }
    }
}

/// Initialize logging based on CLI verbosity and the configured level
fn init_logging(cli: &Cli, config: &AppConfig) {
    let log_level = cli.log_level(&config.logging.level);

    // Create environment filter; RUST_LOG still wins for other targets
    let mut filter = EnvFilter::from_default_env();
    match format!("civitai_browser={}", log_level).parse() {
        Ok(directive) => filter = filter.add_directive(directive),
        Err(e) => eprintln!("Ignoring invalid log level '{}': {}", log_level, e),
    }

    // Initialize subscriber
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(cli.global.very_verbose) // Show levels only in very verbose mode
        .with_writer(std::io::stderr)
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}
