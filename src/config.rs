//! Configuration management for the CivitAI browser
//!
//! This module provides unified configuration management with automatic
//! first-run initialization, multi-source loading, and zero-config defaults.
//! The configuration is read once at startup and converted into the runtime
//! config structs that are handed to each component.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::{CacheConfig, ClientConfig, CoordinatorConfig, WorkerConfig};
use crate::constants::{api, coordinator, files, http, logging, paging, thumbnails, workers};
use crate::errors::{ConfigError, ConfigResult};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Listing settings
    pub browser: BrowserConfigToml,
    /// HTTP client settings
    pub client: ClientConfigToml,
    /// Thumbnail cache settings
    pub cache: CacheConfigToml,
    /// Fetch coordinator settings
    pub coordinator: CoordinatorConfigToml,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// TOML-friendly listing configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BrowserConfigToml {
    /// Number of models requested per page (1..=100)
    pub items_per_page: u32,
    /// Base URL of the CivitAI API
    pub api_base_url: String,
}

impl Default for BrowserConfigToml {
    fn default() -> Self {
        Self {
            items_per_page: paging::DEFAULT_ITEMS_PER_PAGE,
            api_base_url: api::BASE_URL.to_string(),
        }
    }
}

/// TOML-friendly client configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfigToml {
    /// TCP nodelay setting
    pub tcp_nodelay: bool,
    /// Connection pool idle timeout in seconds (None = no timeout)
    pub pool_idle_timeout_secs: Option<u64>,
    /// Maximum connections per host
    pub pool_max_per_host: usize,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// Rate limit (requests per second)
    pub rate_limit_rps: u32,
}

impl Default for ClientConfigToml {
    fn default() -> Self {
        Self {
            tcp_nodelay: true,
            pool_idle_timeout_secs: Some(http::POOL_IDLE_TIMEOUT.as_secs()),
            pool_max_per_host: http::POOL_MAX_PER_HOST,
            request_timeout_secs: http::DEFAULT_TIMEOUT.as_secs(),
            connect_timeout_secs: http::CONNECT_TIMEOUT.as_secs(),
            rate_limit_rps: http::DEFAULT_RATE_LIMIT_RPS,
        }
    }
}

/// TOML-friendly cache configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfigToml {
    /// Cache directory path (None = system default)
    pub cache_root: Option<PathBuf>,
    /// Longest edge of a stored thumbnail in pixels
    pub max_thumbnail_dimension: u32,
}

impl Default for CacheConfigToml {
    fn default() -> Self {
        Self {
            cache_root: None,
            max_thumbnail_dimension: thumbnails::MAX_DIMENSION,
        }
    }
}

/// TOML-friendly coordinator configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CoordinatorConfigToml {
    /// Number of concurrent network lanes
    pub worker_count: usize,
    /// Deadline for a single page fetch in seconds
    pub page_timeout_secs: u64,
    /// Deadline for a single thumbnail fetch in seconds
    pub thumbnail_timeout_secs: u64,
    /// Number of finished page requests kept for inspection
    pub task_history: usize,
}

impl Default for CoordinatorConfigToml {
    fn default() -> Self {
        Self {
            worker_count: workers::DEFAULT_WORKER_COUNT,
            page_timeout_secs: workers::PAGE_TIMEOUT.as_secs(),
            thumbnail_timeout_secs: thumbnails::DOWNLOAD_TIMEOUT.as_secs(),
            task_history: coordinator::TASK_HISTORY,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level for the application
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: logging::DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl AppConfig {
    /// Runtime configuration for each component
    pub fn to_runtime_config(&self) -> (ClientConfig, CacheConfig, CoordinatorConfig) {
        (
            self.to_client_config(),
            self.to_cache_config(),
            self.to_coordinator_config(),
        )
    }

    /// Cache configuration, including the thumbnail deadline
    pub fn to_cache_config(&self) -> CacheConfig {
        let timeout = Duration::from_secs(self.coordinator.thumbnail_timeout_secs);
        self.cache.to_runtime_config().with_download_timeout(timeout)
    }

    /// HTTP client configuration, including the API base URL
    pub fn to_client_config(&self) -> ClientConfig {
        let mut config = self.client.to_runtime_config();
        config.api_base_url = self.browser.api_base_url.clone();
        config
    }

    /// Coordinator configuration, including the page size
    pub fn to_coordinator_config(&self) -> CoordinatorConfig {
        self.coordinator
            .to_runtime_config()
            .with_items_per_page(self.browser.items_per_page)
    }

    /// Load configuration with multi-source precedence:
    /// 1. Explicit `--config` file
    /// 2. `./civitai-browser.toml`
    /// 3. The per-user config directory
    /// 4. Default values
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if an explicit file does not exist,
    /// `ConfigError::InvalidFormat` for malformed TOML and
    /// `ConfigError::InvalidValue` for out-of-range settings
    pub async fn load(config_file_override: Option<PathBuf>) -> ConfigResult<Self> {
        let config_path = match config_file_override {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound { path });
                }
                Some(path)
            }
            None => Self::find_config_file(),
        };

        let config = match config_path {
            Some(path) => Self::load_from_file(&path).await?,
            None => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> ConfigResult<()> {
        let items = self.browser.items_per_page;
        if items == 0 || items > api::MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidValue {
                field: "browser.items_per_page".to_string(),
                value: items.to_string(),
                reason: format!("Must be between 1 and {}", api::MAX_PAGE_SIZE),
            });
        }

        if url::Url::parse(&self.browser.api_base_url).is_err() {
            return Err(ConfigError::InvalidValue {
                field: "browser.api_base_url".to_string(),
                value: self.browser.api_base_url.clone(),
                reason: "Must be an absolute URL".to_string(),
            });
        }

        if self.client.rate_limit_rps == 0 {
            return Err(ConfigError::InvalidValue {
                field: "client.rate_limit_rps".to_string(),
                value: "0".to_string(),
                reason: "Must be at least 1 request per second".to_string(),
            });
        }

        if let Err(reason) = self.cache.to_runtime_config().validate() {
            return Err(ConfigError::InvalidValue {
                field: "cache.max_thumbnail_dimension".to_string(),
                value: self.cache.max_thumbnail_dimension.to_string(),
                reason,
            });
        }

        if self.coordinator.thumbnail_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "coordinator.thumbnail_timeout_secs".to_string(),
                value: "0".to_string(),
                reason: "Must be at least 1 second".to_string(),
            });
        }

        if let Err(e) = self.to_coordinator_config().validate() {
            return Err(ConfigError::InvalidValue {
                field: "coordinator".to_string(),
                value: format!("worker_count = {}", self.coordinator.worker_count),
                reason: e,
            });
        }

        Ok(())
    }

    /// Initialize configuration on first run
    ///
    /// Creates a default config file if none exists and notifies the user
    pub async fn initialize_first_run() -> ConfigResult<PathBuf> {
        let config_path = Self::get_default_config_path()?;

        if config_path.exists() {
            return Ok(config_path);
        }

        info!("Creating default configuration file...");
        Self::write_default_config(&config_path).await?;

        println!("📁 Created default configuration file:");
        println!("   {}", config_path.display());
        println!("   You can customize settings by editing this file.");
        println!();

        Ok(config_path)
    }

    /// Write the commented default configuration to `path`
    pub async fn write_default_config(path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| ConfigError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        tokio::fs::write(path, Self::generate_default_config_content())
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Find configuration file in standard locations
    pub fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(files::LOCAL_CONFIG_FILE_NAME)];
        if let Ok(user_config) = Self::get_default_config_path() {
            search_paths.push(user_config);
        }

        for path in search_paths {
            if path.exists() {
                debug!("Found config file: {}", path.display());
                return Some(path);
            }
        }

        debug!("No config file found in standard locations");
        None
    }

    /// Get the default config file path for the current user
    pub fn get_default_config_path() -> ConfigResult<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDirectory)?;

        Ok(config_dir
            .join(files::APP_DIR_NAME)
            .join(files::CONFIG_FILE_NAME))
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;

        let config: AppConfig = toml::from_str(&content)?;

        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Render the effective configuration as TOML
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidValue {
            field: "config".to_string(),
            value: String::new(),
            reason: e.to_string(),
        })
    }

    /// Generate default configuration content with helpful comments
    pub fn generate_default_config_content() -> String {
        let default_cache_path = dirs::cache_dir()
            .map(|dir| dir.join(files::APP_DIR_NAME).join(files::THUMBNAIL_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("./thumbnails"));

        format!(
            r#"# CivitAI Browser Configuration
# This file was automatically generated on first run.
# You can customize any of these settings to suit your needs.

[browser]
# Models per page (1-{max_page})
items_per_page = {items}
api_base_url = "{base_url}"

[client]
# HTTP client settings
tcp_nodelay = true
pool_idle_timeout_secs = {idle}
pool_max_per_host = {per_host}
request_timeout_secs = {request}
connect_timeout_secs = {connect}
rate_limit_rps = {rps}

[cache]
# Thumbnail directory (leave unset to use {cache_path})
# cache_root = "/path/to/custom/thumbnails"

# Longest edge of stored thumbnails in pixels
max_thumbnail_dimension = {dimension}

[coordinator]
# Concurrent network requests
worker_count = {workers}
page_timeout_secs = {page_timeout}
thumbnail_timeout_secs = {thumb_timeout}
task_history = {history}

[logging]
level = "{level}"  # error, warn, info, debug, trace
"#,
            max_page = api::MAX_PAGE_SIZE,
            items = paging::DEFAULT_ITEMS_PER_PAGE,
            base_url = api::BASE_URL,
            idle = http::POOL_IDLE_TIMEOUT.as_secs(),
            per_host = http::POOL_MAX_PER_HOST,
            request = http::DEFAULT_TIMEOUT.as_secs(),
            connect = http::CONNECT_TIMEOUT.as_secs(),
            rps = http::DEFAULT_RATE_LIMIT_RPS,
            cache_path = default_cache_path.display(),
            dimension = thumbnails::MAX_DIMENSION,
            workers = workers::DEFAULT_WORKER_COUNT,
            page_timeout = workers::PAGE_TIMEOUT.as_secs(),
            thumb_timeout = thumbnails::DOWNLOAD_TIMEOUT.as_secs(),
            history = coordinator::TASK_HISTORY,
            level = logging::DEFAULT_LOG_LEVEL,
        )
    }
}

impl ClientConfigToml {
    /// Convert to runtime ClientConfig
    pub fn to_runtime_config(&self) -> ClientConfig {
        ClientConfig {
            tcp_nodelay: self.tcp_nodelay,
            pool_idle_timeout: self.pool_idle_timeout_secs.map(Duration::from_secs),
            pool_max_per_host: self.pool_max_per_host,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            rate_limit_rps: self.rate_limit_rps,
            ..ClientConfig::default()
        }
    }
}

impl CacheConfigToml {
    /// Convert to runtime CacheConfig
    pub fn to_runtime_config(&self) -> CacheConfig {
        CacheConfig {
            cache_root: self.cache_root.clone(),
            max_thumbnail_dimension: self.max_thumbnail_dimension,
            ..CacheConfig::default()
        }
    }
}

impl CoordinatorConfigToml {
    /// Convert to runtime CoordinatorConfig
    pub fn to_runtime_config(&self) -> CoordinatorConfig {
        let worker_config = WorkerConfig::default()
            .with_worker_count(self.worker_count)
            .with_page_timeout(Duration::from_secs(self.page_timeout_secs));

        CoordinatorConfig::default()
            .with_task_history(self.task_history)
            .with_worker_config(worker_config)
    }
}
