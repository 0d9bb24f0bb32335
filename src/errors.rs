//! Error types for the CivitAI browser
//!
//! Errors are split by concern. [`FetchError`] is the one that crosses the
//! presentation boundary, so it is `Clone` and carries no live transport
//! objects; the others stay inside the library and the CLI.

use std::path::PathBuf;

use thiserror::Error;

/// Classification of a failed fetch as seen by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connection failure, timeout or non-success HTTP status
    Network,
    /// The response body could not be interpreted
    Parse,
    /// The request was refused locally and never sent
    Rejected,
}

/// Page and thumbnail fetch errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Transport-level failure (DNS, connect, reset, body read)
    #[error("Network request failed: {reason}")]
    Network { reason: String },

    /// Server returned a non-success status
    #[error("Server error: HTTP {status}")]
    Status { status: u16 },

    /// Request did not finish before its deadline
    #[error("Request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// URL could not be built or parsed
    #[error("Invalid URL: {url} - {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Response body was not the JSON shape we can default from
    #[error("Failed to parse listing response: {reason}")]
    Parse { reason: String },

    /// Query parameters violate their bounds
    #[error("Invalid page query: {reason}")]
    InvalidQuery { reason: String },

    /// Navigation beyond the known page range
    #[error("Page {requested} is outside the available range 1..={total}")]
    PageOutOfRange { requested: u32, total: u32 },
}

impl FetchError {
    /// Map the error onto the three-way classification shown to users
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Network { .. }
            | FetchError::Status { .. }
            | FetchError::Timeout { .. } => ErrorKind::Network,
            FetchError::Parse { .. } => ErrorKind::Parse,
            FetchError::InvalidUrl { .. }
            | FetchError::InvalidQuery { .. }
            | FetchError::PageOutOfRange { .. } => ErrorKind::Rejected,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        if let Some(status) = error.status() {
            FetchError::Status {
                status: status.as_u16(),
            }
        } else {
            FetchError::Network {
                reason: error.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(error: serde_json::Error) -> Self {
        FetchError::Parse {
            reason: error.to_string(),
        }
    }
}

/// Thumbnail cache errors
#[derive(Error, Debug)]
pub enum CacheError {
    /// Cache directory not found or could not be created
    #[error("Cache directory not accessible: {path}")]
    DirectoryNotAccessible { path: PathBuf },

    /// Disk I/O failure while writing a thumbnail
    #[error("Failed to write cache file {path}: {source}")]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The thumbnail could not be downloaded
    #[error("Thumbnail download failed: {0}")]
    Download(#[from] FetchError),

    /// The downloaded body is not a decodable image
    #[error("Thumbnail could not be decoded: {reason}")]
    Decode { reason: String },

    /// Cache configuration rejected
    #[error("Invalid cache configuration: {0}")]
    Configuration(String),

    /// Publishing the finished temp file failed
    #[error("Atomic file operation failed: could not rename {temp_path} to {final_path}")]
    AtomicOperationFailed {
        temp_path: PathBuf,
        final_path: PathBuf,
    },
}

impl CacheError {
    /// Wrap an I/O error with the path it happened on
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::CacheWrite {
            path: path.into(),
            source,
        }
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format: {0}")]
    InvalidFormat(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// Reading or writing the configuration file failed
    #[error("Configuration file I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No per-user configuration directory on this platform
    #[error("Could not determine user config directory")]
    NoConfigDirectory,
}

/// Coordinator and worker pool errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorError {
    /// The coordinator task has stopped and no longer accepts commands
    #[error("Fetch coordinator is shut down")]
    Closed,

    /// Worker pool configuration rejected
    #[error("Invalid worker configuration: {0}")]
    Configuration(String),
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Fetch error
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Cache error
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Coordinator error
    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if the error is transient and the user may simply try again
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Fetch(error) => error.kind() == ErrorKind::Network,
            AppError::Cache(CacheError::Download(error)) => error.kind() == ErrorKind::Network,
            AppError::Cache(CacheError::CacheWrite { .. }) => true,
            _ => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Fetch(_) => "fetch",
            AppError::Cache(_) => "cache",
            AppError::Config(_) => "config",
            AppError::Coordinator(_) => "coordinator",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Fetch result type alias
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Cache result type alias
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
