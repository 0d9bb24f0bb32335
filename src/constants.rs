//! Application constants for the CivitAI browser
//!
//! This module centralizes the constants used throughout the application,
//! organized by functional domain.

use std::time::Duration;

/// CivitAI REST API endpoints and query parameter names
pub mod api {
    /// Base URL of the public CivitAI API
    pub const BASE_URL: &str = "https://civitai.com/api/v1/";

    /// Path of the paginated model listing, relative to [`BASE_URL`]
    pub const LISTING_PATH: &str = "models";

    /// Query parameter carrying the 1-based page number
    pub const PAGE_PARAM: &str = "page";

    /// Query parameter carrying the page size
    pub const LIMIT_PARAM: &str = "limit";

    /// Query parameter carrying the search text (omitted when empty)
    pub const QUERY_PARAM: &str = "query";

    /// Largest page size the listing endpoint accepts
    pub const MAX_PAGE_SIZE: u32 = 100;
}

/// Pagination defaults
pub mod paging {
    /// Default number of models requested per page
    pub const DEFAULT_ITEMS_PER_PAGE: u32 = 10;

    /// First page of any listing
    pub const FIRST_PAGE: u32 = 1;
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = "CivitAI-Browser/0.1.0 (Model Browser)";

    /// Default HTTP request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Maximum idle connections per host in pool
    pub const POOL_MAX_PER_HOST: usize = 8;

    /// Default rate limit for API and image requests (requests per second)
    pub const DEFAULT_RATE_LIMIT_RPS: u32 = 10;
}

/// File operation constants
pub mod files {
    /// Temporary file suffix for atomic operations
    pub const TEMP_FILE_SUFFIX: &str = ".tmp";

    /// Prefix of temporary files created inside the cache directory
    pub const TEMP_FILE_PREFIX: &str = ".partial-";

    /// Suffix of every published thumbnail file
    pub const THUMBNAIL_SUFFIX: &str = ".png";

    /// Directory name used under the OS config/cache directory
    pub const APP_DIR_NAME: &str = "civitai-browser";

    /// Subdirectory of the application cache directory holding thumbnails
    pub const THUMBNAIL_DIR_NAME: &str = "thumbnails";

    /// Configuration file name
    pub const CONFIG_FILE_NAME: &str = "config.toml";

    /// Project-local configuration file name
    pub const LOCAL_CONFIG_FILE_NAME: &str = "civitai-browser.toml";
}

/// Thumbnail processing constants
pub mod thumbnails {
    use super::Duration;

    /// Default deadline for receiving one thumbnail body
    pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

    /// Default bound for the longer edge of a stored thumbnail, in pixels
    pub const MAX_DIMENSION: u32 = 150;

    /// Number of hex characters of the URL digest kept in a cache key
    pub const URL_DIGEST_LEN: usize = 12;

    /// URL suffixes that denote video previews rather than images
    pub const VIDEO_SUFFIXES: [&str; 3] = [".mp4", ".webm", ".mov"];
}

/// Worker and concurrency configuration
pub mod workers {
    use super::Duration;

    /// Default number of network lanes
    pub const DEFAULT_WORKER_COUNT: usize = 4;

    /// Maximum recommended concurrent lanes
    pub const MAX_WORKER_COUNT: usize = 16;

    /// Capacity of the job queue feeding the lanes
    pub const JOB_QUEUE_CAPACITY: usize = 256;

    /// Default deadline for a single page fetch
    pub const PAGE_TIMEOUT: Duration = Duration::from_secs(20);
}

/// Coordinator constants
pub mod coordinator {
    /// Number of finished fetch tasks remembered for inspection
    pub const TASK_HISTORY: usize = 32;
}

/// Logging constants
pub mod logging {
    /// Default log level
    pub const DEFAULT_LOG_LEVEL: &str = "info";
}

// Re-export commonly used constants for convenience
pub use files::TEMP_FILE_SUFFIX;
pub use http::{DEFAULT_RATE_LIMIT_RPS, DEFAULT_TIMEOUT as HTTP_TIMEOUT, USER_AGENT};
pub use paging::DEFAULT_ITEMS_PER_PAGE;
pub use workers::DEFAULT_WORKER_COUNT;
