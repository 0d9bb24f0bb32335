//! Cache statistics and disk usage monitoring
//!
//! This module counts published thumbnails and their total size. Temporary
//! files of downloads still in progress are not counted.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::constants::files;

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Cache root directory
    pub cache_root: PathBuf,
    /// Number of thumbnails on disk
    pub cached_files_count: usize,
    /// Total size of cached thumbnails in bytes
    pub total_cache_size: u64,
    /// Keys currently downloading
    pub downloading: usize,
    /// Keys whose last attempt failed
    pub failed: usize,
}

impl CacheStats {
    /// Create new cache statistics
    pub fn new(cache_root: PathBuf) -> Self {
        Self {
            cache_root,
            cached_files_count: 0,
            total_cache_size: 0,
            downloading: 0,
            failed: 0,
        }
    }

    /// Format cache size in human-readable format
    pub fn format_cache_size(&self) -> String {
        format_bytes(self.total_cache_size)
    }
}

/// Directory scanner for cache statistics
pub struct DirectoryScanner;

impl DirectoryScanner {
    /// Count thumbnails and their total size without blocking the runtime
    pub async fn scan_cache_directory(cache_root: &Path) -> (usize, u64) {
        let cache_root = cache_root.to_path_buf();

        tokio::task::spawn_blocking(move || Self::scan_directory_sync(&cache_root))
            .await
            .unwrap_or_else(|e| {
                warn!("Failed to scan cache directory: {}", e);
                (0, 0)
            })
    }

    /// Scan the cache root for published thumbnails (blocking)
    pub fn scan_directory_sync(dir: &Path) -> (usize, u64) {
        let mut file_count = 0;
        let mut total_size = 0u64;

        for path in Self::thumbnail_files(dir) {
            file_count += 1;
            if let Ok(metadata) = std::fs::metadata(&path) {
                total_size += metadata.len();
            }
        }

        (file_count, total_size)
    }

    /// Paths of the published thumbnails directly under `dir`
    pub fn thumbnail_files(dir: &Path) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return Vec::new();
        };

        entries
            .flatten()
            .filter(|entry| entry.file_type().map(|ft| ft.is_file()).unwrap_or(false))
            .map(|entry| entry.path())
            .filter(|path| Self::is_thumbnail_file(path))
            .collect()
    }

    /// Published thumbnail: `.png` suffix and not a temporary file
    fn is_thumbnail_file(path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            return false;
        };
        name.ends_with(files::THUMBNAIL_SUFFIX) && !name.starts_with(files::TEMP_FILE_PREFIX)
    }
}

/// Format bytes in human-readable format
fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: u64 = 1024;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= THRESHOLD as f64 && unit_index < UNITS.len() - 1 {
        size /= THRESHOLD as f64;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}
