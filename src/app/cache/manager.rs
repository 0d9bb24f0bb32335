//! Core thumbnail cache with per-key locking and atomic publishing
//!
//! [`ImageCache::get_or_fetch`] owns the download-or-reuse decision. Each key
//! has its own async lock, held across the existence check and the whole
//! download, so concurrent requests for one key download once and the later
//! callers find the published file.

use std::collections::HashMap;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use futures::StreamExt;
use image::{DynamicImage, ImageFormat};
use tempfile::TempPath;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::app::client::HttpTransport;
use crate::constants::files;
use crate::errors::{CacheError, CacheResult, FetchError};

use super::config::CacheConfig;
use super::entry::CacheEntry;
use super::key::CacheKey;
use super::stats::{CacheStats, DirectoryScanner};

type Slot = Arc<Mutex<CacheEntry>>;

/// On-disk thumbnail store
#[derive(Debug)]
pub struct ImageCache {
    /// Configuration
    config: CacheConfig,
    /// Cache root directory
    cache_root: PathBuf,
    /// Transport used for thumbnail downloads
    transport: Arc<dyn HttpTransport>,
    /// One lock per key in use, failed or not yet published
    slots: StdMutex<HashMap<CacheKey, Slot>>,
}

impl ImageCache {
    /// Create a new image cache
    ///
    /// # Arguments
    ///
    /// * `config` - Cache configuration
    /// * `transport` - Transport used for thumbnail downloads
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if the configuration is invalid or the cache
    /// directory cannot be created
    pub async fn new(config: CacheConfig, transport: Arc<dyn HttpTransport>) -> CacheResult<Self> {
        config.validate().map_err(CacheError::Configuration)?;

        let cache_root = match &config.cache_root {
            Some(path) => path.clone(),
            None => Self::get_default_cache_dir()?,
        };

        Self::ensure_directory_exists(&cache_root).await?;

        info!(
            "Initialized image cache with root: {}",
            cache_root.display()
        );

        Ok(Self {
            config,
            cache_root,
            transport,
            slots: StdMutex::new(HashMap::new()),
        })
    }

    /// Get the cache root directory
    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    /// Get the cache configuration
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Final location of the thumbnail for `key`
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.cache_root.join(key.file_name())
    }

    /// Get the default cache directory for the current OS
    ///
    /// - Linux: ~/.cache/civitai-browser/thumbnails
    /// - macOS: ~/Library/Caches/civitai-browser/thumbnails
    /// - Windows: %LOCALAPPDATA%/civitai-browser/thumbnails
    pub fn get_default_cache_dir() -> CacheResult<PathBuf> {
        let base = dirs::cache_dir()
            .or_else(dirs::config_dir)
            .ok_or_else(|| CacheError::DirectoryNotAccessible {
                path: PathBuf::from("system cache directory"),
            })?;

        Ok(base
            .join(files::APP_DIR_NAME)
            .join(files::THUMBNAIL_DIR_NAME))
    }

    /// Ensure a directory exists, creating it if necessary
    async fn ensure_directory_exists(path: &Path) -> CacheResult<()> {
        if !fs::try_exists(path).await.unwrap_or(false) {
            fs::create_dir_all(path).await.map_err(|e| {
                error!("Failed to create cache directory: {}", e);
                CacheError::DirectoryNotAccessible {
                    path: path.to_path_buf(),
                }
            })?;
            debug!("Created cache directory: {}", path.display());
        }
        Ok(())
    }

    fn slots(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock slot for `key`, created Missing on first reference
    fn slot(&self, key: &CacheKey) -> Slot {
        self.slots()
            .entry(key.clone())
            .or_insert_with(|| {
                Arc::new(Mutex::new(CacheEntry::new(key.clone(), self.path_for(key))))
            })
            .clone()
    }

    /// Return the thumbnail for `key`, downloading it from `url` on a miss
    ///
    /// A hit never touches the network. A miss streams the body into a
    /// temporary file under the configured download deadline, normalises it
    /// to a bounded PNG and publishes it with a rename. Failures leave no file
    /// behind and return a Failed entry; the next call for the same key tries
    /// again. The entry is resolved before the key's lock is released.
    pub async fn get_or_fetch(&self, key: &CacheKey, url: &str) -> CacheEntry {
        let slot = self.slot(key);
        let entry = {
            let mut entry = slot.lock().await;
            self.resolve(&mut entry, url).await;
            entry.clone()
        };

        drop(slot);
        self.release(key);
        entry
    }

    async fn resolve(&self, entry: &mut CacheEntry, url: &str) {
        let local_path = entry.local_path.clone();

        if fs::try_exists(&local_path).await.unwrap_or(false) {
            if !entry.is_ready() {
                entry.mark_ready();
            }
            debug!(key = %entry.key, "Thumbnail cache hit");
            return;
        }

        entry.mark_downloading();
        match self.download(url, &local_path).await {
            Ok(()) => {
                entry.mark_ready();
                info!(key = %entry.key, "Cached thumbnail: {}", local_path.display());
            }
            Err(e) => {
                warn!(key = %entry.key, "Thumbnail fetch failed: {}", e);
                entry.mark_failed(e.to_string());
            }
        }
    }

    /// Forget the slot for `key` once it is Ready and nobody else holds it
    ///
    /// A published file is its own record, so dropping the slot loses nothing.
    fn release(&self, key: &CacheKey) {
        let mut slots = self.slots();
        let idle_ready = slots.get(key).is_some_and(|slot| {
            Arc::strong_count(slot) == 1
                && slot.try_lock().map(|entry| entry.is_ready()).unwrap_or(false)
        });
        if idle_ready {
            slots.remove(key);
        }
    }

    async fn download(&self, url: &str, final_path: &Path) -> CacheResult<()> {
        let url = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let deadline = self.config.download_timeout;
        let raw = tokio::time::timeout(deadline, self.stream_to_temp(&url))
            .await
            .map_err(|_| FetchError::Timeout {
                seconds: deadline.as_secs().max(1),
            })??;

        let cache_root = self.cache_root.clone();
        let final_path = final_path.to_path_buf();
        let max_dimension = self.config.max_thumbnail_dimension;

        tokio::task::spawn_blocking(move || {
            // `raw` is deleted when dropped at the end of this closure
            Self::normalize_and_publish(&raw, &cache_root, &final_path, max_dimension)
        })
        .await
        .map_err(|e| CacheError::Decode {
            reason: format!("thumbnail task failed: {}", e),
        })?
    }

    /// Write the response body to a temporary file in the cache directory
    async fn stream_to_temp(&self, url: &Url) -> CacheResult<TempPath> {
        let mut stream = self.transport.get_stream(url).await?;

        let temp = tempfile::Builder::new()
            .prefix(files::TEMP_FILE_PREFIX)
            .suffix(files::TEMP_FILE_SUFFIX)
            .tempfile_in(&self.cache_root)
            .map_err(|e| CacheError::write(&self.cache_root, e))?;
        let (file, temp_path) = temp.into_parts();
        let mut file = fs::File::from_std(file);

        let mut written = 0usize;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)
                .await
                .map_err(|e| CacheError::write(&*temp_path, e))?;
            written += chunk.len();
        }
        file.flush()
            .await
            .map_err(|e| CacheError::write(&*temp_path, e))?;

        debug!("Downloaded {} bytes from {}", written, url);
        Ok(temp_path)
    }

    /// Decode, bound and re-encode as PNG, then rename into place (blocking)
    fn normalize_and_publish(
        raw: &Path,
        cache_root: &Path,
        final_path: &Path,
        max_dimension: u32,
    ) -> CacheResult<()> {
        let bytes = std::fs::read(raw).map_err(|e| CacheError::write(raw, e))?;
        let image = image::load_from_memory(&bytes).map_err(|e| CacheError::Decode {
            reason: e.to_string(),
        })?;
        let image = Self::bound(image, max_dimension);

        let mut output = tempfile::Builder::new()
            .prefix(files::TEMP_FILE_PREFIX)
            .suffix(files::TEMP_FILE_SUFFIX)
            .tempfile_in(cache_root)
            .map_err(|e| CacheError::write(cache_root, e))?;
        {
            let mut writer = BufWriter::new(output.as_file_mut());
            image
                .write_to(&mut writer, ImageFormat::Png)
                .map_err(|e| CacheError::Decode {
                    reason: format!("PNG encoding failed: {}", e),
                })?;
            writer
                .flush()
                .map_err(|e| CacheError::write(final_path, e))?;
        }

        output.persist(final_path).map_err(|e| {
            error!("Failed to publish thumbnail: {}", e.error);
            CacheError::AtomicOperationFailed {
                temp_path: e.file.path().to_path_buf(),
                final_path: final_path.to_path_buf(),
            }
        })?;
        Ok(())
    }

    /// Shrink to fit a `max_dimension` square, preserving aspect ratio
    fn bound(image: DynamicImage, max_dimension: u32) -> DynamicImage {
        if image.width() > max_dimension || image.height() > max_dimension {
            image.thumbnail(max_dimension, max_dimension)
        } else {
            image
        }
    }

    /// Current state of `key` without waiting on an in-flight download
    pub fn entry(&self, key: &CacheKey) -> CacheEntry {
        let existing = self.slots().get(key).cloned();
        if let Some(slot) = existing {
            if let Ok(entry) = slot.try_lock() {
                return entry.clone();
            }
            let mut entry = CacheEntry::new(key.clone(), self.path_for(key));
            entry.mark_downloading();
            return entry;
        }

        let mut entry = CacheEntry::new(key.clone(), self.path_for(key));
        if entry.local_path.is_file() {
            entry.mark_ready();
        }
        entry
    }

    #[cfg(test)]
    pub(crate) fn tracked_keys(&self) -> usize {
        self.slots().len()
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        let slots: Vec<Slot> = self.slots().values().cloned().collect();
        let mut downloading = 0;
        let mut failed = 0;
        for slot in slots {
            match slot.try_lock() {
                Ok(entry) if entry.is_failed() => failed += 1,
                Ok(_) => {}
                Err(_) => downloading += 1,
            }
        }

        let (cached_files_count, total_cache_size) =
            DirectoryScanner::scan_cache_directory(&self.cache_root).await;

        let mut stats = CacheStats::new(self.cache_root.clone());
        stats.cached_files_count = cached_files_count;
        stats.total_cache_size = total_cache_size;
        stats.downloading = downloading;
        stats.failed = failed;
        stats
    }

    /// Remove every published thumbnail and forget idle entries
    ///
    /// Slots with a download in flight are kept, so callers waiting on them
    /// still find the file that download publishes. Returns the number of
    /// files removed.
    pub async fn clear(&self) -> CacheResult<usize> {
        self.slots().retain(|_, slot| slot.try_lock().is_err());

        let mut removed = 0;
        for path in DirectoryScanner::thumbnail_files(&self.cache_root) {
            fs::remove_file(&path)
                .await
                .map_err(|e| CacheError::write(&path, e))?;
            removed += 1;
        }

        info!("Removed {} cached thumbnails", removed);
        Ok(removed)
    }
}
