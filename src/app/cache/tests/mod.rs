//! Tests for the thumbnail cache against a scripted transport

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use crate::app::cache::{CacheConfig, CacheKey, CacheState, ImageCache};
use crate::app::client::tests::{png_bytes, FakeTransport, Reply};
use crate::errors::FetchError;

const URL: &str = "https://image.civitai.test/a/preview.png";

async fn cache_with(transport: &Arc<FakeTransport>, root: &Path) -> ImageCache {
    let config = CacheConfig::with_cache_root(root.to_path_buf());
    ImageCache::new(config, transport.clone()).await.unwrap()
}

fn dir_is_empty(path: &Path) -> bool {
    std::fs::read_dir(path).unwrap().next().is_none()
}

#[tokio::test]
async fn test_miss_downloads_and_bounds_thumbnail() {
    let temp_dir = TempDir::new().unwrap();
    let transport = Arc::new(FakeTransport::new());
    transport.route(URL, Reply::Body(png_bytes(300, 200)));
    let cache = cache_with(&transport, temp_dir.path()).await;

    let key = CacheKey::for_model(42, URL);
    let entry = cache.get_or_fetch(&key, URL).await;

    assert_eq!(entry.state, CacheState::Ready);
    assert_eq!(entry.local_path, temp_dir.path().join(key.file_name()));

    let stored = image::open(&entry.local_path).unwrap();
    assert_eq!((stored.width(), stored.height()), (150, 100));
    assert_eq!(transport.calls_to(URL), 1);
}

#[tokio::test]
async fn test_small_image_is_not_upscaled() {
    let temp_dir = TempDir::new().unwrap();
    let transport = Arc::new(FakeTransport::new());
    transport.route(URL, Reply::Body(png_bytes(40, 90)));
    let cache = cache_with(&transport, temp_dir.path()).await;

    let entry = cache.get_or_fetch(&CacheKey::for_model(1, URL), URL).await;
    let stored = image::open(&entry.local_path).unwrap();
    assert_eq!((stored.width(), stored.height()), (40, 90));
}

#[tokio::test]
async fn test_hit_performs_no_network_call() {
    let temp_dir = TempDir::new().unwrap();
    let transport = Arc::new(FakeTransport::new());
    transport.route(URL, Reply::Body(png_bytes(20, 20)));
    let cache = cache_with(&transport, temp_dir.path()).await;
    let key = CacheKey::for_model(42, URL);

    let first = cache.get_or_fetch(&key, URL).await;
    let second = cache.get_or_fetch(&key, URL).await;

    assert!(second.is_ready());
    assert_eq!(first.local_path, second.local_path);
    assert_eq!(transport.total_calls(), 1);
}

#[tokio::test]
async fn test_existing_file_from_previous_run_is_a_hit() {
    let temp_dir = TempDir::new().unwrap();
    let key = CacheKey::for_model(9, URL);
    std::fs::write(temp_dir.path().join(key.file_name()), png_bytes(10, 10)).unwrap();

    let transport = Arc::new(FakeTransport::new());
    let cache = cache_with(&transport, temp_dir.path()).await;

    let entry = cache.get_or_fetch(&key, URL).await;
    assert!(entry.is_ready());
    assert_eq!(transport.total_calls(), 0);
}

#[tokio::test]
async fn test_concurrent_requests_download_once() {
    let temp_dir = TempDir::new().unwrap();
    let transport = Arc::new(FakeTransport::new());
    let gate = transport.route_gated(URL, Reply::Body(png_bytes(64, 64)));
    let cache = cache_with(&transport, temp_dir.path()).await;
    let key = CacheKey::for_model(42, URL);

    let release = async {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        gate.open();
    };
    let (a, b, ()) = tokio::join!(
        cache.get_or_fetch(&key, URL),
        cache.get_or_fetch(&key, URL),
        release
    );

    assert!(a.is_ready());
    assert!(b.is_ready());
    assert_eq!(a.local_path, b.local_path);
    assert_eq!(transport.calls_to(URL), 1);
}

#[tokio::test]
async fn test_distinct_keys_do_not_share_a_lock() {
    let temp_dir = TempDir::new().unwrap();
    let transport = Arc::new(FakeTransport::new());
    let other = "https://image.civitai.test/b/preview.png";
    let gate = transport.route_gated(URL, Reply::Body(png_bytes(8, 8)));
    transport.route(other, Reply::Body(png_bytes(8, 8)));
    let cache = cache_with(&transport, temp_dir.path()).await;

    let blocked_key = CacheKey::for_model(1, URL);
    let free_key = CacheKey::for_model(2, other);

    let blocked = cache.get_or_fetch(&blocked_key, URL);
    let free = async {
        let entry = cache.get_or_fetch(&free_key, other).await;
        // The other key finished while the first is still waiting on its gate
        assert!(entry.is_ready());
        gate.open();
        entry
    };
    let (blocked, free) = tokio::join!(blocked, free);

    assert!(blocked.is_ready());
    assert!(free.is_ready());
}

#[tokio::test]
async fn test_status_error_writes_no_file() {
    let temp_dir = TempDir::new().unwrap();
    let transport = Arc::new(FakeTransport::new());
    transport.route(URL, Reply::Error(FetchError::Status { status: 404 }));
    let cache = cache_with(&transport, temp_dir.path()).await;

    let entry = cache.get_or_fetch(&CacheKey::for_model(42, URL), URL).await;

    assert!(entry.is_failed());
    assert!(entry.error().unwrap().contains("404"));
    assert!(!entry.local_path.exists());
    assert!(dir_is_empty(temp_dir.path()));
}

#[tokio::test]
async fn test_interrupted_stream_leaves_no_partial_file() {
    let temp_dir = TempDir::new().unwrap();
    let transport = Arc::new(FakeTransport::new());
    let body = png_bytes(32, 32);
    let (head, _) = body.split_at(body.len() / 2);
    transport.route(
        URL,
        Reply::Chunks(vec![
            Ok(head.to_vec()),
            Err(FetchError::Network {
                reason: "connection reset".to_string(),
            }),
        ]),
    );
    let cache = cache_with(&transport, temp_dir.path()).await;

    let entry = cache.get_or_fetch(&CacheKey::for_model(42, URL), URL).await;

    assert!(entry.is_failed());
    assert!(dir_is_empty(temp_dir.path()));
}

#[tokio::test]
async fn test_undecodable_body_fails_without_file() {
    let temp_dir = TempDir::new().unwrap();
    let transport = Arc::new(FakeTransport::new());
    transport.route(URL, Reply::Body(b"<html>not an image</html>".to_vec()));
    let cache = cache_with(&transport, temp_dir.path()).await;

    let entry = cache.get_or_fetch(&CacheKey::for_model(42, URL), URL).await;

    assert!(entry.is_failed());
    assert!(entry.error().unwrap().contains("decoded"));
    assert!(dir_is_empty(temp_dir.path()));
}

#[tokio::test]
async fn test_failed_entry_is_retried() {
    let temp_dir = TempDir::new().unwrap();
    let transport = Arc::new(FakeTransport::new());
    transport.route(URL, Reply::Error(FetchError::Timeout { seconds: 30 }));
    let cache = cache_with(&transport, temp_dir.path()).await;
    let key = CacheKey::for_model(42, URL);

    assert!(cache.get_or_fetch(&key, URL).await.is_failed());

    transport.route(URL, Reply::Chunks(vec![Ok(png_bytes(16, 16))]));
    assert!(cache.get_or_fetch(&key, URL).await.is_ready());
    assert_eq!(transport.calls_to(URL), 2);
}

#[tokio::test]
async fn test_invalid_url_fails_without_request() {
    let temp_dir = TempDir::new().unwrap();
    let transport = Arc::new(FakeTransport::new());
    let cache = cache_with(&transport, temp_dir.path()).await;

    let entry = cache
        .get_or_fetch(&CacheKey::for_model(1, "not a url"), "not a url")
        .await;

    assert!(entry.is_failed());
    assert_eq!(transport.total_calls(), 0);
}

#[tokio::test]
async fn test_entry_state_inspection() {
    let temp_dir = TempDir::new().unwrap();
    let transport = Arc::new(FakeTransport::new());
    transport.route(URL, Reply::Body(png_bytes(8, 8)));
    let cache = cache_with(&transport, temp_dir.path()).await;
    let key = CacheKey::for_model(5, URL);

    assert_eq!(cache.entry(&key).state, CacheState::Missing);
    cache.get_or_fetch(&key, URL).await;
    assert_eq!(cache.entry(&key).state, CacheState::Ready);
}

#[tokio::test]
async fn test_stats_and_clear() {
    let temp_dir = TempDir::new().unwrap();
    let transport = Arc::new(FakeTransport::new());
    let other = "https://image.civitai.test/b/preview.png";
    transport.route(URL, Reply::Body(png_bytes(8, 8)));
    transport.route(other, Reply::Error(FetchError::Status { status: 500 }));
    let cache = cache_with(&transport, temp_dir.path()).await;

    cache.get_or_fetch(&CacheKey::for_model(1, URL), URL).await;
    cache.get_or_fetch(&CacheKey::for_model(2, other), other).await;

    let stats = cache.stats().await;
    assert_eq!(stats.cached_files_count, 1);
    assert!(stats.total_cache_size > 0);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.downloading, 0);

    assert_eq!(cache.clear().await.unwrap(), 1);
    let stats = cache.stats().await;
    assert_eq!(stats.cached_files_count, 0);
    assert_eq!(stats.failed, 0);

    // Cleared thumbnails are downloaded again on the next reference
    cache.get_or_fetch(&CacheKey::for_model(1, URL), URL).await;
    assert_eq!(transport.calls_to(URL), 2);
}

#[tokio::test]
async fn test_stalled_download_fails_at_deadline() {
    let temp_dir = TempDir::new().unwrap();
    let transport = Arc::new(FakeTransport::new());
    let body = png_bytes(32, 32);
    transport.route(URL, Reply::Stalled(body[..body.len() / 2].to_vec()));
    let config = CacheConfig::with_cache_root(temp_dir.path().to_path_buf())
        .with_download_timeout(Duration::from_millis(100));
    let cache = ImageCache::new(config, transport.clone()).await.unwrap();
    let key = CacheKey::for_model(42, URL);

    let entry = cache.get_or_fetch(&key, URL).await;

    assert!(entry.is_failed());
    assert!(entry.error().unwrap().contains("timed out"));
    assert!(dir_is_empty(temp_dir.path()));
    assert_eq!(cache.entry(&key).state, entry.state);

    let stats = cache.stats().await;
    assert_eq!(stats.downloading, 0);
    assert_eq!(stats.failed, 1);

    // Nothing is published later either
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(dir_is_empty(temp_dir.path()));
}

#[tokio::test]
async fn test_deadline_covers_the_connection() {
    let temp_dir = TempDir::new().unwrap();
    let transport = Arc::new(FakeTransport::new());
    let _gate = transport.route_gated(URL, Reply::Body(png_bytes(8, 8)));
    let config = CacheConfig::with_cache_root(temp_dir.path().to_path_buf())
        .with_download_timeout(Duration::from_millis(50));
    let cache = ImageCache::new(config, transport.clone()).await.unwrap();

    let entry = cache.get_or_fetch(&CacheKey::for_model(1, URL), URL).await;

    assert!(entry.is_failed());
    assert!(dir_is_empty(temp_dir.path()));
}

#[tokio::test]
async fn test_ready_slots_are_released() {
    let temp_dir = TempDir::new().unwrap();
    let transport = Arc::new(FakeTransport::new());
    let broken = "https://image.civitai.test/b/broken.png";
    transport.route(URL, Reply::Body(png_bytes(8, 8)));
    transport.route(broken, Reply::Error(FetchError::Status { status: 500 }));
    let cache = cache_with(&transport, temp_dir.path()).await;

    for model_id in 0..20 {
        let entry = cache
            .get_or_fetch(&CacheKey::for_model(model_id, URL), URL)
            .await;
        assert!(entry.is_ready());
    }
    cache
        .get_or_fetch(&CacheKey::for_model(99, broken), broken)
        .await;

    // Only the failure is remembered; published files speak for themselves
    assert_eq!(cache.tracked_keys(), 1);
    assert_eq!(cache.entry(&CacheKey::for_model(3, URL)).state, CacheState::Ready);
    assert_eq!(cache.stats().await.failed, 1);

    // A released key is still a hit
    cache
        .get_or_fetch(&CacheKey::for_model(3, URL), URL)
        .await;
    assert_eq!(transport.calls_to(URL), 20);
}

#[tokio::test]
async fn test_clear_keeps_in_flight_download() {
    let temp_dir = TempDir::new().unwrap();
    let transport = Arc::new(FakeTransport::new());
    let gate = transport.route_gated(URL, Reply::Body(png_bytes(16, 16)));
    let cache = cache_with(&transport, temp_dir.path()).await;
    let key = CacheKey::for_model(42, URL);

    let in_flight = cache.get_or_fetch(&key, URL);
    let clear_then_request = async {
        while transport.calls_to(URL) == 0 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        assert_eq!(cache.clear().await.unwrap(), 0);

        let release = async {
            for _ in 0..10 {
                tokio::task::yield_now().await;
            }
            // Enough permits for a second download, should one start
            gate.open();
            gate.open();
        };
        let (entry, ()) = tokio::join!(cache.get_or_fetch(&key, URL), release);
        entry
    };
    let (first, second) = tokio::join!(in_flight, clear_then_request);

    assert!(first.is_ready());
    assert!(second.is_ready());
    assert_eq!(transport.calls_to(URL), 1);
}

#[tokio::test]
async fn test_zero_dimension_config_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let transport = Arc::new(FakeTransport::new());
    let config =
        CacheConfig::with_cache_root(temp_dir.path().to_path_buf()).with_max_thumbnail_dimension(0);

    assert!(ImageCache::new(config, transport).await.is_err());
}
