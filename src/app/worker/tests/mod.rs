//! Tests for the worker pool against a scripted transport

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use tokio::sync::mpsc;

use crate::app::cache::{CacheConfig, CacheKey, ImageCache};
use crate::app::client::tests::{png_bytes, FakeTransport, Reply};
use crate::app::client::PageFetcher;
use crate::app::models::PageQuery;
use crate::app::worker::{Job, JobOutcome, PoolState, WorkerConfig, WorkerPool};
use crate::errors::{CoordinatorError, FetchError};

const BASE: &str = "https://civitai.test/api/v1";
const THUMB: &str = "https://image.civitai.test/a/preview.png";

struct Harness {
    transport: Arc<FakeTransport>,
    fetcher: PageFetcher,
    pool: WorkerPool,
    outcomes: mpsc::UnboundedReceiver<JobOutcome>,
    _cache_dir: TempDir,
}

async fn harness(config: WorkerConfig) -> Harness {
    let cache_dir = TempDir::new().unwrap();
    let transport = Arc::new(FakeTransport::new());
    let fetcher = PageFetcher::new(transport.clone(), BASE).unwrap();
    let cache = ImageCache::new(
        CacheConfig::with_cache_root(cache_dir.path().to_path_buf()),
        transport.clone(),
    )
    .await
    .unwrap();

    let (outcome_tx, outcomes) = mpsc::unbounded_channel();
    let pool = WorkerPool::start(config, fetcher.clone(), Arc::new(cache), outcome_tx).unwrap();

    Harness {
        transport,
        fetcher,
        pool,
        outcomes,
        _cache_dir: cache_dir,
    }
}

async fn next_outcome(rx: &mut mpsc::UnboundedReceiver<JobOutcome>) -> JobOutcome {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("no outcome within 5s")
        .expect("outcome channel closed")
}

#[tokio::test]
async fn test_page_job_reports_page() {
    let mut h = harness(WorkerConfig::default().with_worker_count(2)).await;
    let query = PageQuery::first(10).unwrap();
    h.transport.route_json(
        h.fetcher.listing_url(&query).as_str(),
        json!({"items": [{"id": 1, "name": "a"}], "metadata": {"currentPage": 1, "totalPages": 3}}),
    );

    h.pool
        .dispatch(Job::FetchPage {
            generation: 7,
            query: query.clone(),
        })
        .await
        .unwrap();

    match next_outcome(&mut h.outcomes).await {
        JobOutcome::Page { generation, result } => {
            assert_eq!(generation, 7);
            let page = result.unwrap();
            assert_eq!(page.query, query);
            assert_eq!(page.total_pages, 3);
        }
        other => panic!("unexpected outcome {:?}", other),
    }

    let stats = h.pool.stats();
    assert_eq!(stats.jobs_dispatched, 1);
    assert_eq!(stats.jobs_completed, 1);
    h.pool.shutdown().await;
}

#[tokio::test]
async fn test_thumbnail_jobs_report_path_or_reason() {
    let mut h = harness(WorkerConfig::default()).await;
    let missing = "https://image.civitai.test/missing.png";
    h.transport.route(THUMB, Reply::Body(png_bytes(200, 100)));
    h.transport
        .route(missing, Reply::Error(FetchError::Status { status: 404 }));

    for (model_id, url) in [(1u64, THUMB), (2u64, missing)] {
        h.pool
            .dispatch(Job::FetchThumbnail {
                generation: 1,
                model_id,
                key: CacheKey::for_model(model_id, url),
                url: url.to_string(),
            })
            .await
            .unwrap();
    }

    let mut ready = None;
    let mut failed = None;
    for _ in 0..2 {
        match next_outcome(&mut h.outcomes).await {
            JobOutcome::Thumbnail {
                model_id: 1,
                result,
                ..
            } => ready = Some(result),
            JobOutcome::Thumbnail {
                model_id: 2,
                result,
                ..
            } => failed = Some(result),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    let path = ready.unwrap().unwrap();
    assert!(path.exists());
    assert!(failed.unwrap().unwrap_err().contains("404"));
    h.pool.shutdown().await;
}

#[tokio::test]
async fn test_page_deadline_produces_timeout() {
    let config = WorkerConfig::default()
        .with_worker_count(1)
        .with_page_timeout(Duration::from_millis(50));
    let mut h = harness(config).await;
    let query = PageQuery::first(10).unwrap();
    // Gate is never opened: the server never answers
    let _gate = h
        .transport
        .route_gated(h.fetcher.listing_url(&query).as_str(), Reply::Body(b"{}".to_vec()));

    h.pool
        .dispatch(Job::FetchPage {
            generation: 1,
            query,
        })
        .await
        .unwrap();

    match next_outcome(&mut h.outcomes).await {
        JobOutcome::Page { result, .. } => {
            assert!(matches!(result, Err(FetchError::Timeout { .. })));
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(h.pool.stats().jobs_timed_out, 1);
    h.pool.shutdown().await;
}

#[tokio::test]
async fn test_lanes_run_concurrently() {
    let mut h = harness(WorkerConfig::default().with_worker_count(2)).await;
    let first = PageQuery::first(10).unwrap();
    let second = first.with_page(2).unwrap();
    let gate_one = h.transport.route_gated(
        h.fetcher.listing_url(&first).as_str(),
        Reply::Body(b"{}".to_vec()),
    );
    let gate_two = h.transport.route_gated(
        h.fetcher.listing_url(&second).as_str(),
        Reply::Body(b"{}".to_vec()),
    );

    for (generation, query) in [(1, first), (2, second)] {
        h.pool
            .dispatch(Job::FetchPage { generation, query })
            .await
            .unwrap();
    }

    // Both requests reach the server before either is answered
    tokio::time::timeout(Duration::from_secs(5), async {
        while h.transport.total_calls() < 2 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("second lane never picked up its job");

    gate_two.open();
    match next_outcome(&mut h.outcomes).await {
        JobOutcome::Page { generation, .. } => assert_eq!(generation, 2),
        other => panic!("unexpected outcome {:?}", other),
    }
    gate_one.open();
    match next_outcome(&mut h.outcomes).await {
        JobOutcome::Page { generation, .. } => assert_eq!(generation, 1),
        other => panic!("unexpected outcome {:?}", other),
    }
    h.pool.shutdown().await;
}

fn thumbnail(generation: u64, model_id: u64, url: &str) -> Job {
    Job::FetchThumbnail {
        generation,
        model_id,
        key: CacheKey::for_model(model_id, url),
        url: url.to_string(),
    }
}

async fn wait_for_call(transport: &FakeTransport, url: &str) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while transport.calls_to(url) == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("request never reached the server");
}

#[tokio::test]
async fn test_page_jobs_run_before_queued_thumbnails() {
    let mut h = harness(WorkerConfig::default().with_worker_count(1)).await;
    let other = "https://image.civitai.test/b/preview.png";
    let gate = h.transport.route_gated(THUMB, Reply::Body(png_bytes(8, 8)));
    h.transport.route(other, Reply::Body(png_bytes(8, 8)));
    let query = PageQuery::first(10).unwrap();
    h.transport.route_json(
        h.fetcher.listing_url(&query).as_str(),
        json!({"items": [], "metadata": {"currentPage": 1, "totalPages": 1}}),
    );

    h.pool.dispatch(thumbnail(1, 1, THUMB)).await.unwrap();
    wait_for_call(&h.transport, THUMB).await;

    // Queued behind the busy lane: a thumbnail first, then a page
    h.pool.dispatch(thumbnail(1, 2, other)).await.unwrap();
    h.pool
        .dispatch(Job::FetchPage {
            generation: 1,
            query,
        })
        .await
        .unwrap();
    gate.open();

    assert!(matches!(
        next_outcome(&mut h.outcomes).await,
        JobOutcome::Thumbnail { model_id: 1, .. }
    ));
    assert!(matches!(
        next_outcome(&mut h.outcomes).await,
        JobOutcome::Page { generation: 1, .. }
    ));
    assert!(matches!(
        next_outcome(&mut h.outcomes).await,
        JobOutcome::Thumbnail { model_id: 2, .. }
    ));
    h.pool.shutdown().await;
}

#[tokio::test]
async fn test_superseded_jobs_are_skipped() {
    let mut h = harness(WorkerConfig::default().with_worker_count(1)).await;
    let stale_image = "https://image.civitai.test/b/preview.png";
    let gate = h.transport.route_gated(THUMB, Reply::Body(png_bytes(8, 8)));
    h.transport.route(stale_image, Reply::Body(png_bytes(8, 8)));
    let stale_page = PageQuery::first(10).unwrap();
    let current_page = stale_page.with_page(2).unwrap();
    h.transport.route_json(
        h.fetcher.listing_url(&current_page).as_str(),
        json!({"items": [], "metadata": {"currentPage": 2, "totalPages": 2}}),
    );

    h.pool.advance_generation(1);
    h.pool.dispatch(thumbnail(1, 1, THUMB)).await.unwrap();
    wait_for_call(&h.transport, THUMB).await;

    h.pool.dispatch(thumbnail(1, 2, stale_image)).await.unwrap();
    h.pool
        .dispatch(Job::FetchPage {
            generation: 1,
            query: stale_page.clone(),
        })
        .await
        .unwrap();
    h.pool.advance_generation(2);
    h.pool
        .dispatch(Job::FetchPage {
            generation: 2,
            query: current_page,
        })
        .await
        .unwrap();

    // A lower generation never moves the watched value back
    h.pool.advance_generation(1);
    gate.open();

    // The job already running still reports; the coordinator drops it
    assert!(matches!(
        next_outcome(&mut h.outcomes).await,
        JobOutcome::Thumbnail { model_id: 1, .. }
    ));
    assert!(matches!(
        next_outcome(&mut h.outcomes).await,
        JobOutcome::Skipped { generation: 1 }
    ));
    assert!(matches!(
        next_outcome(&mut h.outcomes).await,
        JobOutcome::Page { generation: 2, .. }
    ));

    tokio::time::timeout(Duration::from_secs(5), async {
        while h.pool.stats().jobs_skipped < 2 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("stale thumbnail was never skipped");

    assert_eq!(h.transport.calls_to(stale_image), 0);
    assert_eq!(
        h.transport
            .calls_to(h.fetcher.listing_url(&stale_page).as_str()),
        0
    );
    let stats = h.pool.stats();
    assert_eq!(stats.jobs_completed, 2);
    assert_eq!(stats.in_flight(), 0);
    h.pool.shutdown().await;
}

#[tokio::test]
async fn test_dispatch_after_shutdown_is_rejected() {
    let mut h = harness(WorkerConfig::default()).await;
    h.pool.shutdown().await;
    assert_eq!(h.pool.state(), PoolState::Shutdown);

    let result = h
        .pool
        .dispatch(Job::FetchPage {
            generation: 1,
            query: PageQuery::first(10).unwrap(),
        })
        .await;
    assert_eq!(result, Err(CoordinatorError::Closed));
}

#[tokio::test]
async fn test_invalid_config_rejected() {
    let cache_dir = TempDir::new().unwrap();
    let transport = Arc::new(FakeTransport::new());
    let fetcher = PageFetcher::new(transport.clone(), BASE).unwrap();
    let cache = ImageCache::new(
        CacheConfig::with_cache_root(cache_dir.path().to_path_buf()),
        transport,
    )
    .await
    .unwrap();
    let (outcome_tx, _outcomes) = mpsc::unbounded_channel();

    let result = WorkerPool::start(
        WorkerConfig::default().with_worker_count(0),
        fetcher,
        Arc::new(cache),
        outcome_tx,
    );
    assert!(matches!(result, Err(CoordinatorError::Configuration(_))));
}
