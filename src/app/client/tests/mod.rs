//! Scripted transport for exercising the fetch pipeline without a network
//!
//! Routes are keyed by the exact URL string. A route can be gated so a test
//! decides when the "server" answers, which is how out-of-order completion
//! is simulated.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use tokio::sync::Semaphore;
use url::Url;

use crate::app::client::http::{ByteStream, HttpTransport};
use crate::errors::{FetchError, FetchResult};

/// What a route answers with
#[derive(Debug, Clone)]
pub enum Reply {
    /// Whole body in one chunk
    Body(Vec<u8>),
    /// Body split into chunks; an `Err` chunk fails the stream mid-way
    Chunks(Vec<FetchResult<Vec<u8>>>),
    /// Sends the given bytes, then never produces another chunk
    Stalled(Vec<u8>),
    /// Request fails before any body is produced
    Error(FetchError),
}

#[derive(Debug)]
struct Route {
    reply: Reply,
    gate: Option<Arc<Semaphore>>,
}

/// In-memory transport with call counting
#[derive(Debug, Default)]
pub struct FakeTransport {
    routes: Mutex<HashMap<String, Route>>,
    calls: Mutex<Vec<String>>,
}

/// Releases one pending request on a gated route per call to [`Gate::open`]
#[derive(Debug, Clone)]
pub struct Gate(Arc<Semaphore>);

impl Gate {
    pub fn open(&self) {
        self.0.add_permits(1);
    }
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&self, url: &str, reply: Reply) {
        self.routes.lock().unwrap().insert(
            url.to_string(),
            Route { reply, gate: None },
        );
    }

    pub fn route_json(&self, url: &str, value: serde_json::Value) {
        self.route(url, Reply::Body(serde_json::to_vec(&value).unwrap()));
    }

    /// Register a route whose requests wait until the returned gate opens
    pub fn route_gated(&self, url: &str, reply: Reply) -> Gate {
        let semaphore = Arc::new(Semaphore::new(0));
        self.routes.lock().unwrap().insert(
            url.to_string(),
            Route {
                reply,
                gate: Some(semaphore.clone()),
            },
        );
        Gate(semaphore)
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|called| called.as_str() == url)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    async fn answer(&self, url: &Url) -> FetchResult<Reply> {
        self.calls.lock().unwrap().push(url.to_string());

        let (reply, gate) = {
            let routes = self.routes.lock().unwrap();
            match routes.get(url.as_str()) {
                Some(route) => (route.reply.clone(), route.gate.clone()),
                None => return Err(FetchError::Status { status: 404 }),
            }
        };

        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }

        match reply {
            Reply::Error(error) => Err(error),
            other => Ok(other),
        }
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn get_body(&self, url: &Url) -> FetchResult<Vec<u8>> {
        match self.answer(url).await? {
            Reply::Body(body) => Ok(body),
            Reply::Chunks(chunks) => {
                let mut body = Vec::new();
                for chunk in chunks {
                    body.extend(chunk?);
                }
                Ok(body)
            }
            Reply::Stalled(_) => std::future::pending().await,
            Reply::Error(error) => Err(error),
        }
    }

    async fn get_stream(&self, url: &Url) -> FetchResult<ByteStream> {
        let chunks = match self.answer(url).await? {
            Reply::Body(body) => vec![Ok(body)],
            Reply::Chunks(chunks) => chunks,
            Reply::Stalled(head) => {
                let head = futures::stream::once(async move { Ok::<_, FetchError>(Bytes::from(head)) });
                return Ok(head.chain(futures::stream::pending()).boxed());
            }
            Reply::Error(error) => return Err(error),
        };
        Ok(futures::stream::iter(chunks.into_iter().map(|chunk| chunk.map(Bytes::from))).boxed())
    }
}

/// Encode a solid-colour PNG of the given size
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbImage::from_pixel(width, height, image::Rgb([200, 40, 90]));
    let mut buffer = std::io::Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, image::ImageFormat::Png)
        .unwrap();
    buffer.into_inner()
}
