//! Core HTTP operations with rate limiting
//!
//! [`HttpTransport`] is the seam between the fetch pipeline and the network:
//! the listing fetcher reads whole bodies, the thumbnail cache streams them.
//! [`HttpHandler`] is the reqwest-backed implementation used in production.

use std::fmt;
use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use governor::{clock::DefaultClock, state::InMemoryState, state::NotKeyed, Jitter, Quota, RateLimiter};
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::app::client::config::ClientConfig;
use crate::errors::{FetchError, FetchResult};

/// Stream of body chunks of a successful response
pub type ByteStream = BoxStream<'static, FetchResult<Bytes>>;

/// GET-only transport used by the fetch pipeline
///
/// Implementations must turn a non-success status into
/// [`FetchError::Status`] before any body is handed out.
#[async_trait]
pub trait HttpTransport: Send + Sync + fmt::Debug {
    /// Fetch the complete body of `url`
    async fn get_body(&self, url: &Url) -> FetchResult<Vec<u8>>;

    /// Fetch `url` and hand the body out chunk by chunk
    async fn get_stream(&self, url: &Url) -> FetchResult<ByteStream>;
}

/// reqwest-backed transport with a shared rate limiter
pub struct HttpHandler {
    client: Client,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    request_timeout: Duration,
}

impl fmt::Debug for HttpHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpHandler")
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl HttpHandler {
    /// Creates a new HttpHandler from the client configuration
    ///
    /// # Errors
    ///
    /// Returns `FetchError` if the client cannot be built or the rate limit is zero
    pub fn new(config: &ClientConfig) -> FetchResult<Self> {
        let client = config.build_http_client()?;
        let rate_limiter = Self::build_rate_limiter(config.rate_limit_rps)?;
        Ok(Self {
            client,
            rate_limiter,
            request_timeout: config.request_timeout,
        })
    }

    fn build_rate_limiter(
        rate_limit_rps: u32,
    ) -> FetchResult<RateLimiter<NotKeyed, InMemoryState, DefaultClock>> {
        let rate = NonZeroU32::new(rate_limit_rps).ok_or_else(|| FetchError::InvalidQuery {
            reason: "rate limit must be non-zero".to_string(),
        })?;
        Ok(RateLimiter::direct(Quota::per_second(rate)))
    }

    /// Sends a GET and rejects non-success statuses
    async fn get_response(&self, url: &Url) -> FetchResult<reqwest::Response> {
        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(50)))
            .await;

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            debug!("GET {} returned HTTP {}", url, status);
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        debug!("Successfully fetched response: {}", url);
        Ok(response)
    }

    fn classify(&self, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout {
                seconds: self.request_timeout.as_secs(),
            }
        } else {
            FetchError::from(error)
        }
    }
}

#[async_trait]
impl HttpTransport for HttpHandler {
    async fn get_body(&self, url: &Url) -> FetchResult<Vec<u8>> {
        let response = self.get_response(url).await?;
        let bytes = response.bytes().await.map_err(|e| self.classify(e))?;
        Ok(bytes.to_vec())
    }

    async fn get_stream(&self, url: &Url) -> FetchResult<ByteStream> {
        let response = self.get_response(url).await?;
        let timeout_secs = self.request_timeout.as_secs();
        Ok(response
            .bytes_stream()
            .map_err(move |e| {
                if e.is_timeout() {
                    FetchError::Timeout {
                        seconds: timeout_secs,
                    }
                } else {
                    FetchError::from(e)
                }
            })
            .boxed())
    }
}
