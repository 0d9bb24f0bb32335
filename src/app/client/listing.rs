//! Paginated listing requests
//!
//! The [`PageFetcher`] turns a [`PageQuery`] into a listing URL, performs the
//! request through the shared transport and converts the body into a
//! [`ModelPage`].

use std::sync::Arc;

use tracing::{debug, info};
use url::Url;

use crate::app::client::http::HttpTransport;
use crate::app::models::{ListingResponse, ModelPage, PageQuery};
use crate::constants::api;
use crate::errors::{FetchError, FetchResult};

/// Fetches one page of the model listing
#[derive(Debug, Clone)]
pub struct PageFetcher {
    transport: Arc<dyn HttpTransport>,
    listing_url: Url,
}

impl PageFetcher {
    /// Create a fetcher for the listing endpoint under `api_base_url`
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidUrl` if the base URL does not parse
    pub fn new(transport: Arc<dyn HttpTransport>, api_base_url: &str) -> FetchResult<Self> {
        let listing_url = Self::resolve_listing_url(api_base_url)?;
        Ok(Self {
            transport,
            listing_url,
        })
    }

    fn resolve_listing_url(api_base_url: &str) -> FetchResult<Url> {
        // Without a trailing slash `join` would replace the last segment
        let normalized = if api_base_url.ends_with('/') {
            api_base_url.to_string()
        } else {
            format!("{}/", api_base_url)
        };

        Url::parse(&normalized)
            .and_then(|base| base.join(api::LISTING_PATH))
            .map_err(|e| FetchError::InvalidUrl {
                url: api_base_url.to_string(),
                reason: e.to_string(),
            })
    }

    /// Build the request URL for a query
    ///
    /// The search parameter is left out entirely when there is no search text.
    pub fn listing_url(&self, query: &PageQuery) -> Url {
        let mut url = self.listing_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair(api::PAGE_PARAM, &query.page().to_string());
            pairs.append_pair(api::LIMIT_PARAM, &query.page_size().to_string());
            if let Some(search) = query.search() {
                pairs.append_pair(api::QUERY_PARAM, search);
            }
        }
        url
    }

    /// Fetch and convert one listing page
    ///
    /// # Errors
    ///
    /// Returns `FetchError` on transport failure, non-success status or a body
    /// that is not JSON. Missing or mistyped fields never fail the page.
    pub async fn fetch(&self, query: &PageQuery) -> FetchResult<ModelPage> {
        let url = self.listing_url(query);
        info!("API call: {}", url);

        let body = self.transport.get_body(&url).await?;
        let listing = ListingResponse::parse(&body)?;
        let page = ModelPage::from_listing(query.clone(), listing);

        debug!(
            "Fetched {} models ({})",
            page.items.len(),
            page.label()
        );
        Ok(page)
    }
}
