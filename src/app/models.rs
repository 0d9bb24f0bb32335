//! Data models for the CivitAI browser
//!
//! This module defines the page query, the model summaries the presentation
//! layer renders, and the lenient wire types the listing response is read
//! through. Every wire field is optional: a partially filled listing entry
//! still produces a summary, and only an unparseable body fails a page.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::constants::{api, paging, thumbnails};
use crate::errors::{FetchError, FetchResult};

/// Text shown in place of a missing model identifier
pub const MISSING_ID_LABEL: &str = "N/A";

/// What was requested: page number, page size and optional search text
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageQuery {
    page: u32,
    page_size: u32,
    search: Option<String>,
}

impl PageQuery {
    /// Create a query, rejecting zero page numbers and out-of-range sizes
    ///
    /// Search text is trimmed; whitespace-only text counts as no search.
    pub fn new(page: u32, page_size: u32, search: Option<String>) -> FetchResult<Self> {
        if page == 0 {
            return Err(FetchError::InvalidQuery {
                reason: "page number must be at least 1".to_string(),
            });
        }
        if page_size == 0 || page_size > api::MAX_PAGE_SIZE {
            return Err(FetchError::InvalidQuery {
                reason: format!(
                    "page size must be between 1 and {}, got {}",
                    api::MAX_PAGE_SIZE,
                    page_size
                ),
            });
        }

        let search = search
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());

        Ok(Self {
            page,
            page_size,
            search,
        })
    }

    /// First page of the unfiltered listing
    pub fn first(page_size: u32) -> FetchResult<Self> {
        Self::new(paging::FIRST_PAGE, page_size, None)
    }

    /// 1-based page number
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Number of models per page
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Search text, `None` when the listing is unfiltered
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// Same size and search, different page
    pub fn with_page(&self, page: u32) -> FetchResult<Self> {
        Self::new(page, self.page_size, self.search.clone())
    }

    /// Page 1 of the given search, same size
    pub fn with_search(&self, search: Option<String>) -> FetchResult<Self> {
        Self::new(paging::FIRST_PAGE, self.page_size, search)
    }
}

/// One version of a model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelVersion {
    pub id: Option<u64>,
    pub name: String,
    pub base_model: String,
    pub download_url: String,
    /// First still image of the version, if any
    pub thumbnail_url: Option<String>,
}

/// One listing entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSummary {
    /// Stable numeric identifier; `None` when the entry omitted it
    pub id: Option<u64>,
    pub name: String,
    /// Model type as reported by the API ("Checkpoint", "LORA", ...)
    pub kind: String,
    pub is_adult_content: bool,
    pub allows_commercial_use: bool,
    pub versions: Vec<ModelVersion>,
}

impl ModelSummary {
    /// Identifier for display, "N/A" when missing
    pub fn display_id(&self) -> String {
        self.id
            .map(|id| id.to_string())
            .unwrap_or_else(|| MISSING_ID_LABEL.to_string())
    }

    /// The version the listing shows first
    pub fn primary_version(&self) -> Option<&ModelVersion> {
        self.versions.first()
    }

    /// Thumbnail of the model: first image of its first version
    pub fn thumbnail_url(&self) -> Option<&str> {
        self.primary_version()
            .and_then(|version| version.thumbnail_url.as_deref())
    }

    /// Download link of the primary version for the details view
    pub fn download_url(&self) -> Option<&str> {
        self.primary_version()
            .map(|version| version.download_url.as_str())
            .filter(|url| !url.is_empty())
    }
}

/// One server response worth of model summaries plus pagination metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPage {
    pub query: PageQuery,
    pub items: Vec<ModelSummary>,
    pub current_page: u32,
    pub total_pages: u32,
}

impl ModelPage {
    /// Build a page from a parsed listing body
    ///
    /// Pagination defaults to 1 of 1 when metadata is missing, and
    /// `current_page` is clamped into `1..=total_pages` when the total is known.
    pub fn from_listing(query: PageQuery, listing: ListingResponse) -> Self {
        let metadata = listing.metadata.unwrap_or_default();
        let total_pages = metadata.total_pages.unwrap_or(1);
        let mut current_page = metadata.current_page.unwrap_or(1).max(1);
        if total_pages > 0 {
            current_page = current_page.min(total_pages);
        }

        let items = listing
            .items
            .into_iter()
            .map(ModelSummary::from)
            .collect();

        Self {
            query,
            items,
            current_page,
            total_pages,
        }
    }

    /// Whether "previous page" navigation is available
    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    /// Whether "next page" navigation is available
    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    /// Whether `page` lies within the known range of this listing
    pub fn contains_page(&self, page: u32) -> bool {
        page >= 1 && page <= self.total_pages.max(1)
    }

    /// "Page X of Y"
    pub fn label(&self) -> String {
        format!("Page {} of {}", self.current_page, self.total_pages)
    }

    /// Items that can have a thumbnail fetched: an identifier and an image URL
    pub fn thumbnail_targets(&self) -> impl Iterator<Item = (u64, &str)> + '_ {
        self.items
            .iter()
            .filter_map(|item| Some((item.id?, item.thumbnail_url()?)))
    }
}

/// Top-level listing body
///
/// Items are kept as raw JSON so a single malformed entry is dropped with a
/// warning instead of failing the whole page.
#[derive(Debug, Default)]
pub struct ListingResponse {
    pub items: Vec<RawModel>,
    pub metadata: Option<RawMetadata>,
}

impl ListingResponse {
    /// Parse a listing body
    ///
    /// Only bytes that are not JSON at all produce an error. Any other shape
    /// mismatch degrades to defaults.
    pub fn parse(body: &[u8]) -> FetchResult<Self> {
        let value: Value = serde_json::from_slice(body)?;
        Ok(Self::from_value(value))
    }

    fn from_value(value: Value) -> Self {
        let Value::Object(mut object) = value else {
            warn!("Listing response is not a JSON object; treating it as empty");
            return Self::default();
        };

        let items = match object.remove("items") {
            Some(Value::Array(entries)) => entries
                .into_iter()
                .enumerate()
                .filter_map(|(index, entry)| match serde_json::from_value(entry) {
                    Ok(model) => Some(model),
                    Err(e) => {
                        warn!("Skipping malformed listing entry {}: {}", index, e);
                        None
                    }
                })
                .collect(),
            Some(Value::Null) | None => Vec::new(),
            Some(other) => {
                warn!("Listing 'items' is not an array ({}); ignoring", type_name(&other));
                Vec::new()
            }
        };

        let metadata = object
            .remove("metadata")
            .and_then(|value| serde_json::from_value(value).ok());

        Self { items, metadata }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Pagination metadata of a listing body
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMetadata {
    #[serde(default)]
    pub current_page: Option<u32>,
    #[serde(default)]
    pub total_pages: Option<u32>,
}

/// One listing entry as sent by the API
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawModel {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub nsfw: Option<bool>,
    /// Older responses send a bool or a single string, newer ones an array
    #[serde(default)]
    pub allow_commercial_use: Option<Value>,
    #[serde(default)]
    pub model_versions: Option<Vec<RawVersion>>,
}

/// One model version as sent by the API
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVersion {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub base_model: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<RawImage>>,
}

/// Preview media attached to a version
#[derive(Debug, Default, Deserialize)]
pub struct RawImage {
    #[serde(default)]
    pub url: Option<String>,
}

impl From<RawModel> for ModelSummary {
    fn from(raw: RawModel) -> Self {
        Self {
            id: raw.id,
            name: raw.name.unwrap_or_default(),
            kind: raw.kind.unwrap_or_default(),
            is_adult_content: raw.nsfw.unwrap_or(false),
            allows_commercial_use: raw
                .allow_commercial_use
                .as_ref()
                .map(commercial_use_allowed)
                .unwrap_or(false),
            versions: raw
                .model_versions
                .unwrap_or_default()
                .into_iter()
                .map(ModelVersion::from)
                .collect(),
        }
    }
}

impl From<RawVersion> for ModelVersion {
    fn from(raw: RawVersion) -> Self {
        let thumbnail_url = raw
            .images
            .unwrap_or_default()
            .into_iter()
            .filter_map(|image| image.url)
            .find(|url| !url.is_empty() && !is_video_url(url));

        Self {
            id: raw.id,
            name: raw.name.unwrap_or_default(),
            base_model: raw.base_model.unwrap_or_default(),
            download_url: raw.download_url.unwrap_or_default(),
            thumbnail_url,
        }
    }
}

fn commercial_use_allowed(value: &Value) -> bool {
    match value {
        Value::Bool(allowed) => *allowed,
        Value::String(mode) => !mode.is_empty() && !mode.eq_ignore_ascii_case("none"),
        Value::Array(modes) => modes.iter().any(commercial_use_allowed),
        _ => false,
    }
}

/// Whether a preview URL points at a video rather than a still image
pub fn is_video_url(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let lower = path.to_ascii_lowercase();
    thumbnails::VIDEO_SUFFIXES
        .iter()
        .any(|suffix| lower.ends_with(suffix))
}
