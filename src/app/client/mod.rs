//! HTTP client for the CivitAI API
//!
//! This module provides the network side of the browser: a rate-limited
//! reqwest transport and the paginated listing fetcher built on top of it.
//!
//! The module is organized into specialized components:
//! - `config`: HTTP client configuration and building
//! - `http`: the [`HttpTransport`] seam and its reqwest implementation
//! - `listing`: listing URL construction and page conversion

pub mod config;
pub mod http;
pub mod listing;

#[cfg(test)]
pub(crate) mod tests;

pub use config::ClientConfig;
pub use http::{ByteStream, HttpHandler, HttpTransport};
pub use listing::PageFetcher;
