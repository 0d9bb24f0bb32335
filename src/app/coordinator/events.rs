//! Messages crossing the coordinator boundary
//!
//! [`PresentationEvent`] is everything the presentation layer is told.
//! [`Command`] is everything it can ask for, plus the coordinator's own
//! lifecycle requests.

use std::path::PathBuf;

use tokio::sync::oneshot;

use crate::app::models::{ModelPage, PageQuery};
use crate::errors::FetchError;

use super::CoordinatorSnapshot;

/// Notification for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresentationEvent {
    /// The current page request succeeded
    PageReady(ModelPage),
    /// The current page request failed, or a navigation was rejected locally
    PageFailed(FetchError),
    /// A thumbnail of the current page is on disk
    ThumbnailReady { model_id: u64, path: PathBuf },
    /// A thumbnail of the current page could not be produced
    ThumbnailFailed { model_id: u64, reason: String },
}

/// Relative or absolute move within the listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Next,
    Previous,
    GoTo(u32),
    Search(String),
    Home,
}

#[derive(Debug)]
pub(crate) enum Command {
    RequestPage(PageQuery),
    Navigate(Navigation),
    RequestThumbnail { model_id: u64, url: String },
    Snapshot(oneshot::Sender<CoordinatorSnapshot>),
    Shutdown(oneshot::Sender<()>),
}
