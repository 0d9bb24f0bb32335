//! Cache key derivation
//!
//! A key combines the numeric model identifier with a short digest of the
//! thumbnail URL. Two models never share a file, and a model whose preview
//! image changes gets a fresh entry instead of a stale one.

use std::fmt;

use crate::constants::{files, thumbnails};

/// Collision-safe name of one cached thumbnail
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key for the thumbnail `url` of model `model_id`
    pub fn for_model(model_id: u64, url: &str) -> Self {
        let digest = format!("{:x}", md5::compute(url.as_bytes()));
        Self(format!(
            "{}-{}",
            model_id,
            &digest[..thumbnails::URL_DIGEST_LEN]
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the published thumbnail
    pub fn file_name(&self) -> String {
        format!("{}{}", self.0, files::THUMBNAIL_SUFFIX)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
