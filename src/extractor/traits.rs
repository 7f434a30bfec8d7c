//! The extractor seam

use crate::progress::ProgressSink;
use crate::types::MediaInfo;
use async_trait::async_trait;
use std::path::Path;

/// External video extraction backend
///
/// Implementations may shell out to a binary, call a library, or (in tests)
/// script their behaviour. Both operations report failures as
/// `Error::Extraction` with a message fit for end users.
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Resolve title and container extension without downloading content
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is unsupported or the extractor cannot run.
    async fn probe(&self, url: &str) -> crate::Result<MediaInfo>;

    /// Download the media for `url` into `dest_dir`
    ///
    /// Byte counts are forwarded to `progress` as they arrive. The extractor
    /// may leave more than one file behind (sidecars, thumbnails); picking the
    /// artifact is the caller's job.
    ///
    /// # Errors
    ///
    /// Returns an error if the download fails at any point.
    async fn fetch(&self, url: &str, dest_dir: &Path, progress: &ProgressSink)
    -> crate::Result<()>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
