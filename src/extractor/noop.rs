//! No-op extractor for graceful degradation

use super::traits::MediaExtractor;
use crate::progress::ProgressSink;
use crate::types::MediaInfo;
use async_trait::async_trait;
use std::path::Path;

const MISSING_BINARY: &str = "video downloads require the yt-dlp binary. \
     Configure extractor.binary_path or ensure yt-dlp is in PATH.";

/// Extractor used when no yt-dlp binary is available
///
/// Every operation returns `Error::NotSupported`, so requests fail fast with
/// a clear message instead of the server refusing to start.
///
/// # Examples
///
/// ```
/// use vidfetch::extractor::{MediaExtractor, NoOpExtractor};
///
/// # #[tokio::main]
/// # async fn main() {
/// let extractor = NoOpExtractor;
/// assert!(extractor.probe("https://example.com/v").await.is_err());
/// # }
/// ```
pub struct NoOpExtractor;

#[async_trait]
impl MediaExtractor for NoOpExtractor {
    async fn probe(&self, _url: &str) -> crate::Result<MediaInfo> {
        Err(crate::Error::NotSupported(MISSING_BINARY.into()))
    }

    async fn fetch(
        &self,
        _url: &str,
        _dest_dir: &Path,
        _progress: &ProgressSink,
    ) -> crate::Result<()> {
        Err(crate::Error::NotSupported(MISSING_BINARY.into()))
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
