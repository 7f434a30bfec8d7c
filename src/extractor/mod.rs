//! Video extraction backends
//!
//! Site parsing, format negotiation, and the actual media transfer belong to
//! an external extractor. This module wraps it behind the [`MediaExtractor`]
//! trait, which exposes exactly two operations: `probe` for metadata and
//! `fetch` for the bytes.
//!
//! ## Implementations
//!
//! - [`YtDlpExtractor`]: drives an external `yt-dlp` binary
//! - [`NoOpExtractor`]: stand-in when no binary is available, so the server
//!   still starts and reports the problem per request
//!
//! ## Usage
//!
//! ```no_run
//! use vidfetch::extractor::{MediaExtractor, YtDlpExtractor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let extractor = YtDlpExtractor::from_path()
//!         .expect("yt-dlp binary not found");
//!
//!     let info = extractor.probe("https://example.com/watch?v=abc").await?;
//!     println!("{}", info.display_name());
//!     Ok(())
//! }
//! ```

mod noop;
mod parser;
mod traits;
mod ytdlp;

pub use noop::NoOpExtractor;
pub use parser::{parse_probe_output, parse_progress_line, progress_template};
pub use traits::MediaExtractor;
pub use ytdlp::YtDlpExtractor;

use crate::config::ExtractorConfig;
use std::sync::Arc;

/// Pick the extractor described by the configuration
///
/// An explicit `binary_path` wins; otherwise PATH is searched when allowed.
/// Falls back to [`NoOpExtractor`] with a warning.
pub fn from_config(config: &ExtractorConfig) -> Arc<dyn MediaExtractor> {
    let binary = match &config.binary_path {
        Some(path) => Some(path.clone()),
        None if config.search_path => which::which("yt-dlp").ok(),
        None => None,
    };

    match binary {
        Some(path) => {
            tracing::info!(binary = ?path, "using yt-dlp extractor");
            Arc::new(YtDlpExtractor::with_config(path, config))
        }
        None => {
            tracing::warn!(
                "yt-dlp binary not found; downloads will be rejected. \
                 Configure extractor.binary_path or install yt-dlp on PATH."
            );
            Arc::new(NoOpExtractor)
        }
    }
}
