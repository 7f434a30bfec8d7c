//! # vidfetch
//!
//! A small web front-end for downloading online videos through yt-dlp.
//!
//! A visitor submits a page URL, the server probes it, downloads the video
//! in the background into a private scratch directory, and reports progress
//! until the file can be collected. A file is handed out exactly once and
//! everything belonging to the task is removed afterwards.
//!
//! ## Quick Start
//!
//! ```no_run
//! use vidfetch::{Config, VideoFetcher};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let fetcher = VideoFetcher::new(config.clone()).await?;
//!
//!     let task_id = fetcher.submit("https://www.youtube.com/watch?v=dQw4w9WgXcQ").await?;
//!     println!("{:?}", fetcher.progress(&task_id).await?);
//!
//!     // Or serve the HTML page and JSON endpoints
//!     vidfetch::api::start_api_server(Arc::new(fetcher), Arc::new(config)).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Media extraction backends (yt-dlp)
pub mod extractor;
/// Download orchestration (decomposed into focused submodules)
pub mod fetcher;
/// Progress reporting from workers
pub mod progress;
/// In-memory task registry
pub mod store;
/// Core types
pub mod types;

pub use config::{ApiConfig, Config, ExtractorConfig, ServerIntegrationConfig, StorageConfig};
pub use error::{Error, Result};
pub use extractor::{MediaExtractor, NoOpExtractor, YtDlpExtractor};
pub use fetcher::{FileDownload, FileMetadata, VideoFetcher};
pub use progress::ProgressSink;
pub use store::{TaskRecord, TaskStore};
pub use types::{MediaInfo, ProgressInfo, TaskAccepted, TaskId};

/// Resolve once the process is asked to stop (SIGTERM or SIGINT)
///
/// Used as the graceful-shutdown trigger for the API server.
#[cfg(unix)]
pub async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Signal registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register signal handlers, using ctrl_c fallback");
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
            }
        }
    }
}

/// Resolve once the process is asked to stop (Ctrl+C)
#[cfg(not(unix))]
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
