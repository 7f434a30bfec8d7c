//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`downloads`] - submitting URLs, polling, collecting files
//! - [`system`] - the HTML page, health, OpenAPI

use serde::{Deserialize, Serialize};

mod downloads;
mod system;

pub use downloads::*;
pub use system::*;

// ============================================================================
// Request/Response Types (shared across handlers)
// ============================================================================

/// Form body for POST /download
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct DownloadForm {
    /// Page URL of the video to download
    #[serde(default)]
    pub url: Option<String>,
}

/// Response body for GET /health
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    /// Always "ok" when the server answers
    pub status: String,
    /// Crate version
    pub version: String,
    /// Tasks currently tracked (running, finished, or failed)
    pub active_tasks: usize,
    /// Extraction backend in use ("yt-dlp" or "noop")
    pub extractor: String,
}
