//! Application state for the API server

use crate::VideoFetcher;
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request (cheap Arc clone).
#[derive(Clone)]
pub struct AppState {
    /// The fetcher owning the task registry and the extractor
    pub fetcher: Arc<VideoFetcher>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(fetcher: Arc<VideoFetcher>) -> Self {
        Self { fetcher }
    }
}
