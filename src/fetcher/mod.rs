//! Download orchestration split into focused submodules.
//!
//! The `VideoFetcher` struct ties the task registry to an extractor:
//! - [`worker`] - one spawned task per accepted download
//! - [`retrieval`] - handing the file to the client and cleaning up after it

mod retrieval;
mod worker;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

pub use retrieval::{CleanupGuard, CleanupStream, FileDownload, FileMetadata};
pub use worker::select_primary_file;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::extractor::{self, MediaExtractor};
use crate::store::TaskStore;
use crate::types::{ProgressInfo, TaskId};
use std::sync::Arc;

/// User-facing message when the form arrives without a URL
pub const MISSING_URL_MESSAGE: &str = "Please provide a video URL.";

/// Main fetcher instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct VideoFetcher {
    /// Task registry shared with the workers
    pub(crate) store: TaskStore,
    /// Extraction backend (trait object for pluggable implementations)
    pub(crate) extractor: Arc<dyn MediaExtractor>,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
}

impl VideoFetcher {
    /// Create a fetcher using the extractor described by `config`
    ///
    /// Creates the scratch root if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the scratch root
    /// cannot be created.
    pub async fn new(config: Config) -> Result<Self> {
        let extractor = extractor::from_config(&config.extractor);
        Self::with_extractor(config, extractor).await
    }

    /// Create a fetcher around an explicit extractor
    ///
    /// A relative scratch root is resolved against the current directory
    /// once, so every recorded path is absolute.
    pub async fn with_extractor(
        mut config: Config,
        extractor: Arc<dyn MediaExtractor>,
    ) -> Result<Self> {
        config.validate()?;
        config.storage.scratch_root = std::path::absolute(&config.storage.scratch_root)
            .map_err(|e| Error::Config {
                message: format!(
                    "cannot resolve scratch root {}: {}",
                    config.storage.scratch_root.display(),
                    e
                ),
                key: Some("storage.scratch_root".to_string()),
            })?;
        tokio::fs::create_dir_all(&config.storage.scratch_root)
            .await
            .map_err(|e| Error::Config {
                message: format!(
                    "cannot create scratch root {}: {}",
                    config.storage.scratch_root.display(),
                    e
                ),
                key: Some("storage.scratch_root".to_string()),
            })?;

        tracing::info!(
            scratch_root = ?config.storage.scratch_root,
            extractor = extractor.name(),
            "video fetcher ready"
        );

        Ok(Self {
            store: TaskStore::new(),
            extractor,
            config: Arc::new(config),
        })
    }

    /// The task registry
    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    /// The active configuration
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Name of the extraction backend in use
    pub fn extractor_name(&self) -> &'static str {
        self.extractor.name()
    }

    /// Accept a download request
    ///
    /// Probes the URL before returning so obviously bad URLs fail here, then
    /// spawns the worker and returns without waiting for it.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if `url` is blank
    /// - `Extraction`, `NotSupported` or `ExternalTool` if probing fails
    pub async fn submit(&self, url: &str) -> Result<TaskId> {
        let url = url.trim();
        if url.is_empty() {
            return Err(Error::InvalidInput(MISSING_URL_MESSAGE.to_string()));
        }

        let info = self.extractor.probe(url).await?;
        let id = self.store.create(info.display_name()).await;

        tracing::info!(task_id = %id, %url, title = %info.title, "download accepted");

        worker::spawn_download(worker::DownloadJob {
            store: self.store.clone(),
            extractor: self.extractor.clone(),
            id: id.clone(),
            url: url.to_string(),
            scratch_root: self.config.storage.scratch_root.clone(),
        });

        Ok(id)
    }

    /// Current progress of a task
    ///
    /// # Errors
    ///
    /// Returns `TaskNotFound` if the identifier is unknown.
    pub async fn progress(&self, id: &TaskId) -> Result<ProgressInfo> {
        self.store
            .get(id)
            .await
            .map(|task| task.progress_info())
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))
    }
}
