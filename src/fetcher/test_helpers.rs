//! Shared test helpers for creating VideoFetcher instances in tests.

use crate::config::Config;
use crate::extractor::MediaExtractor;
use crate::fetcher::VideoFetcher;
use crate::progress::ProgressSink;
use crate::types::{MediaInfo, ProgressInfo, TaskId};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::tempdir;
use tokio::sync::Notify;

/// Extractor double that writes files and reports progress as scripted
pub(crate) struct ScriptedExtractor {
    /// Returned by probe
    pub info: MediaInfo,
    /// Makes probe fail with this extraction message
    pub probe_error: Option<String>,
    /// Progress reports sent before the files are written
    pub progress: Vec<(u64, Option<u64>)>,
    /// Files (name, size) written into the destination
    pub files: Vec<(String, usize)>,
    /// Makes fetch fail with this extraction message after reporting progress
    pub fetch_error: Option<String>,
    /// Panic inside fetch
    pub panic_in_fetch: bool,
    /// When set, fetch waits for a notification before finishing
    pub gate: Option<Arc<Notify>>,
    /// Number of fetch calls
    pub fetch_calls: AtomicUsize,
}

impl Default for ScriptedExtractor {
    fn default() -> Self {
        Self {
            info: MediaInfo {
                title: "Test Clip".into(),
                ext: "mp4".into(),
            },
            probe_error: None,
            progress: vec![(25, Some(100)), (50, Some(100)), (100, Some(100))],
            files: vec![("Test Clip.mp4".into(), 2048)],
            fetch_error: None,
            panic_in_fetch: false,
            gate: None,
            fetch_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl MediaExtractor for ScriptedExtractor {
    async fn probe(&self, _url: &str) -> crate::Result<MediaInfo> {
        match &self.probe_error {
            Some(message) => Err(crate::Error::Extraction(message.clone())),
            None => Ok(self.info.clone()),
        }
    }

    async fn fetch(
        &self,
        _url: &str,
        dest_dir: &Path,
        progress: &ProgressSink,
    ) -> crate::Result<()> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        for (downloaded, total) in &self.progress {
            progress.report(*downloaded, *total).await;
        }

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        if self.panic_in_fetch {
            panic!("extractor exploded");
        }

        if let Some(message) = &self.fetch_error {
            return Err(crate::Error::Extraction(message.clone()));
        }

        for (name, size) in &self.files {
            tokio::fs::write(dest_dir.join(name), vec![7u8; *size]).await?;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Helper to create a test VideoFetcher with its scratch root in a tempdir.
/// Returns the fetcher and the tempdir (which must be kept alive).
pub(crate) async fn create_test_fetcher(
    extractor: ScriptedExtractor,
) -> (VideoFetcher, Arc<ScriptedExtractor>, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();

    let mut config = Config::default();
    config.storage.scratch_root = temp_dir.path().join("scratch");

    let extractor = Arc::new(extractor);
    let fetcher = VideoFetcher::with_extractor(config, extractor.clone())
        .await
        .unwrap();

    (fetcher, extractor, temp_dir)
}

/// Poll until the task is done, collecting every progress value observed
pub(crate) async fn wait_for_done(fetcher: &VideoFetcher, id: &TaskId) -> Vec<ProgressInfo> {
    let mut seen = Vec::new();
    for _ in 0..500 {
        let info = fetcher.progress(id).await.unwrap();
        let done = info.done;
        seen.push(info);
        if done {
            return seen;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("task {id} did not finish in time");
}

/// Poll until the task record is gone
pub(crate) async fn wait_for_removal(fetcher: &VideoFetcher, id: &TaskId) {
    for _ in 0..500 {
        if fetcher.store().get(id).await.is_none() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("task {id} was not cleaned up in time");
}
