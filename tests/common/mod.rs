//! Common test utilities for vidfetch integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use vidfetch::{Config, MediaExtractor, MediaInfo, ProgressInfo, ProgressSink, TaskId, VideoFetcher};

/// Extractor that "downloads" by writing a file of the requested size
pub struct FakeExtractor {
    pub title: String,
    pub ext: String,
    pub size: usize,
    pub fail_with: Option<String>,
}

impl Default for FakeExtractor {
    fn default() -> Self {
        Self {
            title: "Sample".to_string(),
            ext: "mp4".to_string(),
            size: 10_000,
            fail_with: None,
        }
    }
}

#[async_trait]
impl MediaExtractor for FakeExtractor {
    async fn probe(&self, url: &str) -> vidfetch::Result<MediaInfo> {
        if url.contains("unsupported") {
            return Err(vidfetch::Error::Extraction(format!(
                "An error occurred during download: ERROR: Unsupported URL: {url}"
            )));
        }
        Ok(MediaInfo {
            title: self.title.clone(),
            ext: self.ext.clone(),
        })
    }

    async fn fetch(
        &self,
        _url: &str,
        dest_dir: &Path,
        progress: &ProgressSink,
    ) -> vidfetch::Result<()> {
        let total = self.size as u64;
        for step in 1..=4u64 {
            progress.report(total * step / 4, Some(total)).await;
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        if let Some(message) = &self.fail_with {
            return Err(vidfetch::Error::Extraction(message.clone()));
        }
        let path = dest_dir.join(format!("{}.{}", self.title, self.ext));
        tokio::fs::write(path, vec![1u8; self.size]).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Fetcher with its scratch root inside a fresh tempdir (keep the TempDir alive)
pub async fn fetcher_with(extractor: impl MediaExtractor + 'static) -> (Arc<VideoFetcher>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.storage.scratch_root = dir.path().join("scratch");

    let fetcher = VideoFetcher::with_extractor(config, Arc::new(extractor))
        .await
        .unwrap();
    (Arc::new(fetcher), dir)
}

/// Poll until done, returning every observation
pub async fn wait_until_done(fetcher: &VideoFetcher, id: &TaskId) -> Vec<ProgressInfo> {
    let mut seen = Vec::new();
    for _ in 0..1000 {
        let info = fetcher.progress(id).await.unwrap();
        let done = info.done;
        seen.push(info);
        if done {
            return seen;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("task {id} never finished");
}

/// Poll until the task disappears from the registry
pub async fn wait_until_gone(fetcher: &VideoFetcher, id: &TaskId) {
    for _ in 0..1000 {
        if fetcher.store().get(id).await.is_none() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("task {id} was never cleaned up");
}

/// Number of entries directly under `dir`
pub fn entries_in(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}
