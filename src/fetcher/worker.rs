//! Download worker: one spawned task per accepted request.
//!
//! The worker is the only writer of its task's outcome. Whatever happens in
//! between, it leaves the task `done`, either with a file or with an error.

use crate::error::{Error, Result};
use crate::extractor::MediaExtractor;
use crate::progress::ProgressSink;
use crate::store::TaskStore;
use crate::types::TaskId;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Everything a worker needs, moved into the spawned task
pub(crate) struct DownloadJob {
    pub store: TaskStore,
    pub extractor: Arc<dyn MediaExtractor>,
    pub id: TaskId,
    pub url: String,
    pub scratch_root: PathBuf,
}

/// Spawn the worker for one task on the tokio runtime
pub(crate) fn spawn_download(job: DownloadJob) -> tokio::task::JoinHandle<()> {
    tokio::spawn(run_download(job))
}

/// Run one download to a terminal state
pub(crate) async fn run_download(job: DownloadJob) {
    let DownloadJob {
        store,
        extractor,
        id,
        url,
        scratch_root,
    } = job;

    let outcome = AssertUnwindSafe(download(
        &store,
        extractor.as_ref(),
        &id,
        &url,
        &scratch_root,
    ))
    .catch_unwind()
    .await;

    match outcome {
        Ok(Ok((filepath, filename))) => {
            tracing::info!(task_id = %id, file = ?filepath, "download complete");
            store.complete(&id, filepath, filename).await;
        }
        Ok(Err(e)) => {
            let message = failure_message(e);
            tracing::warn!(task_id = %id, error = %message, "download failed");
            remove_scratch(&store, &id).await;
            store.fail(&id, message).await;
        }
        Err(panic) => {
            let message = Error::Unexpected(panic_message(panic.as_ref())).to_string();
            tracing::error!(task_id = %id, error = %message, "download worker panicked");
            remove_scratch(&store, &id).await;
            store.fail(&id, message).await;
        }
    }
}

async fn download(
    store: &TaskStore,
    extractor: &dyn MediaExtractor,
    id: &TaskId,
    url: &str,
    scratch_root: &Path,
) -> Result<(PathBuf, String)> {
    tokio::fs::create_dir_all(scratch_root).await?;
    let scratch = scratch_root.join(id.as_str());
    tokio::fs::create_dir(&scratch).await?;
    store.set_scratch_dir(id, scratch.clone()).await;

    tracing::debug!(task_id = %id, scratch = ?scratch, "fetching");

    let sink = ProgressSink::new(store.clone(), id.clone());
    extractor.fetch(url, &scratch, &sink).await?;

    let filepath = select_primary_file(&scratch)
        .await?
        .ok_or_else(|| Error::Extraction("download produced no file".to_string()))?;
    let filename = filepath
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| Error::Unexpected(format!("no file name in {}", filepath.display())))?;

    Ok((filepath, filename))
}

/// Pick the artifact out of a scratch directory
///
/// The extractor may leave sidecar files next to the media; the largest
/// regular file wins. Equal sizes keep the first one read, which depends on
/// directory order.
pub async fn select_primary_file(dir: &Path) -> Result<Option<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut best: Option<(u64, PathBuf)> = None;

    while let Some(entry) = entries.next_entry().await? {
        let metadata = match entry.metadata().await {
            Ok(m) if m.is_file() => m,
            _ => continue,
        };
        if best.as_ref().is_none_or(|(size, _)| metadata.len() > *size) {
            best = Some((metadata.len(), entry.path()));
        }
    }

    Ok(best.map(|(_, path)| path))
}

/// Message stored on the task: extraction errors verbatim, the rest prefixed
fn failure_message(error: Error) -> String {
    match error {
        Error::Extraction(message) => message,
        Error::Unexpected(_) => error.to_string(),
        other => Error::Unexpected(other.to_string()).to_string(),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}

/// Best-effort removal of a failed task's partial files
async fn remove_scratch(store: &TaskStore, id: &TaskId) {
    let Some(dir) = store.get(id).await.and_then(|task| task.scratch_dir) else {
        return;
    };
    if let Err(e) = tokio::fs::remove_dir_all(&dir).await {
        tracing::warn!(task_id = %id, dir = ?dir, error = %e, "failed to remove scratch directory");
    }
}
