//! File retrieval and the cleanup that follows it.
//!
//! A successful retrieval claims the task, opens the file, and ties a
//! [`CleanupGuard`] to the response body. When the body is dropped (fully
//! sent or the client went away) the guard removes the file, the scratch
//! directory and the task record. Cleanup failures are logged and swallowed.

use super::VideoFetcher;
use crate::error::Result;
use crate::store::{ClaimedTask, TaskStore};
use crate::types::TaskId;
use futures::Stream;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::fs::File;
use tokio_util::io::ReaderStream;

/// Content type used when the file has no extension
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// A claimed file ready to be streamed to the client
#[derive(Debug)]
pub struct FileDownload {
    /// Name offered to the client
    pub filename: String,
    /// `video/<ext>` derived from the file extension
    pub content_type: String,
    /// File size in bytes
    pub len: u64,
    file: File,
    guard: CleanupGuard,
}

impl FileDownload {
    /// `Content-Disposition` value marking the body as an attachment
    pub fn content_disposition(&self) -> String {
        content_disposition(&self.filename)
    }

    /// Turn the file into a body stream that cleans up once dropped
    pub fn into_stream(self) -> CleanupStream<ReaderStream<File>> {
        CleanupStream {
            inner: ReaderStream::new(self.file),
            _guard: self.guard,
        }
    }
}

impl VideoFetcher {
    /// Hand out a finished task's file
    ///
    /// Succeeds at most once per task. The returned [`FileDownload`] owns the
    /// cleanup; dropping it (or the stream made from it) removes the file,
    /// the scratch directory and the task record.
    ///
    /// # Errors
    ///
    /// - `TaskNotFound` if the task is unknown or already retrieved
    /// - `TaskFailed` with the worker's message if the download failed
    /// - `NotReady` if the worker has not finished
    /// - `Io` if the file cannot be opened (the task is cleaned up)
    pub async fn retrieve(&self, id: &TaskId) -> Result<FileDownload> {
        let claim = self.store.claim(id).await?;
        let guard = CleanupGuard::new(self.store.clone(), claim.clone());

        let file = File::open(&claim.filepath).await?;
        let len = file.metadata().await?.len();

        tracing::info!(task_id = %id, file = ?claim.filepath, len, "serving file");

        Ok(FileDownload {
            content_type: content_type_for(&claim.filepath),
            filename: claim.filename,
            len,
            file,
            guard,
        })
    }
}

/// Headers for a finished task's file, without claiming it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileMetadata {
    /// Name offered to the client
    pub filename: String,
    /// `video/<ext>` derived from the file extension
    pub content_type: String,
    /// File size in bytes
    pub len: u64,
}

impl FileMetadata {
    /// `Content-Disposition` value marking the body as an attachment
    pub fn content_disposition(&self) -> String {
        content_disposition(&self.filename)
    }
}

impl VideoFetcher {
    /// Describe the file [`VideoFetcher::retrieve`] would hand out
    ///
    /// Leaves the task untouched, so a later retrieval still succeeds.
    ///
    /// # Errors
    ///
    /// The same as [`VideoFetcher::retrieve`].
    pub async fn file_metadata(&self, id: &TaskId) -> Result<FileMetadata> {
        let task = self.store.peek(id).await?;
        let len = tokio::fs::metadata(&task.filepath).await?.len();
        Ok(FileMetadata {
            content_type: content_type_for(&task.filepath),
            filename: task.filename,
            len,
        })
    }
}

/// Runs task cleanup exactly once, when dropped
#[derive(Debug)]
pub struct CleanupGuard {
    job: Option<(TaskStore, ClaimedTask)>,
}

impl CleanupGuard {
    pub(crate) fn new(store: TaskStore, claim: ClaimedTask) -> Self {
        Self {
            job: Some((store, claim)),
        }
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        let Some((store, claim)) = self.job.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(cleanup(store, claim));
            }
            Err(_) => {
                tracing::warn!(task_id = %claim.id, "no runtime available, skipping cleanup");
            }
        }
    }
}

/// Remove the file, the scratch directory and the task record
async fn cleanup(store: TaskStore, claim: ClaimedTask) {
    if let Err(e) = tokio::fs::remove_file(&claim.filepath).await {
        tracing::warn!(task_id = %claim.id, file = ?claim.filepath, error = %e, "failed to remove file");
    }
    if let Some(dir) = &claim.scratch_dir
        && let Err(e) = tokio::fs::remove_dir_all(dir).await
    {
        tracing::warn!(task_id = %claim.id, dir = ?dir, error = %e, "failed to remove scratch directory");
    }
    store.delete(&claim.id).await;
    tracing::debug!(task_id = %claim.id, "task cleaned up");
}

/// Byte stream that keeps a [`CleanupGuard`] alive until it is dropped
#[derive(Debug)]
pub struct CleanupStream<S> {
    inner: S,
    _guard: CleanupGuard,
}

impl<S: Stream + Unpin> Stream for CleanupStream<S> {
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().inner).poll_next(cx)
    }
}

fn content_type_for(path: &Path) -> String {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if !ext.is_empty() => format!("video/{}", ext.to_ascii_lowercase()),
        _ => FALLBACK_CONTENT_TYPE.to_string(),
    }
}

/// Attachment disposition with an ASCII fallback and an RFC 5987 UTF-8 name
fn content_disposition(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii,
        urlencoding::encode(filename)
    )
}
