//! In-memory task registry shared by the HTTP layer and the download workers
//!
//! Each task has exactly one writer (its worker) for the progress and
//! outcome fields; handlers only read, except for [`TaskStore::claim`] and
//! [`TaskStore::delete`] on the retrieval path. The map itself sits behind a
//! `tokio::sync::RwLock` so reads from other tasks see every write.

use crate::error::{Error, Result};
use crate::types::{ProgressInfo, TaskId};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Tracked state for one download request
#[derive(Clone, Debug, PartialEq)]
pub struct TaskRecord {
    /// Percentage complete (0-100), never decreasing
    pub progress: f64,
    /// One-way false → true; nothing but deletion happens after it flips
    pub done: bool,
    /// Set at most once; implies `done`
    pub error: Option<String>,
    /// Final artifact, always inside `scratch_dir`
    pub filepath: Option<PathBuf>,
    /// Name the file is served under
    pub filename: String,
    /// Private directory the worker downloads into
    pub scratch_dir: Option<PathBuf>,
    /// When the download request was accepted
    pub created_at: DateTime<Utc>,
    /// A retrieval has claimed the file and will clean up after it
    pub retrieving: bool,
}

impl TaskRecord {
    fn new(filename: String) -> Self {
        Self {
            progress: 0.0,
            done: false,
            error: None,
            filepath: None,
            filename,
            scratch_dir: None,
            created_at: Utc::now(),
            retrieving: false,
        }
    }

    /// Project the record into the poll response
    pub fn progress_info(&self) -> ProgressInfo {
        ProgressInfo {
            progress: self.progress,
            done: self.done,
            error: self.error.clone(),
            filename: self.filename.clone(),
        }
    }
}

/// What a successful claim hands to the retrieval path
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimedTask {
    /// The claimed task
    pub id: TaskId,
    /// File to stream
    pub filepath: PathBuf,
    /// Directory to remove afterwards
    pub scratch_dir: Option<PathBuf>,
    /// Name to serve the file under
    pub filename: String,
}

/// Process-wide task registry (cloneable - the map is Arc-wrapped)
#[derive(Clone, Debug, Default)]
pub struct TaskStore {
    tasks: Arc<RwLock<HashMap<TaskId, TaskRecord>>>,
}

impl TaskStore {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fresh task and return its identifier
    ///
    /// The identifier never collides with a live task.
    pub async fn create(&self, filename: impl Into<String>) -> TaskId {
        let mut tasks = self.tasks.write().await;
        let mut id = TaskId::generate();
        while tasks.contains_key(&id) {
            id = TaskId::generate();
        }
        tasks.insert(id.clone(), TaskRecord::new(filename.into()));
        id
    }

    /// Read-only snapshot of a task
    pub async fn get(&self, id: &TaskId) -> Option<TaskRecord> {
        self.tasks.read().await.get(id).cloned()
    }

    /// Remove a task; no-op if it is already gone
    pub async fn delete(&self, id: &TaskId) {
        self.tasks.write().await.remove(id);
    }

    /// Number of tracked tasks
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    /// Whether no tasks are tracked
    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }

    /// Record the scratch directory the worker owns
    pub async fn set_scratch_dir(&self, id: &TaskId, dir: PathBuf) {
        self.update(id, |task| task.scratch_dir = Some(dir)).await;
    }

    /// Raise the progress percentage; lower values are ignored
    pub async fn record_progress(&self, id: &TaskId, percent: f64) {
        let percent = percent.clamp(0.0, 100.0);
        self.update(id, |task| {
            if percent > task.progress {
                task.progress = percent;
            }
        })
        .await;
    }

    /// Mark the task finished with its final artifact
    ///
    /// A path outside the task's scratch directory fails the task instead.
    pub async fn complete(&self, id: &TaskId, filepath: PathBuf, filename: String) {
        self.update(id, |task| {
            let inside = task
                .scratch_dir
                .as_ref()
                .is_some_and(|dir| filepath.starts_with(dir));
            if inside {
                task.filepath = Some(filepath);
                task.filename = filename;
                task.progress = 100.0;
            } else {
                tracing::error!(
                    task_id = %id,
                    path = ?filepath,
                    "result file is outside the scratch directory"
                );
                task.error = Some("download produced a file outside its scratch directory".into());
            }
            task.done = true;
        })
        .await;
    }

    /// Mark the task failed with a human-readable message
    pub async fn fail(&self, id: &TaskId, message: String) {
        self.update(id, |task| {
            task.error = Some(message);
            task.done = true;
        })
        .await;
    }

    /// Claim a finished task's file for retrieval
    ///
    /// Only one caller ever gets `Ok` for a task; later callers see
    /// `TaskNotFound`, as they would once cleanup has run.
    pub async fn claim(&self, id: &TaskId) -> Result<ClaimedTask> {
        let mut tasks = self.tasks.write().await;
        let task = match tasks.get_mut(id) {
            Some(task) => task,
            None => return Err(Error::TaskNotFound(id.to_string())),
        };
        let claimed = servable(id, task)?;
        task.retrieving = true;
        Ok(claimed)
    }

    /// What [`TaskStore::claim`] would hand out, without claiming it
    pub async fn peek(&self, id: &TaskId) -> Result<ClaimedTask> {
        match self.tasks.read().await.get(id) {
            Some(task) => servable(id, task),
            None => Err(Error::TaskNotFound(id.to_string())),
        }
    }

    /// Apply a mutation unless the task is unknown or already terminal
    async fn update(&self, id: &TaskId, apply: impl FnOnce(&mut TaskRecord)) {
        let mut tasks = self.tasks.write().await;
        match tasks.get_mut(id) {
            Some(task) if !task.done => apply(task),
            Some(_) => {
                tracing::debug!(task_id = %id, "ignoring update to finished task");
            }
            None => {
                tracing::debug!(task_id = %id, "ignoring update to unknown task");
            }
        }
    }
}

/// A task's file, if it can be served right now
fn servable(id: &TaskId, task: &TaskRecord) -> Result<ClaimedTask> {
    if task.retrieving {
        return Err(Error::TaskNotFound(id.to_string()));
    }
    if let Some(message) = &task.error {
        return Err(Error::TaskFailed {
            id: id.to_string(),
            message: message.clone(),
        });
    }
    match (&task.filepath, task.done) {
        (Some(path), true) => Ok(ClaimedTask {
            id: id.clone(),
            filepath: path.clone(),
            scratch_dir: task.scratch_dir.clone(),
            filename: task.filename.clone(),
        }),
        _ => Err(Error::NotReady(id.to_string())),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with_scratch() -> (TaskStore, TaskId, PathBuf) {
        let store = TaskStore::new();
        let id = store.create("clip.mp4").await;
        let scratch = PathBuf::from("/tmp/vidfetch-test").join(id.as_str());
        store.set_scratch_dir(&id, scratch.clone()).await;
        (store, id, scratch)
    }

    #[tokio::test]
    async fn test_create_initial_state() {
        let store = TaskStore::new();
        let id = store.create("clip.mp4").await;

        let task = store.get(&id).await.unwrap();
        assert_eq!(task.progress, 0.0);
        assert!(!task.done);
        assert!(task.error.is_none());
        assert!(task.filepath.is_none());
        assert_eq!(task.filename, "clip.mp4");
        assert!(!task.retrieving);
    }

    #[tokio::test]
    async fn test_get_unknown_returns_none() {
        let store = TaskStore::new();
        assert!(store.get(&TaskId::from("nope")).await.is_none());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = TaskStore::new();
        let id = store.create("a.mp4").await;
        store.delete(&id).await;
        store.delete(&id).await;
        assert!(store.get(&id).await.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_progress_never_decreases() {
        let (store, id, _) = store_with_scratch().await;
        store.record_progress(&id, 40.0).await;
        store.record_progress(&id, 25.0).await;
        assert_eq!(store.get(&id).await.unwrap().progress, 40.0);

        store.record_progress(&id, 180.0).await;
        assert_eq!(store.get(&id).await.unwrap().progress, 100.0);
    }

    #[tokio::test]
    async fn test_complete_sets_terminal_state() {
        let (store, id, scratch) = store_with_scratch().await;
        let file = scratch.join("Real Title.webm");
        store
            .complete(&id, file.clone(), "Real Title.webm".into())
            .await;

        let task = store.get(&id).await.unwrap();
        assert!(task.done);
        assert_eq!(task.progress, 100.0);
        assert_eq!(task.filepath, Some(file));
        assert_eq!(task.filename, "Real Title.webm");
        assert!(task.error.is_none());
    }

    #[tokio::test]
    async fn test_complete_outside_scratch_fails_task() {
        let (store, id, _) = store_with_scratch().await;
        store
            .complete(&id, PathBuf::from("/etc/passwd"), "passwd".into())
            .await;

        let task = store.get(&id).await.unwrap();
        assert!(task.done);
        assert!(task.error.is_some());
        assert!(task.filepath.is_none());
    }

    #[tokio::test]
    async fn test_done_is_terminal() {
        let (store, id, scratch) = store_with_scratch().await;
        store.fail(&id, "first".into()).await;

        store.fail(&id, "second".into()).await;
        store.record_progress(&id, 90.0).await;
        store
            .complete(&id, scratch.join("x.mp4"), "x.mp4".into())
            .await;

        let task = store.get(&id).await.unwrap();
        assert_eq!(task.error.as_deref(), Some("first"));
        assert_eq!(task.progress, 0.0);
        assert!(task.filepath.is_none());
    }

    #[tokio::test]
    async fn test_error_implies_done() {
        let (store, id, _) = store_with_scratch().await;
        store.fail(&id, "boom".into()).await;
        let task = store.get(&id).await.unwrap();
        assert!(task.done);
    }

    #[tokio::test]
    async fn test_claim_states() {
        let store = TaskStore::new();

        let unknown = store.claim(&TaskId::from("missing")).await.unwrap_err();
        assert!(matches!(unknown, Error::TaskNotFound(_)));

        let id = store.create("a.mp4").await;
        let scratch = PathBuf::from("/tmp/s").join(id.as_str());
        store.set_scratch_dir(&id, scratch.clone()).await;

        let pending = store.claim(&id).await.unwrap_err();
        assert!(matches!(pending, Error::NotReady(_)));

        store
            .complete(&id, scratch.join("a.mp4"), "a.mp4".into())
            .await;
        let claimed = store.claim(&id).await.unwrap();
        assert_eq!(claimed.filepath, scratch.join("a.mp4"));
        assert_eq!(claimed.scratch_dir, Some(scratch));
        assert_eq!(claimed.filename, "a.mp4");

        let again = store.claim(&id).await.unwrap_err();
        assert!(matches!(again, Error::TaskNotFound(_)));

        // Still pollable while the file is being streamed
        assert!(store.get(&id).await.unwrap().retrieving);
    }

    #[tokio::test]
    async fn test_claim_failed_task_carries_message() {
        let (store, id, _) = store_with_scratch().await;
        store.fail(&id, "HTTP Error 404".into()).await;

        match store.claim(&id).await.unwrap_err() {
            Error::TaskFailed { message, .. } => assert_eq!(message, "HTTP Error 404"),
            other => panic!("expected TaskFailed, got {other:?}"),
        }
        // Failed tasks stay claimable for the error, never consumed
        assert!(matches!(
            store.claim(&id).await.unwrap_err(),
            Error::TaskFailed { .. }
        ));
    }

    #[tokio::test]
    async fn test_peek_leaves_task_claimable() {
        let (store, id, scratch) = store_with_scratch().await;
        assert!(matches!(
            store.peek(&id).await.unwrap_err(),
            Error::NotReady(_)
        ));

        store
            .complete(&id, scratch.join("clip.mp4"), "clip.mp4".into())
            .await;
        let peeked = store.peek(&id).await.unwrap();
        assert_eq!(store.peek(&id).await.unwrap(), peeked);
        assert!(!store.get(&id).await.unwrap().retrieving);

        assert_eq!(store.claim(&id).await.unwrap(), peeked);
        assert!(matches!(
            store.peek(&id).await.unwrap_err(),
            Error::TaskNotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_tasks_are_independent() {
        let store = TaskStore::new();
        let a = store.create("a.mp4").await;
        let b = store.create("b.mp4").await;
        assert_ne!(a, b);

        store.record_progress(&a, 70.0).await;
        store.record_progress(&b, 10.0).await;

        assert_eq!(store.get(&a).await.unwrap().progress, 70.0);
        assert_eq!(store.get(&b).await.unwrap().progress, 10.0);
        assert_eq!(store.len().await, 2);
    }
}
