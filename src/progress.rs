//! Progress sink: turns byte counts from the extractor into a stored percentage

use crate::store::TaskStore;
use crate::types::TaskId;

/// Convert a byte count into a percentage
///
/// Returns `None` when the total is unknown or zero, in which case nothing is
/// reported until the worker forces 100 on completion.
pub fn percent(downloaded: u64, total: Option<u64>) -> Option<f64> {
    match total {
        Some(total) if total > 0 => {
            Some((downloaded as f64 / total as f64 * 100.0).min(100.0))
        }
        _ => None,
    }
}

/// Receives progress updates for one task and records them in the registry
#[derive(Clone)]
pub struct ProgressSink {
    store: TaskStore,
    id: TaskId,
}

impl ProgressSink {
    /// Bind a sink to a task
    pub fn new(store: TaskStore, id: TaskId) -> Self {
        Self { store, id }
    }

    /// The task this sink reports for
    pub fn task_id(&self) -> &TaskId {
        &self.id
    }

    /// Report bytes downloaded so far and the expected total, if known
    pub async fn report(&self, downloaded: u64, total: Option<u64>) {
        if let Some(pct) = percent(downloaded, total) {
            self.store.record_progress(&self.id, pct).await;
        }
    }
}
