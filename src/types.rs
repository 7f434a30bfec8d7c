//! Core types for vidfetch

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Unique identifier for a download task
///
/// An opaque token; clients must not read anything into its shape.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Borrow the token as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Metadata resolved by probing a URL
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Video title
    pub title: String,
    /// Container extension the extractor will produce (e.g. "mp4")
    pub ext: String,
}

impl MediaInfo {
    /// Display name offered to the client before the real file is known
    pub fn display_name(&self) -> String {
        format!("{}.{}", self.title, self.ext)
    }
}

/// Response body for GET /progress/{task_id}
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProgressInfo {
    /// Percentage complete (0-100), never decreasing
    pub progress: f64,
    /// Whether the task reached a terminal state
    pub done: bool,
    /// Error message if the task failed
    pub error: Option<String>,
    /// Name the file will be served under
    pub filename: String,
}

/// Response body for POST /download
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TaskAccepted {
    /// Identifier to poll and retrieve with
    pub task_id: TaskId,
}
