//! Error types for vidfetch
//!
//! This module provides error handling for the library, including:
//! - One crate-wide error enum covering input, extraction, and task-state failures
//! - HTTP status code mapping for API integration
//! - A flat JSON error body with a machine-readable code

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for vidfetch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for vidfetch
///
/// Worker-side failures never surface through this type directly; they are
/// stored on the task and reported back through [`Error::TaskFailed`] when the
/// client asks for the file.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "storage.scratch_root")
        key: Option<String>,
    },

    /// The request was missing or malformed (e.g. no URL)
    #[error("{0}")]
    InvalidInput(String),

    /// The extraction library rejected the URL or failed mid-download
    #[error("{0}")]
    Extraction(String),

    /// No task with this identifier is known
    #[error("task {0} not found")]
    TaskNotFound(String),

    /// The task exists but has no file to hand out yet
    #[error("file for task {0} is not ready yet")]
    NotReady(String),

    /// The task finished with an error; carries the stored message
    #[error("{message}")]
    TaskFailed {
        /// The task that failed
        id: String,
        /// The message recorded by the worker
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// External tool could not be executed (yt-dlp missing permissions, etc.)
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// Operation not supported (missing binary)
    #[error("not supported: {0}")]
    NotSupported(String),

    /// Anything else, including panics caught at the worker boundary
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// API error response format
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": "Please provide a video URL.",
///   "code": "invalid_input"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Human-readable error message, suitable for display to end users
    pub error: String,

    /// Machine-readable error code (e.g., "task_not_found", "invalid_input")
    pub code: String,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: code.into(),
        }
    }

    /// Create an "unauthorized" error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("unauthorized", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,
            Error::InvalidInput(_) => 400,

            // 404 Not Found - unknown task, or nothing to hand out yet
            Error::TaskNotFound(_) => 404,
            Error::NotReady(_) => 404,

            // 500 Internal Server Error
            Error::Extraction(_) => 500,
            Error::TaskFailed { .. } => 500,
            Error::Io(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Unexpected(_) => 500,

            // 501 Not Implemented - no extractor binary available
            Error::NotSupported(_) => 501,

            // 503 Service Unavailable
            Error::ExternalTool(_) => 503,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::InvalidInput(_) => "invalid_input",
            Error::Extraction(_) => "extraction_failed",
            Error::TaskNotFound(_) => "task_not_found",
            Error::NotReady(_) => "not_ready",
            Error::TaskFailed { .. } => "task_failed",
            Error::Io(_) => "io_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::ExternalTool(_) => "external_tool_error",
            Error::NotSupported(_) => "not_supported",
            Error::Unexpected(_) => "unexpected_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        ApiError {
            code: error.error_code().to_string(),
            error: error.to_string(),
        }
    }
}
