//! Download handlers: submit, poll, collect.

use super::DownloadForm;
use crate::api::AppState;
use crate::types::{TaskAccepted, TaskId};
use axum::{
    Form, Json,
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

/// POST /download - Accept a video URL
///
/// Probes the URL, registers a task, and starts the download in the
/// background. A missing or unreadable form is treated as a missing URL.
#[utoipa::path(
    post,
    path = "/download",
    tag = "downloads",
    request_body(content = DownloadForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 202, description = "Download accepted", body = TaskAccepted),
        (status = 400, description = "No URL provided", body = crate::error::ApiError),
        (status = 500, description = "The URL could not be probed", body = crate::error::ApiError),
        (status = 501, description = "No extractor available", body = crate::error::ApiError)
    ),
    security(("api_key" = []))
)]
pub async fn start_download(
    State(state): State<AppState>,
    form: Option<Form<DownloadForm>>,
) -> Response {
    let url = form.and_then(|Form(form)| form.url).unwrap_or_default();

    match state.fetcher.submit(&url).await {
        Ok(task_id) => (StatusCode::ACCEPTED, Json(TaskAccepted { task_id })).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "download request rejected");
            e.into_response()
        }
    }
}

/// GET /progress/:task_id - Poll a task
#[utoipa::path(
    get,
    path = "/progress/{task_id}",
    tag = "downloads",
    params(
        ("task_id" = String, Path, description = "Task identifier returned by POST /download")
    ),
    responses(
        (status = 200, description = "Current progress", body = crate::types::ProgressInfo),
        (status = 404, description = "Unknown task", body = crate::error::ApiError)
    ),
    security(("api_key" = []))
)]
pub async fn get_progress(State(state): State<AppState>, Path(task_id): Path<String>) -> Response {
    match state.fetcher.progress(&TaskId::from(task_id)).await {
        Ok(progress) => (StatusCode::OK, Json(progress)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /file/:task_id - Collect the finished file
///
/// Succeeds once per task. The file, its scratch directory and the task are
/// removed after the body has been sent (or the client disconnects). HEAD
/// answers with the same status and headers without consuming the task.
#[utoipa::path(
    get,
    path = "/file/{task_id}",
    tag = "downloads",
    params(
        ("task_id" = String, Path, description = "Task identifier returned by POST /download")
    ),
    responses(
        (status = 200, description = "The video file as an attachment", content_type = "application/octet-stream"),
        (status = 404, description = "Unknown task, already collected, or not finished yet", body = crate::error::ApiError),
        (status = 500, description = "The download failed", body = crate::error::ApiError)
    ),
    security(("api_key" = []))
)]
pub async fn get_file(State(state): State<AppState>, Path(task_id): Path<String>) -> Response {
    let task_id = TaskId::from(task_id);
    let download = match state.fetcher.retrieve(&task_id).await {
        Ok(download) => download,
        Err(e) => {
            tracing::debug!(task_id = %task_id, error = %e, "file not served");
            return e.into_response();
        }
    };

    let headers = file_headers(
        download.content_type.clone(),
        download.content_disposition(),
        download.len,
    );

    (
        StatusCode::OK,
        headers,
        Body::from_stream(download.into_stream()),
    )
        .into_response()
}

/// HEAD /file/:task_id - Describe the finished file without collecting it
pub async fn head_file(State(state): State<AppState>, Path(task_id): Path<String>) -> Response {
    let task_id = TaskId::from(task_id);
    match state.fetcher.file_metadata(&task_id).await {
        Ok(meta) => (
            StatusCode::OK,
            file_headers(meta.content_type.clone(), meta.content_disposition(), meta.len),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

fn file_headers(
    content_type: String,
    disposition: String,
    len: u64,
) -> [(header::HeaderName, String); 3] {
    [
        (header::CONTENT_TYPE, content_type),
        (header::CONTENT_DISPOSITION, disposition),
        (header::CONTENT_LENGTH, len.to_string()),
    ]
}
