//! HTTP handlers for the download front-end.
//!
//! Submission and retrieval failures surface as flash messages and a
//! redirect back to the form; only the progress endpoint speaks JSON.
//! Nothing here ever blocks on the download itself.

use askama::Template;
use axum::body::Body;
use axum::extract::{Form, Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use serde::Deserialize;
use tokio_util::io::ReaderStream;
use tracing::error;
use uuid::Uuid;

use crate::core::models::{DownloadFormat, JobStatus};
use crate::core::worker::JobRequest;
use crate::http::flash;
use crate::utils::is_valid_youtube_url;
use crate::AppState;

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    error: Option<String>,
}

#[derive(Template)]
#[template(path = "download.html")]
struct DownloadTemplate {
    job_id: String,
}

/// Form fields accepted by the submission endpoint.
#[derive(Debug, Deserialize)]
pub struct DownloadForm {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub format: String,
}

/// `GET /` — submission form; renders and clears any flash message.
pub async fn index(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let message = flash::read(&headers, &state.config.secret_key);
    let had_flash = message.is_some();

    let mut response = render_form(StatusCode::OK, message);
    if had_flash {
        append_cookie(&mut response, &flash::clear_cookie());
    }
    response
}

/// `POST /download` — validate, create the job record, enqueue, and
/// redirect to the progress page. Never waits on the work.
pub async fn submit(State(state): State<AppState>, Form(form): Form<DownloadForm>) -> Response {
    let url = form.url.trim().to_string();

    if url.is_empty() {
        return flash_redirect(&state, "Please enter a YouTube URL");
    }
    if !is_valid_youtube_url(&url) {
        return flash_redirect(&state, "Please enter a valid YouTube URL");
    }

    let format = DownloadFormat::parse(&form.format);
    let job_id = Uuid::new_v4().to_string();

    if let Err(e) = state.store.create(&job_id, &url) {
        error!(job_id = %job_id, "failed to create job record: {e}");
        return internal_error();
    }

    let request = JobRequest {
        job_id: job_id.clone(),
        url,
        format,
    };
    if let Err(e) = state.queue.submit(request) {
        error!(job_id = %job_id, "failed to enqueue job: {e}");
        return flash_redirect(&state, "Server is busy, please try again later");
    }

    Redirect::to(&format!("/download/{job_id}")).into_response()
}

/// `GET /download/{job_id}` — progress page polled by the browser.
pub async fn progress_page(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Response {
    match state.store.get(&job_id) {
        Ok(Some(_)) => {
            let tpl = DownloadTemplate { job_id };
            render_template(StatusCode::OK, tpl.render())
        }
        Ok(None) => flash_redirect(&state, "Download not found"),
        Err(e) => {
            error!(job_id = %job_id, "job lookup failed: {e}");
            internal_error()
        }
    }
}

/// `GET /progress/{job_id}` — current job record as JSON.
pub async fn progress(State(state): State<AppState>, Path(job_id): Path<String>) -> Response {
    match state.store.get(&job_id) {
        Ok(Some(job)) => Json(job).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "status": "not_found",
                "error": "Download not found",
            })),
        )
            .into_response(),
        Err(e) => {
            error!(job_id = %job_id, "job lookup failed: {e}");
            internal_error()
        }
    }
}

/// `GET /download_file/{job_id}` — stream the completed file as an
/// attachment. Preconditions checked in order: job exists, completed,
/// filename set, file still on disk; any miss is a flash redirect.
pub async fn download_file(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Response {
    let job = match state.store.get(&job_id) {
        Ok(Some(job)) => job,
        Ok(None) => return flash_redirect(&state, "File not ready for download"),
        Err(e) => {
            error!(job_id = %job_id, "job lookup failed: {e}");
            return internal_error();
        }
    };

    if job.status != JobStatus::Completed {
        return flash_redirect(&state, "File not ready for download");
    }
    let Some(filename) = job.filename.filter(|f| !f.is_empty()) else {
        return flash_redirect(&state, "File not ready for download");
    };

    let path = state.config.download_dir.join(&filename);
    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(_) => return flash_redirect(&state, "File not found on server"),
    };

    let body = Body::from_stream(ReaderStream::new(file));
    let disposition = format!("attachment; filename=\"{filename}\"");
    (
        [
            (CONTENT_TYPE, "application/octet-stream".to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}

/// Fallback for unknown routes: the submission page with a 404 status.
pub async fn not_found() -> Response {
    render_form(StatusCode::NOT_FOUND, None)
}

fn render_form(status: StatusCode, error: Option<String>) -> Response {
    let tpl = IndexTemplate { error };
    render_template(status, tpl.render())
}

fn render_template(status: StatusCode, rendered: Result<String, askama::Error>) -> Response {
    match rendered {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            error!("template rendering failed: {e}");
            internal_error()
        }
    }
}

/// Generic fallback page with a 500 status; details stay in the log.
fn internal_error() -> Response {
    let tpl = IndexTemplate { error: None };
    match tpl.render() {
        Ok(html) => (StatusCode::INTERNAL_SERVER_ERROR, Html(html)).into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response(),
    }
}

fn flash_redirect(state: &AppState, message: &str) -> Response {
    let mut response = Redirect::to("/").into_response();
    append_cookie(
        &mut response,
        &flash::set_cookie(&state.config.secret_key, message),
    );
    response
}

fn append_cookie(response: &mut Response, cookie: &str) {
    if let Ok(value) = HeaderValue::from_str(cookie) {
        response.headers_mut().append(SET_COOKIE, value);
    }
}
