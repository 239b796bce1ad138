//! HTTP surface: router, handlers, and flash-message cookies.

pub mod flash;
pub mod handlers;


use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/download", post(handlers::submit))
        .route("/download/{job_id}", get(handlers::progress_page))
        .route("/progress/{job_id}", get(handlers::progress))
        .route("/download_file/{job_id}", get(handlers::download_file))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
