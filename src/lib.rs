//! vidfetch - Core Library
//!
//! Web front-end for downloading videos through an external extractor
//! with optional audio conversion. Submission creates a job record and
//! enqueues the work; a pool of background workers streams progress
//! back into the record, which the browser polls.

pub mod core;
pub mod http;
pub mod utils;

// Re-export commonly used types
pub use core::{
    config::AppConfig,
    downloader::VideoDownloader,
    models::{AppError, AppResult, DownloadFormat, Job, JobStatus},
    store::JobStore,
    worker::{spawn_workers, JobQueue},
};

use std::sync::Arc;

/// Application state shared by handlers and workers: the job record
/// store, the job queue, and the configuration, all explicitly
/// constructed at startup and injected.
#[derive(Clone)]
pub struct AppState {
    pub store: JobStore,
    pub queue: JobQueue,
    pub config: Arc<AppConfig>,
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
