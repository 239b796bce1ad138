//! Core business logic module
//!
//! This module contains the domain models, the job record store, the
//! extraction/conversion capabilities, and the background worker pool.

pub mod config;
pub mod convert;
pub mod downloader;
pub mod extractor;
pub mod models;
pub mod store;
pub mod worker;


// Re-export commonly used types
pub use config::AppConfig;
pub use store::JobStore;
