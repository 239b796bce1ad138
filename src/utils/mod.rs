//! Utility modules and helper functions

pub mod files;
pub mod logging;
pub mod validation;

pub use files::{ensure_dir_exists, find_downloaded_file, sanitize_filename};
pub use logging::init_tracing;
pub use validation::is_valid_youtube_url;
