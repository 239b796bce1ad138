//! Core data models for the download service

use serde::{Deserialize, Serialize};

/// Job lifecycle status.
///
/// `downloading` -> `converting` -> `completed` is the happy path;
/// `error` is reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Starting,

    Downloading,

    Converting,

    Completed,

    Error,
}

impl JobStatus {
    /// Stable string code used in the store and the JSON surface.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Downloading => "downloading",
            Self::Converting => "converting",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "starting" => Some(Self::Starting),
            "downloading" => Some(Self::Downloading),
            "converting" => Some(Self::Converting),
            "completed" => Some(Self::Completed),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Terminal jobs are never mutated again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested output format.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DownloadFormat {
    #[default]
    Mp4,

    Mp3,
}

impl DownloadFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "mp3" => Self::Mp3,
            _ => Self::Mp4,
        }
    }
}

/// One user-initiated download/conversion request, tracked end-to-end
/// by its identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,

    pub url: String,

    pub status: JobStatus,

    pub progress: u8,

    pub message: String,

    pub filename: Option<String>,

    pub error: Option<String>,

    pub created_at: chrono::DateTime<chrono::Utc>,

    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Progress event emitted by the extraction/conversion pipeline and
/// written straight into the job record store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub status: JobStatus,

    pub progress: u8,

    pub message: String,
}

/// Application error types

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Download failed: {0}")]
    Extraction(String),

    #[error("Conversion failed: {0}")]
    Conversion(String),

    #[error("Queue error: {0}")]
    Queue(String),
}

/// Result type alias for application operations

pub type AppResult<T> = Result<T, AppError>;
