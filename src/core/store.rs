//! Job record store backed by SQLite
//!
//! One row per job, keyed by the identifier handed back to the client.
//! All access goes through a single connection guarded by a mutex; the
//! expected load is one submission endpoint plus a handful of worker
//! slots, so a global lock is sufficient serialization.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use super::models::{AppResult, Job, JobStatus, ProgressEvent};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS jobs (
        id TEXT PRIMARY KEY,
        url TEXT NOT NULL,
        status TEXT NOT NULL,
        progress INTEGER NOT NULL,
        message TEXT NOT NULL,
        filename TEXT,
        error TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
";

/// Partial update applied to a job row. Only the populated fields are
/// written; everything else keeps its current value.
#[derive(Debug, Clone, Default)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub progress: Option<u8>,
    pub message: Option<String>,
    pub filename: Option<String>,
    pub error: Option<String>,
}

impl From<ProgressEvent> for JobUpdate {
    fn from(event: ProgressEvent) -> Self {
        Self {
            status: Some(event.status),
            progress: Some(event.progress),
            message: Some(event.message),
            ..Self::default()
        }
    }
}

/// Handle to the job record store. Cheap to clone; all clones share the
/// same connection and lock.
#[derive(Clone)]
pub struct JobStore {
    conn: Arc<Mutex<Connection>>,
}

impl JobStore {
    /// Open (or create) the store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    /// In-memory store, used by tests.
    pub fn open_in_memory() -> AppResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> AppResult<Self> {
        conn.execute(SCHEMA, [])?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Insert a fresh job row with status=starting and zero progress.
    /// A duplicate identifier is a no-op, never an error.
    pub fn create(&self, id: &str, url: &str) -> AppResult<()> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR IGNORE INTO jobs (id, url, status, progress, message, created_at, updated_at)
             VALUES (?1, ?2, ?3, 0, ?4, ?5, ?5)",
            params![
                id,
                url,
                JobStatus::Starting.as_str(),
                "Initializing download...",
                now
            ],
        )?;
        Ok(())
    }

    /// Overwrite exactly the fields carried by `update` on the row
    /// matching `id`.
    ///
    /// Returns `false` without touching anything when the id is unknown
    /// (a silent no-op, mirroring an UPDATE affecting zero rows) or when
    /// the row is already in a terminal state. Terminal rows are frozen
    /// so a retried worker cannot double-trigger completion.
    pub fn update(&self, id: &str, update: JobUpdate) -> AppResult<bool> {
        let conn = self.conn.lock();

        let current: Option<String> = conn
            .query_row("SELECT status FROM jobs WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
            .optional()?;

        let Some(current) = current else {
            warn!(job_id = %id, "update for unknown job id ignored");
            return Ok(false);
        };

        if JobStatus::parse(&current).is_some_and(JobStatus::is_terminal) {
            debug!(job_id = %id, status = %current, "update for terminal job ignored");
            return Ok(false);
        }

        let mut columns: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(status) = update.status {
            columns.push("status");
            values.push(Box::new(status.as_str().to_string()));
        }
        if let Some(progress) = update.progress {
            columns.push("progress");
            values.push(Box::new(i64::from(progress)));
        }
        if let Some(message) = update.message {
            columns.push("message");
            values.push(Box::new(message));
        }
        if let Some(filename) = update.filename {
            columns.push("filename");
            values.push(Box::new(filename));
        }
        if let Some(error) = update.error {
            columns.push("error");
            values.push(Box::new(error));
        }

        if columns.is_empty() {
            return Ok(false);
        }

        columns.push("updated_at");
        values.push(Box::new(Utc::now().to_rfc3339()));

        let assignments: Vec<String> = columns
            .iter()
            .enumerate()
            .map(|(i, col)| format!("{col} = ?{}", i + 1))
            .collect();
        let sql = format!(
            "UPDATE jobs SET {} WHERE id = ?{}",
            assignments.join(", "),
            columns.len() + 1
        );
        values.push(Box::new(id.to_string()));

        let changed = conn.execute(
            &sql,
            rusqlite::params_from_iter(values.iter().map(|v| v.as_ref())),
        )?;
        Ok(changed > 0)
    }

    /// Fetch the full current row, or `None` for an unknown id.
    pub fn get(&self, id: &str) -> AppResult<Option<Job>> {
        let conn = self.conn.lock();
        let job = conn
            .query_row("SELECT id, url, status, progress, message, filename, error, created_at, updated_at FROM jobs WHERE id = ?1",
                params![id],
                job_from_row,
            )
            .optional()?;
        Ok(job)
    }
}

fn job_from_row(row: &Row<'_>) -> rusqlite::Result<Job> {
    let status: String = row.get(2)?;
    let progress: i64 = row.get(3)?;
    let created_at: String = row.get(7)?;
    let updated_at: String = row.get(8)?;

    Ok(Job {
        id: row.get(0)?,
        url: row.get(1)?,
        // An unparsable status can only come from out-of-band edits;
        // surface it as error rather than panicking.
        status: JobStatus::parse(&status).unwrap_or(JobStatus::Error),
        progress: progress.clamp(0, 100) as u8,
        message: row.get(4)?,
        filename: row.get(5)?,
        error: row.get(6)?,
        created_at: parse_timestamp(&created_at),
        updated_at: parse_timestamp(&updated_at),
    })
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> JobStore {
        JobStore::open_in_memory().unwrap()
    }

    #[test]
    fn test_create_and_get() {
        let store = store();
        store.create("job-1", "https://www.youtube.com/watch?v=abc").unwrap();

        let job = store.get("job-1").unwrap().unwrap();
        assert_eq!(job.id, "job-1");
        assert_eq!(job.url, "https://www.youtube.com/watch?v=abc");
        assert_eq!(job.status, JobStatus::Starting);
        assert_eq!(job.progress, 0);
        assert_eq!(job.message, "Initializing download...");
        assert!(job.filename.is_none());
        assert!(job.error.is_none());
    }

    #[test]
    fn test_create_is_idempotent() {
        let store = store();
        store.create("job-1", "https://youtu.be/abc").unwrap();
        store
            .update(
                "job-1",
                JobUpdate {
                    progress: Some(40),
                    ..JobUpdate::default()
                },
            )
            .unwrap();

        // Second create must not reset the row.
        store.create("job-1", "https://youtu.be/other").unwrap();
        let job = store.get("job-1").unwrap().unwrap();
        assert_eq!(job.url, "https://youtu.be/abc");
        assert_eq!(job.progress, 40);
    }

    #[test]
    fn test_get_unknown_is_none() {
        assert!(store().get("missing").unwrap().is_none());
    }

    #[test]
    fn test_update_unknown_is_noop() {
        let store = store();
        let updated = store
            .update(
                "missing",
                JobUpdate {
                    progress: Some(10),
                    ..JobUpdate::default()
                },
            )
            .unwrap();
        assert!(!updated);
    }

    #[test]
    fn test_partial_update_touches_only_named_fields() {
        let store = store();
        store.create("job-1", "https://youtu.be/abc").unwrap();
        store
            .update(
                "job-1",
                JobUpdate {
                    status: Some(JobStatus::Downloading),
                    progress: Some(35),
                    message: Some("Downloading video... 35.0%".to_string()),
                    ..JobUpdate::default()
                },
            )
            .unwrap();

        let job = store.get("job-1").unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Downloading);
        assert_eq!(job.progress, 35);
        assert_eq!(job.message, "Downloading video... 35.0%");
        assert!(job.filename.is_none());
        assert_eq!(job.url, "https://youtu.be/abc");
    }

    #[test]
    fn test_terminal_rows_are_frozen() {
        let store = store();
        store.create("job-1", "https://youtu.be/abc").unwrap();
        assert!(store
            .update(
                "job-1",
                JobUpdate {
                    status: Some(JobStatus::Completed),
                    progress: Some(100),
                    filename: Some("video.mp4".to_string()),
                    ..JobUpdate::default()
                },
            )
            .unwrap());

        // A late progress write must not regress the terminal state.
        let updated = store
            .update(
                "job-1",
                JobUpdate {
                    status: Some(JobStatus::Downloading),
                    progress: Some(50),
                    ..JobUpdate::default()
                },
            )
            .unwrap();
        assert!(!updated);

        let job = store.get("job-1").unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress, 100);
        assert_eq!(job.filename.as_deref(), Some("video.mp4"));
    }

    #[test]
    fn test_error_rows_are_frozen_too() {
        let store = store();
        store.create("job-1", "https://youtu.be/abc").unwrap();
        store
            .update(
                "job-1",
                JobUpdate {
                    status: Some(JobStatus::Error),
                    error: Some("network unreachable".to_string()),
                    message: Some("Download failed: network unreachable".to_string()),
                    ..JobUpdate::default()
                },
            )
            .unwrap();

        assert!(!store
            .update(
                "job-1",
                JobUpdate {
                    status: Some(JobStatus::Completed),
                    filename: Some("video.mp4".to_string()),
                    ..JobUpdate::default()
                },
            )
            .unwrap());

        let job = store.get("job-1").unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Error);
        assert_eq!(job.error.as_deref(), Some("network unreachable"));
        assert!(job.filename.is_none());
    }

    #[test]
    fn test_progress_event_update() {
        let store = store();
        store.create("job-1", "https://youtu.be/abc").unwrap();

        let event = ProgressEvent {
            status: JobStatus::Converting,
            progress: 95,
            message: "Converting to MP3...".to_string(),
        };
        store.update("job-1", event.into()).unwrap();

        let job = store.get("job-1").unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Converting);
        assert_eq!(job.progress, 95);
    }
}
