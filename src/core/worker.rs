//! Background worker pool.
//!
//! Submissions go over a bounded mpsc channel; a fixed number of worker
//! tasks share the receiving end, so each job is delivered to exactly
//! one worker slot. Terminal-state checks in the store make redelivery
//! harmless: a job that already completed or failed is skipped.

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info};

use super::downloader::VideoDownloader;
use super::extractor::ProgressSink;
use super::models::{AppError, AppResult, DownloadFormat, JobStatus};
use super::store::{JobStore, JobUpdate};

/// Unit of work captured at submission time.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub job_id: String,
    pub url: String,
    pub format: DownloadFormat,
}

/// Sending half of the job channel, owned by the application state and
/// injected into the submission handler.
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::Sender<JobRequest>,
}

impl JobQueue {
    /// Enqueue work without blocking the request path. A full queue is
    /// reported to the submitter rather than waited out.
    pub fn submit(&self, request: JobRequest) -> AppResult<()> {
        self.tx
            .try_send(request)
            .map_err(|e| AppError::Queue(e.to_string()))
    }
}

/// Spawn `workers` worker tasks and hand back the queue they consume.
pub fn spawn_workers(
    workers: usize,
    queue_capacity: usize,
    store: JobStore,
    downloader: Arc<VideoDownloader>,
) -> JobQueue {
    let (tx, rx) = mpsc::channel::<JobRequest>(queue_capacity);
    let rx = Arc::new(Mutex::new(rx));

    for slot in 0..workers {
        let rx = Arc::clone(&rx);
        let store = store.clone();
        let downloader = Arc::clone(&downloader);

        tokio::spawn(async move {
            debug!(slot, "worker started");
            loop {
                // Hold the receiver lock only while waiting for the
                // next job, not while running it.
                let request = { rx.lock().await.recv().await };
                let Some(request) = request else { break };
                run_job(&store, &downloader, request).await;
            }
            debug!(slot, "worker exiting");
        });
    }

    JobQueue { tx }
}

/// Execute one job end to end.
///
/// Every failure is terminal for this job only: it lands on the job
/// record as status=error and is never re-thrown, so a bad URL can
/// never take a worker slot down with it.
pub async fn run_job(store: &JobStore, downloader: &VideoDownloader, request: JobRequest) {
    let job_id = request.job_id.clone();

    match store.get(&job_id) {
        Ok(Some(job)) if job.status.is_terminal() => {
            info!(job_id = %job_id, status = %job.status, "skipping redelivered terminal job");
            return;
        }
        Ok(_) => {}
        Err(e) => {
            error!(job_id = %job_id, "job lookup failed before run: {e}");
            return;
        }
    }

    write_update(
        store,
        &job_id,
        JobUpdate {
            status: Some(JobStatus::Downloading),
            progress: Some(5),
            message: Some("Starting download...".to_string()),
            ..JobUpdate::default()
        },
    );

    let sink: ProgressSink = {
        let store = store.clone();
        let job_id = job_id.clone();
        Arc::new(move |event| {
            write_update(&store, &job_id, event.into());
        })
    };

    match downloader.run(&request.url, request.format, &sink).await {
        Ok(filename) => {
            info!(job_id = %job_id, file = %filename, "job completed");
            write_update(
                store,
                &job_id,
                JobUpdate {
                    status: Some(JobStatus::Completed),
                    progress: Some(100),
                    message: Some("Download completed!".to_string()),
                    filename: Some(filename),
                    ..JobUpdate::default()
                },
            );
        }
        Err(e) => {
            error!(job_id = %job_id, "job failed: {e}");
            write_update(
                store,
                &job_id,
                JobUpdate {
                    status: Some(JobStatus::Error),
                    error: Some(e.to_string()),
                    message: Some(e.to_string()),
                    ..JobUpdate::default()
                },
            );
        }
    }
}

/// Progress writes must never abort a running job; a store failure is
/// logged and the download carries on.
fn write_update(store: &JobStore, job_id: &str, update: JobUpdate) {
    if let Err(e) = store.update(job_id, update) {
        error!(job_id = %job_id, "failed to write job update: {e}");
    }
}
