//! Download orchestration for a single job.
//!
//! Drives the extraction capability, locates the produced file, and
//! runs the optional audio conversion. Every observable step is
//! reported through the progress sink so the browser polling the job
//! record sees the same story the worker does.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::convert::AudioConverter;
use super::extractor::{MediaExtractor, ProgressSink};
use super::models::{AppError, AppResult, DownloadFormat, JobStatus, ProgressEvent};
use crate::utils::{find_downloaded_file, sanitize_filename};

pub struct VideoDownloader {
    extractor: Arc<dyn MediaExtractor>,
    converter: Arc<dyn AudioConverter>,
    download_dir: PathBuf,
}

impl VideoDownloader {
    pub fn new(
        extractor: Arc<dyn MediaExtractor>,
        converter: Arc<dyn AudioConverter>,
        download_dir: PathBuf,
    ) -> Self {
        Self {
            extractor,
            converter,
            download_dir,
        }
    }

    /// Run one download to completion and return the basename of the
    /// final output file.
    pub async fn run(
        &self,
        url: &str,
        format: DownloadFormat,
        sink: &ProgressSink,
    ) -> AppResult<String> {
        sink(ProgressEvent {
            status: JobStatus::Downloading,
            progress: 10,
            message: "Fetching video information...".to_string(),
        });

        let title = sanitize_filename(&self.extractor.fetch_title(url).await?);
        debug!(title = %title, "resolved media title");

        sink(ProgressEvent {
            status: JobStatus::Downloading,
            progress: 20,
            message: format!("Starting download of: {title}"),
        });

        self.extractor.download(url, format, sink).await?;

        // The extractor does not return an authoritative path; locate
        // the produced file by title, falling back to the newest
        // non-partial file in the directory.
        let downloaded = find_downloaded_file(&self.download_dir, &title).ok_or_else(|| {
            AppError::Extraction("Download completed, but file not found".to_string())
        })?;

        let final_path = match format {
            DownloadFormat::Mp4 => downloaded,
            DownloadFormat::Mp3 => {
                sink(ProgressEvent {
                    status: JobStatus::Converting,
                    progress: 95,
                    message: "Converting to MP3...".to_string(),
                });

                let output = self.download_dir.join(format!("{title}.mp3"));
                self.converter.to_mp3(&downloaded, &output).await?;

                if downloaded != output {
                    // Intermediate video removal is best-effort.
                    if let Err(e) = std::fs::remove_file(&downloaded) {
                        warn!(
                            path = %downloaded.display(),
                            "failed to remove intermediate file: {e}"
                        );
                    }
                }
                output
            }
        };

        let basename = final_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| AppError::Extraction("output file has no name".to_string()))?;

        info!(file = %basename, "download finished");
        Ok(basename)
    }
}
