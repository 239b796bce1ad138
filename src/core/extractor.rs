//! Extraction capability: turn a source URL into a local media file.
//!
//! The production backend shells out to the `yt-dlp` binary and parses
//! its `--newline` progress stream. The trait seam exists so the worker
//! and the HTTP layer can be exercised against a stub in tests.

use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

use super::models::{AppError, AppResult, DownloadFormat, JobStatus, ProgressEvent};

/// Sink for structured progress events; each event is written straight
/// into the job record store by the worker.
pub type ProgressSink = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Download progress is clamped to this ceiling; the final 10% is
/// reserved for conversion and finalization.
pub const DOWNLOAD_PROGRESS_CAP: u8 = 90;

/// Midpoint estimate reported when a progress line carries no parsable
/// percentage. Best-effort heuristic, not a guarantee.
pub const PROGRESS_FALLBACK: f64 = 50.0;

/// Opaque capability that retrieves media from a source URL, emitting
/// progress events along the way.
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Resolve the media title for the URL (used for output naming).
    async fn fetch_title(&self, url: &str) -> AppResult<String>;

    /// Retrieve the media into the extractor's download directory.
    /// The caller locates the produced file afterwards.
    async fn download(
        &self,
        url: &str,
        format: DownloadFormat,
        sink: &ProgressSink,
    ) -> AppResult<()>;
}

/// yt-dlp backed extractor.
pub struct YtDlpExtractor {
    binary: PathBuf,
    download_dir: PathBuf,
    percent_re: Regex,
}

impl YtDlpExtractor {
    pub fn new(binary: PathBuf, download_dir: PathBuf) -> Self {
        Self {
            binary,
            download_dir,
            percent_re: Regex::new(r"\[download\]\s+(\d+(?:\.\d+)?)%").expect("static regex"),
        }
    }

    fn output_template(&self) -> String {
        self.download_dir
            .join("%(title)s.%(ext)s")
            .to_string_lossy()
            .into_owned()
    }

    /// Extract a percentage from one line of yt-dlp `--newline` output.
    ///
    /// Returns `None` for lines that are not progress reports. A progress
    /// line without a readable percentage falls back to the midpoint.
    fn parse_progress_line(&self, line: &str) -> Option<f64> {
        if let Some(caps) = self.percent_re.captures(line) {
            return caps[1].parse::<f64>().ok().or(Some(PROGRESS_FALLBACK));
        }
        if line.starts_with("[download]") && line.contains('%') {
            return Some(PROGRESS_FALLBACK);
        }
        None
    }
}

/// Clamp a raw percentage into the download band [0, cap].
pub fn clamp_progress(percent: f64) -> u8 {
    let bounded = percent.clamp(0.0, f64::from(DOWNLOAD_PROGRESS_CAP));
    bounded as u8
}

#[async_trait]
impl MediaExtractor for YtDlpExtractor {
    async fn fetch_title(&self, url: &str) -> AppResult<String> {
        let output = Command::new(&self.binary)
            .args(["--no-playlist", "--print", "title", url])
            .output()
            .await
            .map_err(|e| map_spawn_error(&self.binary, e))?;

        if !output.status.success() {
            return Err(AppError::Extraction(stderr_tail(&output.stderr)));
        }

        let title = String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();

        if title.is_empty() {
            Ok("video".to_string())
        } else {
            Ok(title)
        }
    }

    async fn download(
        &self,
        url: &str,
        format: DownloadFormat,
        sink: &ProgressSink,
    ) -> AppResult<()> {
        let selector = match format {
            DownloadFormat::Mp4 => "best",
            DownloadFormat::Mp3 => "bestaudio",
        };

        let template = self.output_template();
        let mut child = Command::new(&self.binary)
            .args([
                "--newline",
                "--no-playlist",
                "-f",
                selector,
                "-o",
                template.as_str(),
                url,
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| map_spawn_error(&self.binary, e))?;

        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if let Some(percent) = self.parse_progress_line(&line) {
                    sink(ProgressEvent {
                        status: JobStatus::Downloading,
                        progress: clamp_progress(percent),
                        message: format!("Downloading video... {percent:.1}%"),
                    });
                } else {
                    debug!(line = %line, "yt-dlp");
                }
            }
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(AppError::Io)?;

        if !output.status.success() {
            let detail = stderr_tail(&output.stderr);
            warn!(url = %url, "yt-dlp exited with failure: {detail}");
            return Err(AppError::Extraction(detail));
        }

        Ok(())
    }
}

fn map_spawn_error(binary: &Path, err: std::io::Error) -> AppError {
    if err.kind() == std::io::ErrorKind::NotFound {
        AppError::Extraction(format!(
            "{} not found. Please install yt-dlp.",
            binary.display()
        ))
    } else {
        AppError::Io(err)
    }
}

/// Last few stderr lines, enough context for the job record without
/// dumping the whole transcript.
fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let tail = lines.iter().rev().take(3).rev().cloned().collect::<Vec<_>>();
    if tail.is_empty() {
        "extractor failed without output".to_string()
    } else {
        tail.join("; ")
    }
}
