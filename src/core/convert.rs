//! Conversion capability: transcode a downloaded media file to MP3.
//!
//! Fixed output quality (192kbps, 44100Hz), matching what the service
//! advertises. The trait seam mirrors the extractor's so worker tests
//! can run without an ffmpeg binary on the machine.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::error;

use super::models::{AppError, AppResult};

/// Output audio bitrate handed to the transcoder.
pub const AUDIO_BITRATE: &str = "192k";

/// Output sample rate handed to the transcoder.
pub const AUDIO_SAMPLE_RATE: &str = "44100";

/// Opaque capability that turns an input media file into an MP3.
#[async_trait]
pub trait AudioConverter: Send + Sync {
    async fn to_mp3(&self, input: &Path, output: &Path) -> AppResult<()>;
}

/// ffmpeg backed converter.
pub struct FfmpegConverter {
    binary: PathBuf,
}

impl FfmpegConverter {
    pub fn new(binary: PathBuf) -> Self {
        Self { binary }
    }
}

#[async_trait]
impl AudioConverter for FfmpegConverter {
    async fn to_mp3(&self, input: &Path, output: &Path) -> AppResult<()> {
        let result = Command::new(&self.binary)
            .arg("-i")
            .arg(input)
            .args(["-vn", "-acodec", "libmp3lame", "-ab", AUDIO_BITRATE, "-ar", AUDIO_SAMPLE_RATE, "-y"])
            .arg(output)
            .output()
            .await;

        let output_result = match result {
            Ok(out) => out,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::Conversion(
                    "FFmpeg not found. Please install FFmpeg.".to_string(),
                ));
            }
            Err(e) => return Err(AppError::Io(e)),
        };

        if !output_result.status.success() {
            error!(
                "ffmpeg error: {}",
                String::from_utf8_lossy(&output_result.stderr)
            );
            return Err(AppError::Conversion("Audio conversion failed".to_string()));
        }

        Ok(())
    }
}
