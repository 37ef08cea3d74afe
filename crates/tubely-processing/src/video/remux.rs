//! Fast-start remuxing via `ffmpeg`
//!
//! Moves the MP4 `moov` atom ahead of the media data so players can start
//! before the whole file has downloaded. Streams are copied, never re-encoded.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use super::command::validate_executable;

const OUTPUT_SUFFIX: &str = ".processing";

#[derive(Debug, thiserror::Error)]
pub enum RemuxError {
    #[error("Invalid ffmpeg path: {0}")]
    InvalidExecutable(String),

    #[error("Failed to execute ffmpeg: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("ffmpeg {stderr}")]
    Failed { stderr: String },
}

/// Rewrites a local MP4 for progressive playback.
#[async_trait]
pub trait Remuxer: Send + Sync {
    /// Returns the path of the rewritten file; the input is left untouched.
    async fn fast_start(&self, input: &Path) -> Result<PathBuf, RemuxError>;
}

/// `<input>.processing`, next to the input.
pub fn processing_path(input: &Path) -> PathBuf {
    let mut name = OsString::from(input.as_os_str());
    name.push(OUTPUT_SUFFIX);
    PathBuf::from(name)
}

/// [`Remuxer`] backed by the `ffmpeg` binary.
#[derive(Debug, Clone)]
pub struct FfmpegRemuxer {
    ffmpeg_path: String,
}

impl FfmpegRemuxer {
    pub fn new(ffmpeg_path: impl Into<String>) -> Result<Self, RemuxError> {
        let ffmpeg_path = ffmpeg_path.into();
        validate_executable(&ffmpeg_path).map_err(RemuxError::InvalidExecutable)?;
        Ok(Self { ffmpeg_path })
    }
}

#[async_trait]
impl Remuxer for FfmpegRemuxer {
    #[tracing::instrument(skip(self, input), fields(
        process.executable.name = "ffmpeg",
        process.executable.path = %self.ffmpeg_path,
        ffmpeg.operation = "faststart",
        input = %input.display()
    ))]
    async fn fast_start(&self, input: &Path) -> Result<PathBuf, RemuxError> {
        let start = std::time::Instant::now();
        let output_path = processing_path(input);

        let output = Command::new(&self.ffmpeg_path)
            .arg("-i")
            .arg(input)
            .args(["-c", "copy", "-movflags", "faststart", "-f", "mp4"])
            .arg(&output_path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(RemuxError::Spawn)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::warn!(status = %output.status, stderr = %stderr, "ffmpeg remux failed");
            if let Err(e) = tokio::fs::remove_file(&output_path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::debug!(error = %e, "Failed to remove partial remux output");
                }
            }
            return Err(RemuxError::Failed { stderr });
        }

        tracing::debug!(
            output = %output_path.display(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "ffmpeg remux completed"
        );

        Ok(output_path)
    }
}
