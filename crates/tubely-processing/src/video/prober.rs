//! Aspect-ratio probing via `ffprobe`

use async_trait::async_trait;
use serde::Deserialize;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;
use tokio::process::Command;

use super::command::validate_executable;

/// Tolerance when matching a ratio against 16:9 or 9:16.
const RATIO_TOLERANCE: f64 = 0.02;

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("Invalid ffprobe path: {0}")]
    InvalidExecutable(String),

    #[error("Failed to execute ffprobe: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("ffprobe exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("Could not decode ffprobe output: {0}")]
    InvalidOutput(#[from] serde_json::Error),

    #[error("ffprobe reported no streams")]
    NoStreams,
}

/// Orientation bucket of a video's first stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectRatio {
    Landscape,
    Portrait,
    Other,
}

impl AspectRatio {
    /// Bucket a frame size. Degenerate sizes (zero height) land in `Other`.
    pub fn classify(width: u64, height: u64) -> Self {
        let ratio = width as f64 / height as f64;
        if (ratio - 16.0 / 9.0).abs() < RATIO_TOLERANCE {
            AspectRatio::Landscape
        } else if (ratio - 9.0 / 16.0).abs() < RATIO_TOLERANCE {
            AspectRatio::Portrait
        } else {
            AspectRatio::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Other => "other",
        }
    }

    /// Directory videos of this orientation are stored under.
    pub fn storage_prefix(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "landscape",
            AspectRatio::Portrait => "portrait",
            AspectRatio::Other => "other",
        }
    }
}

impl Display for AspectRatio {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    #[serde(default)]
    width: u64,
    #[serde(default)]
    height: u64,
}

/// Classify the first stream of `ffprobe -print_format json -show_streams` output.
pub fn parse_probe_output(stdout: &[u8]) -> Result<AspectRatio, ProbeError> {
    let output: FfprobeOutput = serde_json::from_slice(stdout)?;
    let stream = output.streams.first().ok_or(ProbeError::NoStreams)?;
    Ok(AspectRatio::classify(stream.width, stream.height))
}

/// Reports the orientation of a local media file.
#[async_trait]
pub trait MediaProber: Send + Sync {
    async fn probe_aspect_ratio(&self, path: &Path) -> Result<AspectRatio, ProbeError>;
}

/// [`MediaProber`] backed by the `ffprobe` binary.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    ffprobe_path: String,
}

impl FfprobeProber {
    pub fn new(ffprobe_path: impl Into<String>) -> Result<Self, ProbeError> {
        let ffprobe_path = ffprobe_path.into();
        validate_executable(&ffprobe_path).map_err(ProbeError::InvalidExecutable)?;
        Ok(Self { ffprobe_path })
    }
}

#[async_trait]
impl MediaProber for FfprobeProber {
    #[tracing::instrument(skip(self, path), fields(
        process.executable.name = "ffprobe",
        process.executable.path = %self.ffprobe_path,
        path = %path.display()
    ))]
    async fn probe_aspect_ratio(&self, path: &Path) -> Result<AspectRatio, ProbeError> {
        let start = std::time::Instant::now();

        let output = Command::new(&self.ffprobe_path)
            .args(["-v", "error", "-print_format", "json", "-show_streams"])
            .arg(path)
            .output()
            .await
            .map_err(ProbeError::Spawn)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::warn!(status = %output.status, stderr = %stderr, "ffprobe failed");
            return Err(ProbeError::Failed {
                status: output.status.to_string(),
                stderr,
            });
        }

        let aspect_ratio = parse_probe_output(&output.stdout)?;

        tracing::debug!(
            aspect_ratio = %aspect_ratio,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "ffprobe completed"
        );

        Ok(aspect_ratio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_common_sizes() {
        assert_eq!(AspectRatio::classify(1920, 1080), AspectRatio::Landscape);
        assert_eq!(AspectRatio::classify(1080, 1920), AspectRatio::Portrait);
        assert_eq!(AspectRatio::classify(1000, 1000), AspectRatio::Other);
        assert_eq!(AspectRatio::classify(1280, 720), AspectRatio::Landscape);
        // 854x480 is within tolerance of 16:9
        assert_eq!(AspectRatio::classify(854, 480), AspectRatio::Landscape);
        assert_eq!(AspectRatio::classify(1440, 1080), AspectRatio::Other);
    }

    #[test]
    fn degenerate_sizes_are_other() {
        assert_eq!(AspectRatio::classify(0, 0), AspectRatio::Other);
        assert_eq!(AspectRatio::classify(1920, 0), AspectRatio::Other);
        assert_eq!(AspectRatio::classify(0, 1080), AspectRatio::Other);
    }

    #[test]
    fn labels_and_prefixes() {
        assert_eq!(AspectRatio::Landscape.as_str(), "16:9");
        assert_eq!(AspectRatio::Portrait.to_string(), "9:16");
        assert_eq!(AspectRatio::Landscape.storage_prefix(), "landscape");
        assert_eq!(AspectRatio::Portrait.storage_prefix(), "portrait");
        assert_eq!(AspectRatio::Other.storage_prefix(), "other");
    }

    #[test]
    fn parses_first_stream_only() {
        let json = br#"{
            "streams": [
                {"index": 0, "codec_type": "video", "width": 1080, "height": 1920},
                {"index": 1, "codec_type": "audio"}
            ]
        }"#;
        assert_eq!(parse_probe_output(json).unwrap(), AspectRatio::Portrait);
    }

    #[test]
    fn stream_without_dimensions_is_other() {
        let json = br#"{"streams": [{"index": 0, "codec_type": "audio"}]}"#;
        assert_eq!(parse_probe_output(json).unwrap(), AspectRatio::Other);
    }

    #[test]
    fn empty_stream_list_fails() {
        assert!(matches!(
            parse_probe_output(br#"{"streams": []}"#),
            Err(ProbeError::NoStreams)
        ));
        assert!(matches!(parse_probe_output(b"{}"), Err(ProbeError::NoStreams)));
    }

    #[test]
    fn malformed_output_fails() {
        assert!(matches!(
            parse_probe_output(b"not json"),
            Err(ProbeError::InvalidOutput(_))
        ));
    }

    #[test]
    fn rejects_unsafe_executable() {
        assert!(matches!(
            FfprobeProber::new("ffprobe && curl evil"),
            Err(ProbeError::InvalidExecutable(_))
        ));
    }

    #[tokio::test]
    async fn missing_binary_is_spawn_error() {
        let prober = FfprobeProber::new("/nonexistent/tubely/ffprobe").unwrap();
        let result = prober.probe_aspect_ratio(Path::new("video.mp4")).await;
        assert!(matches!(result, Err(ProbeError::Spawn(_))));
    }
}
