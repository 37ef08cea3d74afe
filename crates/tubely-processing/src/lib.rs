//! Tubely Processing Library
//!
//! Thin wrappers around the external media tools the upload pipeline shells
//! out to: `ffprobe` for stream geometry and `ffmpeg` for fast-start remuxing.

pub mod video;

pub use video::{
    AspectRatio, FfmpegRemuxer, FfprobeProber, MediaProber, ProbeError, RemuxError, Remuxer,
};
