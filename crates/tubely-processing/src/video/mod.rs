//! Video inspection and remuxing

mod command;
pub mod prober;
pub mod remux;

pub use prober::{AspectRatio, FfprobeProber, MediaProber, ProbeError};
pub use remux::{FfmpegRemuxer, RemuxError, Remuxer};
