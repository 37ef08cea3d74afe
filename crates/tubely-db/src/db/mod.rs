//! Database repositories for data access layer
//!
//! Video rows are created by the wider platform; this service only reads a
//! record at the start of an upload and writes its URL fields back at the end.

mod video;

pub use video::{PgVideoRepository, VideoRepository};
