//! Tubely Storage Library
//!
//! Storage abstraction plus the two backends the service writes to: the local
//! filesystem (thumbnails, and videos in development) and S3 (videos).
//!
//! # Storage key format
//!
//! - **Thumbnails**: `{video_id}.{extension}`, one file per video, overwritten on re-upload.
//! - **Videos**: `{orientation}/{64 hex chars}.mp4` where orientation is
//!   `landscape`, `portrait` or `other`.
//!
//! Keys must not contain `..` or a leading `/`. Key generation lives in the
//! `keys` module.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_object_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult, UploadReader};
pub use tubely_core::StorageBackend;
