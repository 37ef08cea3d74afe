//! Shared key generation for storage backends.

use rand::TryRngCore;
use uuid::Uuid;

use crate::{StorageError, StorageResult};

const OBJECT_NAME_BYTES: usize = 32;

/// Thumbnail key: `{video_id}.{extension}`.
pub fn thumbnail_key(video_id: Uuid, extension: &str) -> String {
    format!("{}.{}", video_id, extension)
}

/// Video key: `{prefix}/{name}.mp4`.
pub fn video_key(prefix: &str, name: &str) -> String {
    format!("{}/{}.mp4", prefix, name)
}

/// 32 bytes from the OS RNG, hex encoded (64 lowercase chars).
pub fn random_object_name() -> StorageResult<String> {
    let mut buf = [0u8; OBJECT_NAME_BYTES];
    rand::rngs::OsRng
        .try_fill_bytes(&mut buf)
        .map_err(|e| StorageError::KeyGeneration(e.to_string()))?;
    Ok(hex::encode(buf))
}
