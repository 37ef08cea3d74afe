//! Filesystem backend. Keys map to paths under a root directory; each write
//! lands in its own uniquely named `.partial` sibling and is renamed into
//! place, so readers never see a half-written object.

use crate::traits::{Storage, StorageError, StorageResult, UploadReader};
use crate::StorageBackend;
use async_trait::async_trait;
use std::io::Cursor;
use std::path::{Component, Path, PathBuf};
use std::time::Instant;
use tokio::fs;
use tokio::io::AsyncWriteExt;

const PARTIAL_SUFFIX: &str = ".partial";

#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// `root` is created if missing. `base_url` is where the directory is
    /// served, e.g. `http://localhost:8091/assets`.
    pub async fn new(root: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(|e| {
            StorageError::ConfigError(format!("Cannot create {}: {}", root.display(), e))
        })?;
        Ok(LocalStorage { root, base_url })
    }

    /// Resolve a key to a path under the root. Only plain relative components
    /// are accepted.
    fn resolve(&self, storage_key: &str) -> StorageResult<PathBuf> {
        let relative = Path::new(storage_key);
        let well_formed = !storage_key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !well_formed {
            return Err(StorageError::InvalidKey(format!(
                "Key {:?} is not a relative path",
                storage_key
            )));
        }
        Ok(self.root.join(relative))
    }

    async fn write_from(&self, storage_key: &str, mut reader: UploadReader) -> StorageResult<u64> {
        let path = self.resolve(storage_key)?;
        let parent = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(parent).await?;

        // Dropping `partial` before `persist` removes the file.
        let written = async {
            let (file, partial) = tempfile::Builder::new()
                .prefix(".")
                .suffix(PARTIAL_SUFFIX)
                .tempfile_in(parent)?
                .into_parts();
            let mut file = fs::File::from_std(file);
            let written = tokio::io::copy(&mut reader, &mut file).await?;
            file.flush().await?;
            file.sync_all().await?;
            drop(file);
            partial.persist(&path).map_err(|e| e.error)?;
            Ok::<u64, std::io::Error>(written)
        }
        .await;

        written.map_err(|e| {
            StorageError::UploadFailed(format!("Writing {}: {}", path.display(), e))
        })
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<String> {
        let len = data.len() as u64;
        let reader: UploadReader = Box::pin(Cursor::new(data));
        self.upload_stream_with_key(storage_key, content_type, Some(len), reader)
            .await
    }

    async fn upload_stream_with_key(
        &self,
        storage_key: &str,
        content_type: &str,
        _content_length: Option<u64>,
        reader: UploadReader,
    ) -> StorageResult<String> {
        let start = Instant::now();
        let size_bytes = self.write_from(storage_key, reader).await?;

        tracing::debug!(
            key = %storage_key,
            content_type,
            size_bytes,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Stored file on local disk"
        );

        Ok(self.public_url(storage_key))
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        let path = self.resolve(storage_key)?;
        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(storage_key.to_string()))
            }
            Err(e) => Err(StorageError::DownloadFailed(format!(
                "Reading {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let path = self.resolve(storage_key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(key = %storage_key, "Removed file from local disk");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "Removing {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let path = self.resolve(storage_key)?;
        Ok(fs::try_exists(&path).await?)
    }

    fn public_url(&self, storage_key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), storage_key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
