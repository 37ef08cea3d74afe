//! In-process stand-ins for Postgres, ffprobe, ffmpeg and storage bookkeeping.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tubely_core::{AppError, Video};
use tubely_db::VideoRepository;
use tubely_processing::video::remux::processing_path;
use tubely_processing::{AspectRatio, MediaProber, ProbeError, RemuxError, Remuxer};
use tubely_storage::{Storage, StorageBackend, StorageResult, UploadReader};
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryVideoRepository {
    videos: Mutex<HashMap<Uuid, Video>>,
    fail_updates: AtomicBool,
}

impl InMemoryVideoRepository {
    pub fn insert(&self, video: Video) {
        self.videos.lock().unwrap().insert(video.id, video);
    }

    pub fn get(&self, id: Uuid) -> Option<Video> {
        self.videos.lock().unwrap().get(&id).cloned()
    }

    pub fn fail_updates(&self) {
        self.fail_updates.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl VideoRepository for InMemoryVideoRepository {
    async fn get_video(&self, id: Uuid) -> Result<Option<Video>, AppError> {
        Ok(self.get(id))
    }

    async fn update_video(&self, video: &Video) -> Result<Video, AppError> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(AppError::Internal("Couldn't update video".to_string()));
        }
        let mut videos = self.videos.lock().unwrap();
        let stored = videos
            .get_mut(&video.id)
            .ok_or_else(|| AppError::Internal("Couldn't update video".to_string()))?;
        stored.title = video.title.clone();
        stored.description = video.description.clone();
        stored.thumbnail_url = video.thumbnail_url.clone();
        stored.video_url = video.video_url.clone();
        stored.updated_at = chrono::Utc::now();
        Ok(stored.clone())
    }
}

/// Reports a fixed orientation and remembers every path it was asked about;
/// `None` fails like a file with no streams.
pub struct FixedProber {
    aspect_ratio: Option<AspectRatio>,
    probed: Mutex<Vec<PathBuf>>,
}

impl FixedProber {
    pub fn new(aspect_ratio: Option<AspectRatio>) -> Self {
        FixedProber {
            aspect_ratio,
            probed: Mutex::new(Vec::new()),
        }
    }

    pub fn probed(&self) -> Vec<PathBuf> {
        self.probed.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaProber for FixedProber {
    async fn probe_aspect_ratio(&self, path: &Path) -> Result<AspectRatio, ProbeError> {
        assert!(path.exists(), "probe runs against the spooled upload");
        self.probed.lock().unwrap().push(path.to_path_buf());
        self.aspect_ratio.ok_or(ProbeError::NoStreams)
    }
}

/// Copies the input to `<input>.processing` and records the call.
#[derive(Default)]
pub struct StubRemuxer {
    calls: AtomicUsize,
    outputs: Mutex<Vec<PathBuf>>,
}

impl StubRemuxer {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn outputs(&self) -> Vec<PathBuf> {
        self.outputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Remuxer for StubRemuxer {
    async fn fast_start(&self, input: &Path) -> Result<PathBuf, RemuxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let output = processing_path(input);
        tokio::fs::copy(input, &output)
            .await
            .map_err(RemuxError::Spawn)?;
        self.outputs.lock().unwrap().push(output.clone());
        Ok(output)
    }
}

/// Delegates to a real backend and remembers which keys were written and deleted.
pub struct RecordingStorage {
    inner: Arc<dyn Storage>,
    uploaded: Mutex<Vec<String>>,
    deleted: Mutex<Vec<String>>,
}

impl RecordingStorage {
    pub fn new(inner: Arc<dyn Storage>) -> Self {
        RecordingStorage {
            inner,
            uploaded: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
        }
    }

    pub fn uploaded(&self) -> Vec<String> {
        self.uploaded.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl Storage for RecordingStorage {
    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<String> {
        let url = self
            .inner
            .upload_with_key(storage_key, data, content_type)
            .await?;
        self.uploaded.lock().unwrap().push(storage_key.to_string());
        Ok(url)
    }

    async fn upload_stream_with_key(
        &self,
        storage_key: &str,
        content_type: &str,
        content_length: Option<u64>,
        reader: UploadReader,
    ) -> StorageResult<String> {
        let url = self
            .inner
            .upload_stream_with_key(storage_key, content_type, content_length, reader)
            .await?;
        self.uploaded.lock().unwrap().push(storage_key.to_string());
        Ok(url)
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        self.inner.download(storage_key).await
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        self.inner.delete(storage_key).await?;
        self.deleted.lock().unwrap().push(storage_key.to_string());
        Ok(())
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        self.inner.exists(storage_key).await
    }

    fn public_url(&self, storage_key: &str) -> String {
        self.inner.public_url(storage_key)
    }

    fn backend_type(&self) -> StorageBackend {
        self.inner.backend_type()
    }
}
