use crate::auth::{AuthUser, VideoIdPath};
use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::parse_declared_media_type;
use crate::state::AppState;
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    Json,
};
use std::io::SeekFrom;
use std::sync::Arc;
use tempfile::{NamedTempFile, TempPath};
use tokio::fs::File;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tubely_core::{AppError, Video};
use tubely_storage::keys::{random_object_name, video_key};
use tubely_storage::UploadReader;

const VIDEO_FIELD: &str = "video";
const TEMP_PREFIX: &str = "tubely-upload";
const TEMP_SUFFIX: &str = ".mp4";

/// Temp file that receives the upload; removed from disk when dropped.
fn create_upload_temp_file() -> Result<(NamedTempFile, File), AppError> {
    let temp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(TEMP_SUFFIX)
        .tempfile()
        .map_err(|e| AppError::internal("Unable to create a temp file", e))?;
    let handle = temp
        .as_file()
        .try_clone()
        .map_err(|e| AppError::internal("Unable to create a temp file", e))?;
    Ok((temp, File::from_std(handle)))
}

#[utoipa::path(
    post,
    path = "/api/video_upload/{video_id}",
    tag = "uploads",
    params(
        ("video_id" = String, Path, description = "Video ID")
    ),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Video stored", body = Video),
        (status = 400, description = "Invalid id or unsupported file", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token, unknown video, or not the owner", body = ErrorResponse),
        (status = 500, description = "Copy, probe, storage or database failure", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip_all, fields(video_id = %video_id, user_id = %user.user_id))]
pub async fn upload_video(
    VideoIdPath(video_id): VideoIdPath,
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Video>, HttpAppError> {
    let mut video = state
        .videos
        .get_video(video_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Couldn't find video".to_string()))?;

    let mut multipart = multipart?;
    let mut field = loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| {
                // Body cap exceeded mid-read counts as a copy failure.
                if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    AppError::internal("Unable to copy video to a new file", e)
                } else {
                    AppError::BadRequest(format!("Unable to parse form file: {}", e))
                }
            })?
            .ok_or_else(|| AppError::BadRequest("Unable to parse form file".to_string()))?;
        if field.name() == Some(VIDEO_FIELD) {
            break field;
        }
    };

    let declared_type = field.content_type().map(str::to_owned);
    if declared_type.as_deref().map_or(true, |t| t.trim().is_empty()) {
        return Err(AppError::BadRequest("Missing Content-Type for video".to_string()).into());
    }

    if !video.is_owned_by(user.user_id) {
        return Err(AppError::Unauthorized("Not authorized to update this video".to_string()).into());
    }

    let media_type = parse_declared_media_type(declared_type.as_deref())?;
    if media_type.essence_str() != "video/mp4" {
        return Err(AppError::BadRequest("Invalid file type".to_string()).into());
    }

    let (temp, mut file) = create_upload_temp_file()?;

    // Over-limit bodies fail here, before anything reaches object storage.
    let mut written: u64 = 0;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::internal("Unable to copy video to a new file", e))?
    {
        file.write_all(&chunk)
            .await
            .map_err(|e| AppError::internal("Unable to copy video to a new file", e))?;
        written += chunk.len() as u64;
    }
    file.flush()
        .await
        .map_err(|e| AppError::internal("Unable to copy video to a new file", e))?;
    file.seek(SeekFrom::Start(0))
        .await
        .map_err(|e| AppError::internal("Unable to reset file pointer", e))?;

    tracing::debug!(size_bytes = written, path = %temp.path().display(), "Video copied to temp file");

    let name = random_object_name()?;
    let aspect_ratio = state.prober.probe_aspect_ratio(temp.path()).await?;
    let key = video_key(aspect_ratio.storage_prefix(), &name);

    // The remuxed copy is deleted when this guard drops at the end of the request.
    let processed: Option<TempPath> = if state.config.video_fast_start() {
        let remuxed = state.remuxer.fast_start(temp.path()).await?;
        let remuxed = TempPath::try_from_path(remuxed)
            .map_err(|e| AppError::internal("Couldn't open processed file", e))?;
        Some(remuxed)
    } else {
        None
    };

    let (reader, content_length) = match &processed {
        Some(processed) => {
            let processed_file = File::open(processed)
                .await
                .map_err(|e| AppError::internal("Couldn't open processed file", e))?;
            let len = processed_file
                .metadata()
                .await
                .map_err(|e| AppError::internal("Couldn't open processed file", e))?
                .len();
            let reader: UploadReader = Box::pin(processed_file);
            (reader, len)
        }
        None => {
            file.seek(SeekFrom::Start(0))
                .await
                .map_err(|e| AppError::internal("Unable to reset file pointer", e))?;
            let reader: UploadReader = Box::pin(file);
            (reader, written)
        }
    };

    let url = state
        .objects
        .upload_stream_with_key(&key, media_type.essence_str(), Some(content_length), reader)
        .await?;

    video.video_url = Some(url);
    let video = match state.videos.update_video(&video).await {
        Ok(video) => video,
        Err(e) => {
            let objects = state.objects.clone();
            let orphan_key = key.clone();
            tokio::spawn(async move {
                if let Err(cleanup_err) = objects.delete(&orphan_key).await {
                    tracing::warn!(
                        error = %cleanup_err,
                        key = %orphan_key,
                        "Failed to cleanup uploaded video after DB error"
                    );
                }
            });
            return Err(e.into());
        }
    };

    tracing::info!(
        key = %key,
        aspect_ratio = %aspect_ratio,
        size_bytes = content_length,
        fast_start = state.config.video_fast_start(),
        "Video uploaded"
    );

    Ok(Json(video))
}
