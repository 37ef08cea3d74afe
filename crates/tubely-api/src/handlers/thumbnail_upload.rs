use crate::auth::{AuthUser, VideoIdPath};
use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::parse_declared_media_type;
use crate::state::AppState;
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use std::sync::Arc;
use tubely_core::{AppError, Video};
use tubely_storage::keys::thumbnail_key;

const THUMBNAIL_FIELD: &str = "thumbnail";

#[utoipa::path(
    post,
    path = "/api/thumbnail_upload/{video_id}",
    tag = "uploads",
    params(
        ("video_id" = String, Path, description = "Video ID")
    ),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Thumbnail stored", body = Video),
        (status = 400, description = "Invalid id, missing record or unsupported file", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token, or not the owner", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip_all, fields(video_id = %video_id, user_id = %user.user_id))]
pub async fn upload_thumbnail(
    VideoIdPath(video_id): VideoIdPath,
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Video>, HttpAppError> {
    let mut video = state
        .videos
        .get_video(video_id)
        .await?
        .ok_or_else(|| AppError::BadRequest("Couldn't find video".to_string()))?;

    if !video.is_owned_by(user.user_id) {
        return Err(AppError::Unauthorized("Not authorized to update this video".to_string()).into());
    }

    let mut multipart = multipart?;
    let (declared_type, data) = loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Unable to parse form file: {}", e)))?
            .ok_or_else(|| AppError::BadRequest("Unable to parse form file".to_string()))?;

        if field.name() != Some(THUMBNAIL_FIELD) {
            continue;
        }

        let declared_type = field.content_type().map(str::to_owned);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Unable to read form file: {}", e)))?;
        break (declared_type, data);
    };

    let media_type = parse_declared_media_type(declared_type.as_deref())?;
    if media_type.type_() != mime::IMAGE
        || (media_type.subtype() != mime::JPEG && media_type.subtype() != mime::PNG)
    {
        return Err(AppError::BadRequest("Invalid file type".to_string()).into());
    }

    let key = thumbnail_key(video_id, media_type.subtype().as_str());
    let size_bytes = data.len();
    let url = state
        .assets
        .upload_with_key(&key, data.to_vec(), media_type.essence_str())
        .await?;

    video.thumbnail_url = Some(url);
    let video = state.videos.update_video(&video).await?;

    tracing::info!(
        key = %key,
        size_bytes,
        content_type = %media_type.essence_str(),
        "Thumbnail uploaded"
    );

    Ok(Json(video))
}
