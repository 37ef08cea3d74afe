//! HTTP request handlers

pub mod health;
pub mod thumbnail_upload;
pub mod video_upload;

use mime::Mime;
use tubely_core::AppError;

/// Parse the declared content type of a form part. Parameters are kept on the
/// returned value but ignored by callers, which compare type and subtype only.
pub(crate) fn parse_declared_media_type(declared: Option<&str>) -> Result<Mime, AppError> {
    let declared = declared
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing Content-Type for file".to_string()))?;

    declared
        .parse::<Mime>()
        .map_err(|_| AppError::BadRequest(format!("Invalid Content-Type: {}", declared)))
}
