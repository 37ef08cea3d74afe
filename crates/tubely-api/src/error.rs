//! HTTP error response conversion
//!
//! Handlers return `Result<_, HttpAppError>`. Anything convertible into
//! [`AppError`] (storage, probe and remux failures included) renders with the
//! same status mapping, body shape and logging.

use axum::{
    extract::{multipart::MultipartRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tubely_core::{AppError, Config, ErrorMetadata, LogLevel};
use tubely_processing::{ProbeError, RemuxError};
use tubely_storage::StorageError;
use utoipa::ToSchema;

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
}

/// Wrapper type for AppError to implement IntoResponse
/// (orphan rule: IntoResponse and AppError both live in other crates).
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<MultipartRejection> for HttpAppError {
    fn from(rejection: MultipartRejection) -> Self {
        HttpAppError(AppError::BadRequest(format!(
            "Unable to parse form file: {}",
            rejection.body_text()
        )))
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    let details = error.detailed_message();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %details, error_type = error_type, "Request rejected");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %details, error_type = error_type, "Request rejected");
        }
        LogLevel::Error => {
            tracing::error!(error = %details, error_type = error_type, "Request failed");
        }
    }
}

/// Detailed body for a non-sensitive error, riding on the response until
/// [`expose_error_details`] decides whether the client gets it.
#[derive(Clone, Debug)]
struct ErrorDetails(ErrorResponse);

impl ErrorResponse {
    fn from_app_error(app_error: &AppError, include_details: bool) -> Self {
        if include_details {
            ErrorResponse {
                error: app_error.client_message(),
                code: app_error.error_code().to_string(),
                details: Some(app_error.detailed_message()),
                error_type: Some(app_error.error_type().to_string()),
            }
        } else {
            ErrorResponse {
                error: app_error.client_message(),
                code: app_error.error_code().to_string(),
                details: None,
                error_type: None,
            }
        }
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        let body = ErrorResponse::from_app_error(app_error, false);
        let mut response = (status, Json(body)).into_response();
        if !app_error.is_sensitive() {
            response
                .extensions_mut()
                .insert(ErrorDetails(ErrorResponse::from_app_error(app_error, true)));
        }
        response
    }
}

/// Response mapper that swaps in the detailed error body outside production.
pub async fn expose_error_details(State(config): State<Config>, mut response: Response) -> Response {
    let Some(ErrorDetails(details)) = response.extensions_mut().remove::<ErrorDetails>() else {
        return response;
    };
    if config.is_production() {
        return response;
    }
    (response.status(), Json(details)).into_response()
}

// Domain errors from the other crates

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        let app = match err {
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            StorageError::KeyGeneration(msg) => {
                AppError::Internal(format!("Couldn't generate storage key: {}", msg))
            }
            StorageError::IoError(err) => AppError::Internal(format!("IO error: {}", err)),
            StorageError::ConfigError(msg) => AppError::Internal(msg),
            other => AppError::Storage(other.to_string()),
        };
        HttpAppError(app)
    }
}

impl From<ProbeError> for HttpAppError {
    fn from(err: ProbeError) -> Self {
        HttpAppError(AppError::MediaProcessing(format!(
            "Couldn't determine aspect ratio: {}",
            err
        )))
    }
}

impl From<RemuxError> for HttpAppError {
    fn from(err: RemuxError) -> Self {
        HttpAppError(AppError::MediaProcessing(format!(
            "Couldn't prepare video for fast start: {}",
            err
        )))
    }
}
