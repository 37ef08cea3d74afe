use crate::auth::jwt::{get_bearer_token, validate_jwt};
use crate::error::HttpAppError;
use crate::state::AppState;
use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use std::sync::Arc;
use tubely_core::AppError;
use uuid::Uuid;

/// `{videoID}` path segment parsed as a UUID.
///
/// Declared before [`AuthUser`] in handler signatures so a malformed id is a
/// 400 even for unauthenticated requests.
#[derive(Debug, Clone, Copy)]
pub struct VideoIdPath(pub Uuid);

impl<S> FromRequestParts<S> for VideoIdPath
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::InvalidInput("Invalid ID".to_string()))?;

        Uuid::parse_str(&raw)
            .map(VideoIdPath)
            .map_err(|_| AppError::InvalidInput("Invalid ID".to_string()).into())
    }
}

/// Authenticated caller, taken from the bearer token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: Uuid,
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = HttpAppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = get_bearer_token(&parts.headers)?;
        let user_id = validate_jwt(token, state.config.jwt_secret())?;
        Ok(AuthUser { user_id })
    }
}
