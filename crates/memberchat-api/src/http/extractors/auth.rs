//! Session token authentication extractor.
//!
//! Reads `Authorization: Bearer <token>` and validates the session JWT
//! through the auth service. Handlers that take [`AuthUser`] are protected.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::http::error::AppError;
use crate::state::AppState;

/// The authenticated caller.
///
/// Only the user id is taken from the claims; subscriber status is re-read
/// from the database where it matters.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer(parts)?;
        let claims = state.auth_service.authenticate(token)?;

        Ok(AuthUser {
            user_id: claims.sub,
        })
    }
}

/// Extract the bearer token from the Authorization header.
fn extract_bearer(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| {
            AppError::Unauthorized(
                "Missing session token. Provide it via 'Authorization: Bearer <token>'.".to_string(),
            )
        })?;

    let value = header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid Authorization header encoding".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Authorization header must use the Bearer scheme".to_string()))
}
