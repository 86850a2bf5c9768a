//! Account and sign-in handlers.
//!
//! Endpoints:
//! - POST /api/v1/auth/signup          - Create a password account
//! - POST /api/v1/auth/login           - Email/password login
//! - POST /api/v1/auth/login/google    - Login with a Google ID token
//! - POST /api/v1/auth/forgot-password - Mail a password reset link
//! - POST /api/v1/auth/reset-password  - Set a new password from a reset link
//! - GET  /api/v1/auth/me              - Current user profile

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use memberchat_types::auth::SessionToken;
use memberchat_types::user::{NewUser, User};

use crate::http::error::AppError;
use crate::http::extractors::auth::AuthUser;
use crate::http::response::{ApiResponse, RequestTimer};
use crate::state::AppState;

/// Request body for email/password login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for Google login.
#[derive(Debug, Deserialize)]
pub struct GoogleLoginRequest {
    #[serde(default, alias = "idToken")]
    pub id_token: String,
}

/// Request body for a reset link.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

/// Request body for completing a reset. Missing fields are reported by name.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "newPassword")]
    pub new_password: String,
}

/// Plain acknowledgement payload.
#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: &'static str,
}

/// POST /api/v1/auth/signup - Create a password account.
pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<NewUser>,
) -> Result<ApiResponse<User>, AppError> {
    let timer = RequestTimer::start();

    let user = state.auth_service.signup(body).await?;

    Ok(timer
        .finish(user)
        .with_status(StatusCode::CREATED)
        .with_link("login", "/api/v1/auth/login"))
}

/// POST /api/v1/auth/login - Email/password login.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<ApiResponse<SessionToken>, AppError> {
    let timer = RequestTimer::start();

    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(AppError::Validation("email and password are required".to_string()));
    }
    let token = state.auth_service.login(&body.email, &body.password).await?;

    Ok(timer.finish(token).with_link("me", "/api/v1/auth/me"))
}

/// POST /api/v1/auth/login/google - Login with a Google ID token.
pub async fn login_google(
    State(state): State<AppState>,
    Json(body): Json<GoogleLoginRequest>,
) -> Result<ApiResponse<SessionToken>, AppError> {
    let timer = RequestTimer::start();

    if body.id_token.trim().is_empty() {
        return Err(AppError::Validation("id_token is required".to_string()));
    }
    let token = state
        .auth_service
        .login_with_google(body.id_token.trim())
        .await?;

    Ok(timer.finish(token).with_link("me", "/api/v1/auth/me"))
}

/// POST /api/v1/auth/forgot-password - Mail a reset link if the account exists.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordRequest>,
) -> Result<ApiResponse<MessageBody>, AppError> {
    let timer = RequestTimer::start();

    let message = state
        .auth_service
        .request_password_reset(&body.email)
        .await?;

    Ok(timer.finish(MessageBody { message }))
}

/// POST /api/v1/auth/reset-password - Set a new password from a reset link.
pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<ApiResponse<MessageBody>, AppError> {
    let timer = RequestTimer::start();

    state
        .auth_service
        .reset_password(&body.token, &body.email, &body.new_password)
        .await?;

    Ok(timer
        .finish(MessageBody {
            message: "Password updated. You can now log in with the new password.",
        })
        .with_link("login", "/api/v1/auth/login"))
}

/// GET /api/v1/auth/me - Current user profile.
pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<ApiResponse<User>, AppError> {
    let timer = RequestTimer::start();

    let user = state.auth_service.me(&auth.user_id).await?;

    Ok(timer
        .finish(user)
        .with_link("self", "/api/v1/auth/me")
        .with_link("conversations", "/api/v1/conversations"))
}
