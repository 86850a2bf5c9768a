//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use memberchat_types::error::{AssistantError, AuthError, ChatError, RepositoryError};

use crate::http::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Account and sign-in errors.
    Auth(AuthError),
    /// Chat and conversation errors.
    Chat(ChatError),
    /// Missing or malformed credentials on the request itself.
    Unauthorized(String),
    /// Validation error.
    Validation(String),
    /// Generic internal error.
    Internal(String),
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        AppError::Auth(e)
    }
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

type ErrorParts = (StatusCode, &'static str, String, Option<serde_json::Value>);

fn internal(message: String) -> ErrorParts {
    tracing::error!(error = %message, "Request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "Internal server error".to_string(),
        None,
    )
}

fn repository_parts(e: &RepositoryError) -> ErrorParts {
    match e {
        RepositoryError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND", e.to_string(), None),
        RepositoryError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT", e.to_string(), None),
        other => internal(other.to_string()),
    }
}

fn auth_parts(e: &AuthError) -> ErrorParts {
    let simple = |status, code| (status, code, e.to_string(), None);
    match e {
        AuthError::InvalidEmail(_) | AuthError::WeakPassword(_) | AuthError::MissingField(_) => {
            simple(StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
        }
        AuthError::InvalidCredentials => simple(StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
        AuthError::ExternalAccountOnly => simple(StatusCode::UNAUTHORIZED, "EXTERNAL_ACCOUNT_ONLY"),
        AuthError::TokenExpired => simple(StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED"),
        AuthError::SessionExpired => simple(StatusCode::UNAUTHORIZED, "SESSION_EXPIRED"),
        AuthError::ResetLinkExpired => simple(StatusCode::UNAUTHORIZED, "RESET_LINK_EXPIRED"),
        AuthError::InvalidToken => simple(StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
        AuthError::NotRegistered => simple(StatusCode::UNAUTHORIZED, "NOT_REGISTERED"),
        AuthError::EmailNotVerified => simple(StatusCode::UNAUTHORIZED, "EMAIL_NOT_VERIFIED"),
        AuthError::IdentityMismatch => simple(StatusCode::UNAUTHORIZED, "IDENTITY_MISMATCH"),
        AuthError::EmailTaken(_) => simple(StatusCode::CONFLICT, "EMAIL_TAKEN"),
        AuthError::UserNotFound => simple(StatusCode::NOT_FOUND, "USER_NOT_FOUND"),
        AuthError::Provider(_) => simple(StatusCode::BAD_GATEWAY, "IDENTITY_PROVIDER_ERROR"),
        AuthError::Repository(inner) => repository_parts(inner),
        AuthError::Hashing(_) | AuthError::Signing(_) => internal(e.to_string()),
    }
}

fn assistant_parts(e: &AssistantError) -> ErrorParts {
    match e {
        AssistantError::Cancelled => (StatusCode::CONFLICT, "RUN_CANCELLED", e.to_string(), None),
        AssistantError::Timeout { elapsed_secs } => (
            StatusCode::GATEWAY_TIMEOUT,
            "ASSISTANT_TIMEOUT",
            e.to_string(),
            Some(json!({ "elapsed_secs": elapsed_secs })),
        ),
        AssistantError::NotConfigured(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "ASSISTANT_NOT_CONFIGURED",
            "Chat is not available right now".to_string(),
            None,
        ),
        AssistantError::RunFailed { status, .. } => (
            StatusCode::BAD_GATEWAY,
            "ASSISTANT_RUN_FAILED",
            e.to_string(),
            Some(json!({ "run_status": status })),
        ),
        other => {
            tracing::warn!(error = %other, "Assistant API call failed");
            (
                StatusCode::BAD_GATEWAY,
                "ASSISTANT_ERROR",
                "The assistant could not be reached".to_string(),
                None,
            )
        }
    }
}

fn chat_parts(e: &ChatError) -> ErrorParts {
    let simple = |status, code| (status, code, e.to_string(), None);
    match e {
        ChatError::EmptyMessage => simple(StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        ChatError::ConversationNotFound => simple(StatusCode::NOT_FOUND, "CONVERSATION_NOT_FOUND"),
        ChatError::UserNotFound => simple(StatusCode::NOT_FOUND, "USER_NOT_FOUND"),
        ChatError::NotSubscriber => simple(StatusCode::FORBIDDEN, "NOT_SUBSCRIBER"),
        ChatError::RunInFlight => simple(StatusCode::CONFLICT, "RUN_IN_FLIGHT"),
        ChatError::NoRunInFlight => simple(StatusCode::NOT_FOUND, "NO_RUN_IN_FLIGHT"),
        ChatError::Assistant(inner) => assistant_parts(inner),
        ChatError::Repository(inner) => repository_parts(inner),
    }
}

impl AppError {
    /// Status, machine code, message and optional details for the envelope.
    fn parts(&self) -> ErrorParts {
        match self {
            AppError::Auth(e) => auth_parts(e),
            AppError::Chat(e) => chat_parts(e),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone(), None),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone(), None)
            }
            AppError::Internal(msg) => internal(msg.clone()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = self.parts();
        ApiResponse::error(status, code, message, details).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memberchat_types::assistant::RunStatus;

    fn status_and_code(err: impl Into<AppError>) -> (StatusCode, &'static str) {
        let (status, code, _, _) = err.into().parts();
        (status, code)
    }

    #[test]
    fn test_auth_errors() {
        assert_eq!(
            status_and_code(AuthError::WeakPassword(6)),
            (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
        );
        assert_eq!(
            status_and_code(AuthError::EmailTaken("a@b.co".into())),
            (StatusCode::CONFLICT, "EMAIL_TAKEN")
        );
        assert_eq!(
            status_and_code(AuthError::TokenExpired),
            (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED")
        );
        assert_eq!(
            status_and_code(AuthError::SessionExpired),
            (StatusCode::UNAUTHORIZED, "SESSION_EXPIRED")
        );
        assert_eq!(
            status_and_code(AuthError::ResetLinkExpired),
            (StatusCode::UNAUTHORIZED, "RESET_LINK_EXPIRED")
        );
        assert_eq!(
            status_and_code(AuthError::Repository(RepositoryError::Conflict("email".into()))),
            (StatusCode::CONFLICT, "CONFLICT")
        );
        assert_eq!(
            status_and_code(AuthError::Hashing("boom".into())),
            (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
        );
    }

    #[test]
    fn test_chat_errors() {
        assert_eq!(
            status_and_code(ChatError::NotSubscriber),
            (StatusCode::FORBIDDEN, "NOT_SUBSCRIBER")
        );
        assert_eq!(
            status_and_code(ChatError::RunInFlight),
            (StatusCode::CONFLICT, "RUN_IN_FLIGHT")
        );
        assert_eq!(
            status_and_code(ChatError::Assistant(AssistantError::Cancelled)),
            (StatusCode::CONFLICT, "RUN_CANCELLED")
        );
        assert_eq!(
            status_and_code(ChatError::Assistant(AssistantError::Timeout { elapsed_secs: 120 })),
            (StatusCode::GATEWAY_TIMEOUT, "ASSISTANT_TIMEOUT")
        );
        assert_eq!(
            status_and_code(ChatError::Assistant(AssistantError::RateLimited)),
            (StatusCode::BAD_GATEWAY, "ASSISTANT_ERROR")
        );
    }

    #[test]
    fn test_run_failed_details() {
        let err = AppError::from(ChatError::Assistant(AssistantError::RunFailed {
            status: RunStatus::Expired,
            message: "run expired".into(),
        }));
        let (status, _, _, details) = err.parts();
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(details.unwrap()["run_status"], "expired");
    }

    #[test]
    fn test_internal_message_is_hidden() {
        let (_, _, message, _) = AppError::Internal("disk on fire".into()).parts();
        assert_eq!(message, "Internal server error");
    }
}
