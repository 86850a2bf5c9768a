use thiserror::Error;

use crate::assistant::RunStatus;

/// Errors from repository operations (used by trait definitions in memberchat-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors related to accounts, sign-in and password reset.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account uses Google sign-in; no password is set")]
    ExternalAccountOnly,

    #[error("invalid email: '{0}'")]
    InvalidEmail(String),

    #[error("password must be at least {0} characters")]
    WeakPassword(usize),

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("email '{0}' is already registered")]
    EmailTaken(String),

    #[error("token expired")]
    TokenExpired,

    #[error("session expired")]
    SessionExpired,

    #[error("reset link expired")]
    ResetLinkExpired,

    #[error("invalid token")]
    InvalidToken,

    #[error("email is not registered as a subscriber")]
    NotRegistered,

    #[error("email not verified by identity provider")]
    EmailNotVerified,

    #[error("account is linked to a different external identity")]
    IdentityMismatch,

    #[error("identity provider unavailable: {0}")]
    Provider(String),

    #[error("user not found")]
    UserNotFound,

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("token signing failed: {0}")]
    Signing(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Errors from the remote assistant API.
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("assistant is not configured: {0}")]
    NotConfigured(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("assistant API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("assistant API authentication failed")]
    AuthenticationFailed,

    #[error("assistant API rate limited")]
    RateLimited,

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("run ended with status {status}: {message}")]
    RunFailed { status: RunStatus, message: String },

    #[error("run did not finish within {elapsed_secs}s")]
    Timeout { elapsed_secs: u64 },

    #[error("run was cancelled")]
    Cancelled,
}

/// Errors from the chat orchestrator.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("message text must not be empty")]
    EmptyMessage,

    #[error("conversation not found")]
    ConversationNotFound,

    #[error("user not found")]
    UserNotFound,

    #[error("chat is available to subscribers only")]
    NotSubscriber,

    #[error("a reply is already being generated for this conversation")]
    RunInFlight,

    #[error("no reply is being generated for this conversation")]
    NoRunInFlight,

    #[error(transparent)]
    Assistant(#[from] AssistantError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Errors from mail delivery.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid address: {0}")]
    Address(String),

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("transport error: {0}")]
    Transport(String),
}
