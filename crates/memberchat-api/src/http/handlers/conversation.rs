//! Conversation handlers.
//!
//! Endpoints:
//! - GET    /api/v1/conversations             - List the caller's conversations
//! - GET    /api/v1/conversations/{id}        - Conversation with its messages
//! - DELETE /api/v1/conversations/{id}        - Delete a conversation
//! - POST   /api/v1/conversations/{id}/cancel - Cancel the in-flight reply

use axum::extract::{Path, Query, State};
use serde::Serialize;
use uuid::Uuid;

use memberchat_types::chat::{Conversation, ConversationDetail};

use crate::http::error::AppError;
use crate::http::extractors::auth::AuthUser;
use crate::http::extractors::query::PageQuery;
use crate::http::response::{ApiResponse, RequestTimer};
use crate::state::AppState;

/// Acknowledgement for delete and cancel.
#[derive(Debug, Serialize)]
pub struct ConversationAck {
    pub id: Uuid,
    pub deleted: bool,
    pub cancelled: bool,
}

/// Parse a UUID from a path parameter, returning a 400 error on invalid format.
fn parse_uuid(s: &str) -> Result<Uuid, AppError> {
    s.parse::<Uuid>()
        .map_err(|_| AppError::Validation(format!("Invalid UUID: {s}")))
}

/// GET /api/v1/conversations - List conversations, most recently active first.
pub async fn list_conversations(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<PageQuery>,
) -> Result<ApiResponse<Vec<Conversation>>, AppError> {
    let timer = RequestTimer::start();
    let (limit, offset) = query.resolve()?;

    let conversations = state
        .chat_service
        .list_conversations(&auth.user_id, Some(limit), Some(offset))
        .await?;

    Ok(timer
        .finish(conversations)
        .with_link("self", "/api/v1/conversations"))
}

/// GET /api/v1/conversations/{id} - Conversation with messages in order.
pub async fn get_conversation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<ConversationDetail>, AppError> {
    let timer = RequestTimer::start();
    let id = parse_uuid(&id)?;

    let detail = state
        .chat_service
        .get_conversation(&auth.user_id, &id)
        .await?;

    Ok(timer
        .finish(detail)
        .with_link("self", &format!("/api/v1/conversations/{id}"))
        .with_link("chat", "/api/v1/chat"))
}

/// DELETE /api/v1/conversations/{id} - Delete a conversation and its messages.
pub async fn delete_conversation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<ConversationAck>, AppError> {
    let timer = RequestTimer::start();
    let id = parse_uuid(&id)?;

    state
        .chat_service
        .delete_conversation(&auth.user_id, &id)
        .await?;

    Ok(timer.finish(ConversationAck {
        id,
        deleted: true,
        cancelled: false,
    }))
}

/// POST /api/v1/conversations/{id}/cancel - Stop waiting for the reply.
pub async fn cancel_run(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<ConversationAck>, AppError> {
    let timer = RequestTimer::start();
    let id = parse_uuid(&id)?;

    state.chat_service.cancel_run(&auth.user_id, &id).await?;

    Ok(timer
        .finish(ConversationAck {
            id,
            deleted: false,
            cancelled: true,
        })
        .with_link("conversation", &format!("/api/v1/conversations/{id}")))
}
