//! Chat turn handler.
//!
//! Endpoint:
//! - POST /api/v1/chat - Send a message and wait for the assistant's reply
//!
//! The request is held open while the assistant run is polled. The turn
//! runs on its own task, so a client disconnect does not abandon the remote
//! run: it still completes (or times out and is cancelled) and the reply is
//! stored in the conversation.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use uuid::Uuid;

use memberchat_types::chat::{ChatReply, IncomingMessage};

use crate::http::error::AppError;
use crate::http::extractors::auth::AuthUser;
use crate::http::response::{ApiResponse, RequestTimer};
use crate::state::AppState;

/// Request body for a chat turn.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Messages as shown in the client; only the last one is new.
    #[serde(default)]
    pub messages: Vec<IncomingMessage>,
    /// Existing conversation to continue; omitted to start a new one.
    #[serde(default, alias = "conversationId")]
    pub conversation_id: Option<Uuid>,
}

/// POST /api/v1/chat - Send a chat turn.
pub async fn send_message(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<ChatRequest>,
) -> Result<ApiResponse<ChatReply>, AppError> {
    let timer = RequestTimer::start();

    let chat = Arc::clone(&state.chat_service);
    let user_id = auth.user_id;
    let turn = tokio::spawn(async move {
        chat.send(&user_id, &body.messages, body.conversation_id).await
    });
    let reply = turn
        .await
        .map_err(|e| AppError::Internal(format!("chat turn task failed: {e}")))??;

    let href = format!("/api/v1/conversations/{}", reply.conversation_id);
    Ok(timer.finish(reply).with_link("conversation", &href))
}
