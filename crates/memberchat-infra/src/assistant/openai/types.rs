//! Wire types for the OpenAI Assistants v2 API.

use memberchat_types::assistant::{Run, RunFailure, RunStatus, ThreadMessage};
use memberchat_types::chat::Sender;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct CreateMessageRequest<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

impl<'a> CreateMessageRequest<'a> {
    pub fn new(sender: Sender, content: &'a str) -> Self {
        let role = match sender {
            Sender::User => "user",
            Sender::Assistant => "assistant",
        };
        Self { role, content }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateRunRequest<'a> {
    pub assistant_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ThreadObject {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct RunError {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct RunObject {
    pub id: String,
    pub thread_id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub last_error: Option<RunError>,
}

impl From<RunObject> for Run {
    fn from(run: RunObject) -> Self {
        Run {
            id: run.id,
            thread_id: run.thread_id,
            status: run.status,
            last_error: run.last_error.map(|e| RunFailure {
                code: e.code,
                message: e.message,
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TextValue {
    pub value: String,
}

/// Content blocks; only text is read back.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: TextValue },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub struct MessageObject {
    pub id: String,
    pub role: String,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub run_id: Option<String>,
    pub created_at: i64,
}

impl MessageObject {
    /// Convert to the domain message; `None` for roles other than user/assistant.
    pub fn into_thread_message(self) -> Option<ThreadMessage> {
        let role: Sender = self.role.parse().ok()?;
        let text = self.content.into_iter().find_map(|block| match block {
            ContentBlock::Text { text } => Some(text.value),
            ContentBlock::Other => None,
        });
        Some(ThreadMessage {
            id: self.id,
            role,
            text,
            run_id: self.run_id,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct MessageList {
    pub data: Vec<MessageObject>,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorDetail,
}
