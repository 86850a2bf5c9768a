//! Chat service orchestrating conversations and assistant runs.
//!
//! ChatService persists each turn, mirrors the conversation into a remote
//! assistant thread, waits for the run with a bounded poll, and stores the
//! reply. At most one run is awaited per conversation at a time.

use chrono::Utc;
use memberchat_types::chat::{
    ChatReply, Conversation, ConversationDetail, IncomingMessage, Message, Sender,
};
use memberchat_types::error::{ChatError, RepositoryError};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::assistant::client::AssistantClient;
use crate::assistant::poller::{PollPolicy, into_completed, wait_for_run};
use crate::assistant::registry::RunRegistry;
use crate::chat::title::derive_title;
use crate::repository::conversation::ConversationRepository;
use crate::repository::user::UserRepository;

/// How many recent thread messages are scanned for the reply.
const REPLY_SCAN_LIMIT: u32 = 20;

/// Orchestrates chat turns against a hosted assistant.
///
/// Generic over its repositories and the assistant client so
/// memberchat-core never depends on memberchat-infra.
pub struct ChatService<C, U, A>
where
    C: ConversationRepository,
    U: UserRepository,
    A: AssistantClient,
{
    conversations: C,
    users: U,
    assistant: A,
    runs: RunRegistry,
    poll: PollPolicy,
}

impl<C, U, A> ChatService<C, U, A>
where
    C: ConversationRepository,
    U: UserRepository,
    A: AssistantClient,
{
    pub fn new(conversations: C, users: U, assistant: A, poll: PollPolicy) -> Self {
        Self {
            conversations,
            users,
            assistant,
            runs: RunRegistry::new(),
            poll,
        }
    }

    /// Access the conversation repository.
    pub fn conversations(&self) -> &C {
        &self.conversations
    }

    /// Registry of in-flight runs.
    pub fn runs(&self) -> &RunRegistry {
        &self.runs
    }

    // --- Chat turn ---

    /// Send the last of `messages` and return the assistant's reply.
    ///
    /// Without `conversation_id` a new conversation is created, titled
    /// from the first supplied message.
    pub async fn send(
        &self,
        user_id: &Uuid,
        messages: &[IncomingMessage],
        conversation_id: Option<Uuid>,
    ) -> Result<ChatReply, ChatError> {
        let text = messages
            .last()
            .map(|m| m.text.trim())
            .filter(|t| !t.is_empty())
            .ok_or(ChatError::EmptyMessage)?
            .to_string();

        let user = self
            .users
            .get_user(user_id)
            .await?
            .ok_or(ChatError::UserNotFound)?;
        if !user.is_subscriber {
            debug!(user_id = %user_id, "Chat rejected: not a subscriber");
            return Err(ChatError::NotSubscriber);
        }

        let mut conversation = match conversation_id {
            Some(id) => self.owned_conversation(user_id, &id).await?,
            None => self.start_conversation(user_id, &messages[0].text).await?,
        };

        let guard = self
            .runs
            .try_begin(conversation.id)
            .ok_or(ChatError::RunInFlight)?;

        self.append(&conversation.id, Sender::User, text.clone())
            .await?;

        let thread_id = match conversation.thread_id.clone() {
            Some(thread_id) => {
                self.assistant
                    .add_message(&thread_id, Sender::User, &text)
                    .await?;
                thread_id
            }
            None => {
                let thread_id = self.open_thread(&conversation.id).await?;
                conversation.thread_id = Some(thread_id.clone());
                thread_id
            }
        };

        let run = self.assistant.create_run(&thread_id).await?;
        info!(
            conversation_id = %conversation.id,
            thread_id = %thread_id,
            run_id = %run.id,
            "Assistant run started"
        );

        let run = wait_for_run(&self.assistant, run, &self.poll, guard.token()).await;
        let run = match run.and_then(into_completed) {
            Ok(run) => run,
            Err(e) => {
                warn!(conversation_id = %conversation.id, error = %e, "Assistant run did not complete");
                return Err(e.into());
            }
        };

        let response = self
            .assistant
            .list_messages(&thread_id, REPLY_SCAN_LIMIT)
            .await?
            .into_iter()
            .find(|m| m.role == Sender::Assistant && m.run_id.as_deref() == Some(run.id.as_str()))
            .and_then(|m| m.text)
            .unwrap_or_default();

        if response.trim().is_empty() {
            warn!(conversation_id = %conversation.id, run_id = %run.id, "Run completed without a text reply");
        } else {
            self.append(&conversation.id, Sender::Assistant, response.clone())
                .await?;
        }

        drop(guard);
        info!(conversation_id = %conversation.id, run_id = %run.id, "Chat turn completed");

        Ok(ChatReply {
            response,
            conversation_id: conversation.id,
        })
    }

    async fn start_conversation(
        &self,
        user_id: &Uuid,
        first_message: &str,
    ) -> Result<Conversation, ChatError> {
        let now = Utc::now();
        let conversation = Conversation {
            id: Uuid::now_v7(),
            user_id: *user_id,
            title: derive_title(first_message),
            thread_id: None,
            created_at: now,
            updated_at: now,
        };
        let conversation = self
            .conversations
            .create_conversation(&conversation)
            .await?;
        info!(conversation_id = %conversation.id, user_id = %user_id, "Conversation created");
        Ok(conversation)
    }

    /// Create a remote thread and replay the stored conversation into it.
    async fn open_thread(&self, conversation_id: &Uuid) -> Result<String, ChatError> {
        let thread_id = self.assistant.create_thread().await?;
        let history = self.conversations.get_messages(conversation_id).await?;
        for message in &history {
            self.assistant
                .add_message(&thread_id, message.sender, &message.text)
                .await?;
        }
        self.conversations
            .set_thread_id(conversation_id, &thread_id)
            .await?;
        debug!(
            conversation_id = %conversation_id,
            thread_id = %thread_id,
            replayed = history.len(),
            "Assistant thread opened"
        );
        Ok(thread_id)
    }

    async fn append(
        &self,
        conversation_id: &Uuid,
        sender: Sender,
        text: String,
    ) -> Result<(), ChatError> {
        let message = Message {
            id: Uuid::now_v7(),
            conversation_id: *conversation_id,
            sender,
            text,
            created_at: Utc::now(),
        };
        self.conversations.append_message(&message).await?;
        Ok(())
    }

    // --- Conversations ---

    /// A user's conversations, most recently active first.
    pub async fn list_conversations(
        &self,
        user_id: &Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Conversation>, ChatError> {
        Ok(self
            .conversations
            .list_conversations(user_id, limit, offset)
            .await?)
    }

    /// A conversation with its messages in chronological order.
    pub async fn get_conversation(
        &self,
        user_id: &Uuid,
        id: &Uuid,
    ) -> Result<ConversationDetail, ChatError> {
        let conversation = self.owned_conversation(user_id, id).await?;
        let messages = self.conversations.get_messages(id).await?;
        Ok(ConversationDetail {
            conversation,
            messages,
        })
    }

    /// Delete a conversation and its messages, stopping any in-flight run.
    pub async fn delete_conversation(&self, user_id: &Uuid, id: &Uuid) -> Result<(), ChatError> {
        self.owned_conversation(user_id, id).await?;
        if self.runs.cancel(id) {
            debug!(conversation_id = %id, "Cancelled in-flight run before delete");
        }
        self.conversations
            .delete_conversation(id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => ChatError::ConversationNotFound,
                other => other.into(),
            })?;
        info!(conversation_id = %id, "Conversation deleted");
        Ok(())
    }

    /// Stop waiting for the conversation's in-flight run.
    pub async fn cancel_run(&self, user_id: &Uuid, id: &Uuid) -> Result<(), ChatError> {
        self.owned_conversation(user_id, id).await?;
        if !self.runs.cancel(id) {
            return Err(ChatError::NoRunInFlight);
        }
        info!(conversation_id = %id, "Run cancellation requested");
        Ok(())
    }

    /// Load a conversation, hiding other users' conversations as not found.
    async fn owned_conversation(&self, user_id: &Uuid, id: &Uuid) -> Result<Conversation, ChatError> {
        match self.conversations.get_conversation(id).await? {
            Some(conversation) if conversation.user_id == *user_id => Ok(conversation),
            _ => Err(ChatError::ConversationNotFound),
        }
    }
}
