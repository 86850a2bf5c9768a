//! In-memory fakes for the core ports, shared by the service tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use memberchat_types::assistant::{Run, RunStatus, ThreadMessage};
use memberchat_types::auth::{ExternalIdentity, ResetClaims, SessionClaims};
use memberchat_types::chat::{Conversation, Message, Sender};
use memberchat_types::error::{AssistantError, AuthError, MailError, RepositoryError};
use memberchat_types::mail::OutgoingMail;
use memberchat_types::user::User;
use uuid::Uuid;

use crate::assistant::client::AssistantClient;
use crate::auth::ports::{IdentityVerifier, PasswordHasher, TokenSigner};
use crate::mail::Mailer;
use crate::repository::conversation::ConversationRepository;
use crate::repository::user::UserRepository;

// ---------------------------------------------------------------------------
// Repositories
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct InMemoryUserRepository {
    users: Arc<Mutex<Vec<User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserRepository for InMemoryUserRepository {
    async fn create_user(&self, user: &User) -> Result<User, RepositoryError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict(user.email.clone()));
        }
        users.push(user.clone());
        Ok(user.clone())
    }

    async fn get_user(&self, id: &Uuid) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == *id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update_user(&self, user: &User) -> Result<(), RepositoryError> {
        let mut users = self.users.lock().unwrap();
        if user.external_id.is_some()
            && users
                .iter()
                .any(|u| u.id != user.id && u.external_id == user.external_id)
        {
            return Err(RepositoryError::Conflict("external identity already linked".to_string()));
        }
        let slot = users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = user.clone();
        Ok(())
    }

    async fn list_users(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<User>, RepositoryError> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .skip(offset.unwrap_or(0) as usize)
            .take(limit.unwrap_or(i64::MAX) as usize)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
struct ConversationStore {
    conversations: Vec<Conversation>,
    messages: Vec<Message>,
}

#[derive(Clone, Default)]
pub struct InMemoryConversationRepository {
    store: Arc<Mutex<ConversationStore>>,
}

impl InMemoryConversationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConversationRepository for InMemoryConversationRepository {
    async fn create_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<Conversation, RepositoryError> {
        self.store
            .lock()
            .unwrap()
            .conversations
            .push(conversation.clone());
        Ok(conversation.clone())
    }

    async fn get_conversation(&self, id: &Uuid) -> Result<Option<Conversation>, RepositoryError> {
        Ok(self
            .store
            .lock()
            .unwrap()
            .conversations
            .iter()
            .find(|c| c.id == *id)
            .cloned())
    }

    async fn list_conversations(
        &self,
        user_id: &Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Conversation>, RepositoryError> {
        let store = self.store.lock().unwrap();
        let mut owned: Vec<Conversation> = store
            .conversations
            .iter()
            .filter(|c| c.user_id == *user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        Ok(owned
            .into_iter()
            .skip(offset.unwrap_or(0) as usize)
            .take(limit.unwrap_or(i64::MAX) as usize)
            .collect())
    }

    async fn set_thread_id(&self, id: &Uuid, thread_id: &str) -> Result<(), RepositoryError> {
        let mut store = self.store.lock().unwrap();
        let conversation = store
            .conversations
            .iter_mut()
            .find(|c| c.id == *id)
            .ok_or(RepositoryError::NotFound)?;
        conversation.thread_id = Some(thread_id.to_string());
        Ok(())
    }

    async fn delete_conversation(&self, id: &Uuid) -> Result<(), RepositoryError> {
        let mut store = self.store.lock().unwrap();
        let before = store.conversations.len();
        store.conversations.retain(|c| c.id != *id);
        if store.conversations.len() == before {
            return Err(RepositoryError::NotFound);
        }
        store.messages.retain(|m| m.conversation_id != *id);
        Ok(())
    }

    async fn append_message(&self, message: &Message) -> Result<(), RepositoryError> {
        let mut store = self.store.lock().unwrap();
        let conversation = store
            .conversations
            .iter_mut()
            .find(|c| c.id == message.conversation_id)
            .ok_or(RepositoryError::NotFound)?;
        conversation.updated_at = message.created_at;
        store.messages.push(message.clone());
        Ok(())
    }

    async fn get_messages(&self, conversation_id: &Uuid) -> Result<Vec<Message>, RepositoryError> {
        Ok(self
            .store
            .lock()
            .unwrap()
            .messages
            .iter()
            .filter(|m| m.conversation_id == *conversation_id)
            .cloned()
            .collect())
    }

    async fn count_messages(&self, conversation_id: &Uuid) -> Result<u32, RepositoryError> {
        Ok(self
            .store
            .lock()
            .unwrap()
            .messages
            .iter()
            .filter(|m| m.conversation_id == *conversation_id)
            .count() as u32)
    }
}

// ---------------------------------------------------------------------------
// Assistant
// ---------------------------------------------------------------------------

#[derive(Default)]
struct AssistantState {
    statuses: VecDeque<RunStatus>,
    fail_get_run: bool,
    reply: Option<String>,
    threads: HashMap<String, Vec<ThreadMessage>>,
    created_threads: usize,
    created_runs: usize,
    get_run_calls: usize,
    cancel_calls: usize,
    counter: usize,
}

/// Scriptable assistant. `get_run` consumes one scripted status per call
/// and reports `Completed` once the script is exhausted.
#[derive(Clone)]
pub struct FakeAssistant {
    state: Arc<Mutex<AssistantState>>,
}

impl FakeAssistant {
    pub fn new() -> Self {
        let state = AssistantState {
            reply: Some("Hello from the assistant".to_string()),
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn script_statuses(&self, statuses: &[RunStatus]) {
        self.state.lock().unwrap().statuses.extend(statuses.iter().copied());
    }

    pub fn fail_get_run(&self) {
        self.state.lock().unwrap().fail_get_run = true;
    }

    /// Text of the assistant message each run produces; `None` for no message.
    pub fn set_reply(&self, reply: Option<&str>) {
        self.state.lock().unwrap().reply = reply.map(str::to_string);
    }

    /// Put a message on a thread as if another run had produced it.
    pub fn push_thread_message(&self, thread_id: &str, message: ThreadMessage) {
        self.state
            .lock()
            .unwrap()
            .threads
            .entry(thread_id.to_string())
            .or_default()
            .push(message);
    }

    /// (role, text) of every message on a thread, oldest first.
    pub fn thread_messages(&self, thread_id: &str) -> Vec<(Sender, String)> {
        self.state
            .lock()
            .unwrap()
            .threads
            .get(thread_id)
            .map(|messages| {
                messages
                    .iter()
                    .map(|m| (m.role, m.text.clone().unwrap_or_default()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn created_threads(&self) -> usize {
        self.state.lock().unwrap().created_threads
    }

    pub fn created_runs(&self) -> usize {
        self.state.lock().unwrap().created_runs
    }

    pub fn get_run_calls(&self) -> usize {
        self.state.lock().unwrap().get_run_calls
    }

    pub fn cancel_calls(&self) -> usize {
        self.state.lock().unwrap().cancel_calls
    }
}

impl AssistantState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.counter += 1;
        format!("{prefix}_{}", self.counter)
    }

    fn push(&mut self, thread_id: &str, role: Sender, text: Option<String>, run_id: Option<String>) {
        let id = self.next_id("msg");
        let created_at = self.counter as i64;
        self.threads
            .entry(thread_id.to_string())
            .or_default()
            .push(ThreadMessage {
                id,
                role,
                text,
                run_id,
                created_at,
            });
    }
}

impl AssistantClient for FakeAssistant {
    async fn create_thread(&self) -> Result<String, AssistantError> {
        let mut state = self.state.lock().unwrap();
        state.created_threads += 1;
        let id = state.next_id("thread");
        state.threads.insert(id.clone(), Vec::new());
        Ok(id)
    }

    async fn add_message(
        &self,
        thread_id: &str,
        sender: Sender,
        text: &str,
    ) -> Result<(), AssistantError> {
        let mut state = self.state.lock().unwrap();
        if !state.threads.contains_key(thread_id) {
            return Err(AssistantError::Api {
                status: 404,
                message: format!("No thread found with id '{thread_id}'."),
            });
        }
        state.push(thread_id, sender, Some(text.to_string()), None);
        Ok(())
    }

    async fn create_run(&self, thread_id: &str) -> Result<Run, AssistantError> {
        let mut state = self.state.lock().unwrap();
        state.created_runs += 1;
        let run_id = state.next_id("run");
        if let Some(reply) = state.reply.clone() {
            state.push(thread_id, Sender::Assistant, Some(reply), Some(run_id.clone()));
        }
        Ok(Run {
            id: run_id,
            thread_id: thread_id.to_string(),
            status: RunStatus::Queued,
            last_error: None,
        })
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run, AssistantError> {
        let mut state = self.state.lock().unwrap();
        state.get_run_calls += 1;
        if state.fail_get_run {
            return Err(AssistantError::Http("connection reset".to_string()));
        }
        let status = state.statuses.pop_front().unwrap_or(RunStatus::Completed);
        Ok(Run {
            id: run_id.to_string(),
            thread_id: thread_id.to_string(),
            status,
            last_error: None,
        })
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run, AssistantError> {
        let mut state = self.state.lock().unwrap();
        state.cancel_calls += 1;
        Ok(Run {
            id: run_id.to_string(),
            thread_id: thread_id.to_string(),
            status: RunStatus::Cancelling,
            last_error: None,
        })
    }

    async fn list_messages(
        &self,
        thread_id: &str,
        limit: u32,
    ) -> Result<Vec<ThreadMessage>, AssistantError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .threads
            .get(thread_id)
            .map(|messages| {
                messages
                    .iter()
                    .rev()
                    .take(limit as usize)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Auth collaborators
// ---------------------------------------------------------------------------

/// Reversible "hash" so tests can assert on stored values.
pub struct FakeHasher;

impl PasswordHasher for FakeHasher {
    fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        Ok(format!("hashed:{password}"))
    }

    fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        Ok(hash == format!("hashed:{password}"))
    }
}

#[derive(Default)]
struct SignerState {
    sessions: HashMap<String, SessionClaims>,
    resets: HashMap<String, ResetClaims>,
    issued: usize,
}

/// Opaque tokens backed by a lookup table.
#[derive(Clone, Default)]
pub struct FakeSigner {
    state: Arc<Mutex<SignerState>>,
}

impl FakeSigner {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenSigner for FakeSigner {
    fn sign_session(&self, claims: &SessionClaims) -> Result<String, AuthError> {
        let mut state = self.state.lock().unwrap();
        state.issued += 1;
        let token = format!("session-{}", state.issued);
        state.sessions.insert(token.clone(), claims.clone());
        Ok(token)
    }

    fn verify_session(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let claims = self
            .state
            .lock()
            .unwrap()
            .sessions
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)?;
        if claims.exp <= Utc::now().timestamp() {
            return Err(AuthError::TokenExpired);
        }
        Ok(claims)
    }

    fn sign_reset(&self, claims: &ResetClaims) -> Result<String, AuthError> {
        let mut state = self.state.lock().unwrap();
        state.issued += 1;
        let token = format!("reset-{}", state.issued);
        state.resets.insert(token.clone(), claims.clone());
        Ok(token)
    }

    fn verify_reset(&self, token: &str) -> Result<ResetClaims, AuthError> {
        let claims = self
            .state
            .lock()
            .unwrap()
            .resets
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)?;
        if claims.exp <= Utc::now().timestamp() {
            return Err(AuthError::TokenExpired);
        }
        Ok(claims)
    }

    fn password_fingerprint(&self, password_hash: &str) -> String {
        format!("fp:{password_hash}")
    }
}

/// Identity verifier that accepts any token once an identity is set.
#[derive(Clone, Default)]
pub struct FakeIdentity {
    identity: Arc<Mutex<Option<ExternalIdentity>>>,
}

impl FakeIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept(&self, identity: ExternalIdentity) {
        *self.identity.lock().unwrap() = Some(identity);
    }
}

impl IdentityVerifier for FakeIdentity {
    async fn verify(&self, _id_token: &str) -> Result<ExternalIdentity, AuthError> {
        self.identity
            .lock()
            .unwrap()
            .clone()
            .ok_or(AuthError::InvalidToken)
    }
}

// ---------------------------------------------------------------------------
// Mail
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MailboxState {
    sent: Vec<OutgoingMail>,
    fail_next: bool,
}

#[derive(Clone, Default)]
pub struct RecordingMailer {
    state: Arc<Mutex<MailboxState>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn fail_next(&self) {
        self.state.lock().unwrap().fail_next = true;
    }
}

impl Mailer for RecordingMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        let mut state = self.state.lock().unwrap();
        if std::mem::take(&mut state.fail_next) {
            return Err(MailError::Transport("connection refused".to_string()));
        }
        state.sent.push(mail.clone());
        Ok(())
    }
}
