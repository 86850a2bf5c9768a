//! AssistantClient trait definition.
//!
//! The hosted assistant processes a *thread* of messages in a *run*. The
//! orchestrator creates or reuses a thread, posts messages, starts a run,
//! polls it, and reads the reply back.

use memberchat_types::assistant::{Run, ThreadMessage};
use memberchat_types::chat::Sender;
use memberchat_types::error::AssistantError;

/// Port to a hosted assistant API.
///
/// Implementations live in memberchat-infra (e.g., `OpenAiAssistantClient`).
pub trait AssistantClient: Send + Sync {
    /// Create an empty thread and return its id.
    fn create_thread(
        &self,
    ) -> impl std::future::Future<Output = Result<String, AssistantError>> + Send;

    /// Append a message to a thread.
    fn add_message(
        &self,
        thread_id: &str,
        sender: Sender,
        text: &str,
    ) -> impl std::future::Future<Output = Result<(), AssistantError>> + Send;

    /// Start a run of the configured assistant on a thread.
    fn create_run(
        &self,
        thread_id: &str,
    ) -> impl std::future::Future<Output = Result<Run, AssistantError>> + Send;

    /// Fetch the current state of a run.
    fn get_run(
        &self,
        thread_id: &str,
        run_id: &str,
    ) -> impl std::future::Future<Output = Result<Run, AssistantError>> + Send;

    /// Ask the remote side to cancel a run.
    fn cancel_run(
        &self,
        thread_id: &str,
        run_id: &str,
    ) -> impl std::future::Future<Output = Result<Run, AssistantError>> + Send;

    /// Most recent messages of a thread, newest first.
    fn list_messages(
        &self,
        thread_id: &str,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<ThreadMessage>, AssistantError>> + Send;
}
