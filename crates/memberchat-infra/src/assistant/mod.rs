//! Hosted assistant clients.
//!
//! `AssistantBackend` is what the application wires into the chat service:
//! the OpenAI client when a key and assistant id are configured, otherwise a
//! placeholder that fails every call with `NotConfigured`. Conversation
//! history stays readable either way.

pub mod openai;

use std::time::Duration;

use memberchat_core::assistant::client::AssistantClient;
use memberchat_types::assistant::{Run, ThreadMessage};
use memberchat_types::chat::Sender;
use memberchat_types::config::AssistantConfig;
use memberchat_types::error::AssistantError;
use secrecy::SecretString;

pub use openai::OpenAiAssistantClient;

/// The configured assistant.
pub enum AssistantBackend {
    OpenAi(OpenAiAssistantClient),
    Unconfigured(String),
}

impl AssistantBackend {
    /// Build the backend from config and the API key, if any.
    pub fn from_config(config: &AssistantConfig, api_key: Option<SecretString>) -> Self {
        let Some(api_key) = api_key else {
            return Self::Unconfigured("OPENAI_API_KEY is not set".to_string());
        };
        let Some(assistant_id) = config.assistant_id.clone() else {
            return Self::Unconfigured("ASSISTANT_ID is not set".to_string());
        };

        match OpenAiAssistantClient::new(
            api_key,
            assistant_id,
            &config.base_url,
            Duration::from_secs(config.request_timeout_secs),
        ) {
            Ok(client) => Self::OpenAi(client),
            Err(AssistantError::NotConfigured(reason)) => Self::Unconfigured(reason),
            Err(e) => Self::Unconfigured(e.to_string()),
        }
    }

    fn unconfigured(reason: &str) -> AssistantError {
        AssistantError::NotConfigured(reason.to_string())
    }
}

impl AssistantClient for AssistantBackend {
    async fn create_thread(&self) -> Result<String, AssistantError> {
        match self {
            Self::OpenAi(client) => client.create_thread().await,
            Self::Unconfigured(reason) => Err(Self::unconfigured(reason)),
        }
    }

    async fn add_message(
        &self,
        thread_id: &str,
        sender: Sender,
        text: &str,
    ) -> Result<(), AssistantError> {
        match self {
            Self::OpenAi(client) => client.add_message(thread_id, sender, text).await,
            Self::Unconfigured(reason) => Err(Self::unconfigured(reason)),
        }
    }

    async fn create_run(&self, thread_id: &str) -> Result<Run, AssistantError> {
        match self {
            Self::OpenAi(client) => client.create_run(thread_id).await,
            Self::Unconfigured(reason) => Err(Self::unconfigured(reason)),
        }
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run, AssistantError> {
        match self {
            Self::OpenAi(client) => client.get_run(thread_id, run_id).await,
            Self::Unconfigured(reason) => Err(Self::unconfigured(reason)),
        }
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run, AssistantError> {
        match self {
            Self::OpenAi(client) => client.cancel_run(thread_id, run_id).await,
            Self::Unconfigured(reason) => Err(Self::unconfigured(reason)),
        }
    }

    async fn list_messages(
        &self,
        thread_id: &str,
        limit: u32,
    ) -> Result<Vec<ThreadMessage>, AssistantError> {
        match self {
            Self::OpenAi(client) => client.list_messages(thread_id, limit).await,
            Self::Unconfigured(reason) => Err(Self::unconfigured(reason)),
        }
    }
}
