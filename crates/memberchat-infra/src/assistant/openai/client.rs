//! OpenAiAssistantClient -- concrete [`AssistantClient`] for OpenAI Assistants v2.
//!
//! Threads, messages and runs are plain REST calls authenticated with a
//! bearer key and the `OpenAI-Beta: assistants=v2` header.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is never logged
//! or included in `Debug` output.

use std::time::Duration;

use memberchat_core::assistant::client::AssistantClient;
use memberchat_types::assistant::{Run, ThreadMessage};
use memberchat_types::chat::Sender;
use memberchat_types::error::AssistantError;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{Instrument, debug, info_span};

use super::types::{
    ApiErrorBody, CreateMessageRequest, CreateRunRequest, MessageList, RunObject, ThreadObject,
};

/// OpenAI Assistants API client bound to one assistant.
pub struct OpenAiAssistantClient {
    client: reqwest::Client,
    api_key: SecretString,
    assistant_id: String,
    base_url: String,
}

impl OpenAiAssistantClient {
    const BETA_HEADER: &'static str = "assistants=v2";

    /// Create a client for `assistant_id`.
    ///
    /// `base_url` is the API origin, e.g. `https://api.openai.com`.
    pub fn new(
        api_key: SecretString,
        assistant_id: String,
        base_url: &str,
        request_timeout: Duration,
    ) -> Result<Self, AssistantError> {
        if api_key.expose_secret().trim().is_empty() {
            return Err(AssistantError::NotConfigured("OPENAI_API_KEY is empty".to_string()));
        }
        if assistant_id.trim().is_empty() {
            return Err(AssistantError::NotConfigured("ASSISTANT_ID is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| AssistantError::Http(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            assistant_id,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1{}", self.base_url, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.url(path))
            .bearer_auth(self.api_key.expose_secret())
            .header("OpenAI-Beta", Self::BETA_HEADER)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T, AssistantError> {
        let response = builder
            .send()
            .await
            .map_err(|e| AssistantError::Http(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            return Err(match status.as_u16() {
                401 => AssistantError::AuthenticationFailed,
                429 => AssistantError::RateLimited,
                code => AssistantError::Api {
                    status: code,
                    message,
                },
            });
        }

        response
            .json()
            .await
            .map_err(|e| AssistantError::Deserialization(format!("failed to parse response: {e}")))
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, AssistantError> {
        self.send(self.request(reqwest::Method::POST, path).json(body))
            .await
    }
}

// OpenAiAssistantClient does not derive Debug; it holds the API key.
impl AssistantClient for OpenAiAssistantClient {
    async fn create_thread(&self) -> Result<String, AssistantError> {
        let thread: ThreadObject = self.post("/threads", &serde_json::json!({})).await?;
        debug!(thread_id = %thread.id, "Created assistant thread");
        Ok(thread.id)
    }

    async fn add_message(
        &self,
        thread_id: &str,
        sender: Sender,
        text: &str,
    ) -> Result<(), AssistantError> {
        let _: serde_json::Value = self
            .post(
                &format!("/threads/{thread_id}/messages"),
                &CreateMessageRequest::new(sender, text),
            )
            .await?;
        Ok(())
    }

    async fn create_run(&self, thread_id: &str) -> Result<Run, AssistantError> {
        let span = info_span!(
            "gen_ai.invoke_agent",
            gen_ai.operation.name = "invoke_agent",
            gen_ai.provider.name = "openai",
            gen_ai.agent.id = %self.assistant_id,
            gen_ai.response.id = tracing::field::Empty,
        );
        let run: RunObject = self
            .post(
                &format!("/threads/{thread_id}/runs"),
                &CreateRunRequest {
                    assistant_id: &self.assistant_id,
                },
            )
            .instrument(span.clone())
            .await?;
        span.record("gen_ai.response.id", run.id.as_str());
        Ok(run.into())
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run, AssistantError> {
        let run: RunObject = self
            .send(self.request(
                reqwest::Method::GET,
                &format!("/threads/{thread_id}/runs/{run_id}"),
            ))
            .await?;
        Ok(run.into())
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run, AssistantError> {
        let run: RunObject = self
            .post(
                &format!("/threads/{thread_id}/runs/{run_id}/cancel"),
                &serde_json::json!({}),
            )
            .await?;
        Ok(run.into())
    }

    async fn list_messages(
        &self,
        thread_id: &str,
        limit: u32,
    ) -> Result<Vec<ThreadMessage>, AssistantError> {
        let list: MessageList = self
            .send(
                self.request(reqwest::Method::GET, &format!("/threads/{thread_id}/messages"))
                    .query(&[("order", "desc".to_string()), ("limit", limit.to_string())]),
            )
            .await?;
        Ok(list
            .data
            .into_iter()
            .filter_map(|m| m.into_thread_message())
            .collect())
    }
}
