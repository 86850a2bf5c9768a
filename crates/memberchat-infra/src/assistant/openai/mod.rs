//! OpenAI Assistants (v2) client.
//!
//! This module provides the [`OpenAiAssistantClient`] which implements the
//! [`AssistantClient`](memberchat_core::assistant::client::AssistantClient)
//! trait over the threads/runs REST API.

pub mod client;
pub mod types;

pub use client::OpenAiAssistantClient;
