//! Configuration types for memberchat.
//!
//! `AppConfig` represents the `config.toml` in the data directory. Every
//! field has a default so a missing or partial file still yields a usable
//! configuration. Secrets (signing key, API key, SMTP password) are not part
//! of this file; they come from the environment.

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub mail: MailConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3333
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Database location. `None` means `{data_dir}/memberchat.db`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: Option<String>,
}

/// Token lifetimes and sign-in providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_session_ttl")]
    pub session_ttl_minutes: i64,
    #[serde(default = "default_reset_ttl")]
    pub reset_ttl_minutes: i64,
    /// Page of the frontend that consumes `?token=..&email=..`.
    #[serde(default = "default_reset_url")]
    pub frontend_reset_url: String,
    /// OAuth client id that Google ID tokens must be issued for.
    #[serde(default)]
    pub google_client_id: Option<String>,
}

fn default_session_ttl() -> i64 {
    60
}

fn default_reset_ttl() -> i64 {
    15
}

fn default_reset_url() -> String {
    "http://localhost:3000/reset-password".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_minutes: default_session_ttl(),
            reset_ttl_minutes: default_reset_ttl(),
            frontend_reset_url: default_reset_url(),
            google_client_id: None,
        }
    }
}

/// Remote assistant API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default = "default_assistant_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub assistant_id: Option<String>,
    /// Per-HTTP-request timeout.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub poll: PollConfig,
}

fn default_assistant_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            base_url: default_assistant_base_url(),
            assistant_id: None,
            request_timeout_secs: default_request_timeout(),
            poll: PollConfig::default(),
        }
    }
}

/// Backoff and deadline for waiting on a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_initial_interval")]
    pub initial_interval_ms: u64,
    #[serde(default = "default_max_interval")]
    pub max_interval_ms: u64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    #[serde(default = "default_poll_timeout")]
    pub timeout_secs: u64,
}

fn default_initial_interval() -> u64 {
    1_000
}

fn default_max_interval() -> u64 {
    8_000
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_poll_timeout() -> u64 {
    120
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_interval_ms: default_initial_interval(),
            max_interval_ms: default_max_interval(),
            multiplier: default_multiplier(),
            timeout_secs: default_poll_timeout(),
        }
    }
}

/// Outgoing mail settings. SMTP is used only when `smtp_host` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(default)]
    pub smtp_host: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_user: Option<String>,
    #[serde(default = "default_from")]
    pub from: String,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from() -> String {
    "No Reply <noreply@localhost>".to_string()
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_host: None,
            smtp_port: default_smtp_port(),
            smtp_user: None,
            from: default_from(),
        }
    }
}
