//! Configuration loader for memberchat.
//!
//! Reads `config.toml` from the data directory (`~/.memberchat/` by default)
//! and deserializes it into [`AppConfig`]. Falls back to defaults when the
//! file is missing or malformed. Environment variables then override file
//! values, and secrets are read from the environment only.

use std::path::{Path, PathBuf};

use memberchat_types::config::AppConfig;
use secrecy::SecretString;

/// Resolve the data directory: `MEMBERCHAT_DATA_DIR`, else `~/.memberchat`.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("MEMBERCHAT_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".memberchat");
    }

    PathBuf::from(".memberchat")
}

/// Load configuration from `{data_dir}/config.toml`.
///
/// - Missing file: returns [`AppConfig::default()`].
/// - Unreadable or unparsable file: logs a warning and returns the default.
pub async fn load_config(data_dir: &Path) -> AppConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return AppConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return AppConfig::default();
        }
    };

    match toml::from_str::<AppConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            AppConfig::default()
        }
    }
}

/// Read a non-empty environment variable.
pub fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Apply environment overrides on top of file configuration.
///
/// `lookup` is `env_var` in production; tests pass a map.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("MEMBERCHAT_DATABASE_URL") {
        config.database.url = Some(url);
    }
    if let Some(host) = lookup("MEMBERCHAT_HOST") {
        config.server.host = host;
    }
    if let Some(port) = lookup("PORT") {
        match port.parse() {
            Ok(port) => config.server.port = port,
            Err(_) => tracing::warn!(value = %port, "Ignoring invalid PORT"),
        }
    }
    if let Some(url) = lookup("OPENAI_BASE_URL") {
        config.assistant.base_url = url;
    }
    if let Some(id) = lookup("ASSISTANT_ID") {
        config.assistant.assistant_id = Some(id);
    }
    if let Some(id) = lookup("GOOGLE_CLIENT_ID") {
        config.auth.google_client_id = Some(id);
    }
    if let Some(url) = lookup("FRONTEND_RESET_PASSWORD_URL") {
        config.auth.frontend_reset_url = url;
    }
    if let Some(host) = lookup("SMTP_HOST") {
        config.mail.smtp_host = Some(host);
    }
    if let Some(port) = lookup("SMTP_PORT") {
        match port.parse() {
            Ok(port) => config.mail.smtp_port = port,
            Err(_) => tracing::warn!(value = %port, "Ignoring invalid SMTP_PORT"),
        }
    }
    if let Some(user) = lookup("SMTP_USER") {
        config.mail.smtp_user = Some(user);
    }
    if let Some(from) = lookup("MAIL_FROM") {
        config.mail.from = from;
    }
}

/// Load `config.toml` and apply process environment overrides.
pub async fn load_effective_config(data_dir: &Path) -> AppConfig {
    let mut config = load_config(data_dir).await;
    apply_env_overrides(&mut config, env_var);
    config
}

/// Secrets sourced from the environment, never from `config.toml`.
pub struct Secrets {
    pub jwt_secret: Option<SecretString>,
    pub openai_api_key: Option<SecretString>,
    pub smtp_password: Option<SecretString>,
}

impl Secrets {
    pub fn from_env() -> Self {
        Self::from_lookup(env_var)
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            jwt_secret: lookup("JWT_SECRET").map(SecretString::from),
            openai_api_key: lookup("OPENAI_API_KEY").map(SecretString::from),
            smtp_password: lookup("SMTP_PASSWORD").map(SecretString::from),
        }
    }
}
