//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST API.
//! Services are generic over repository/hasher/signer/client traits, but
//! AppState pins them to the concrete infra implementations.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use memberchat_core::assistant::poller::PollPolicy;
use memberchat_core::auth::service::{AuthService, AuthSettings};
use memberchat_core::chat::service::ChatService;
use memberchat_infra::assistant::AssistantBackend;
use memberchat_infra::config::{Secrets, load_effective_config, resolve_data_dir};
use memberchat_infra::crypto::password::Argon2PasswordHasher;
use memberchat_infra::crypto::token::JwtTokenSigner;
use memberchat_infra::identity::google::GoogleIdTokenVerifier;
use memberchat_infra::mail::MailTransport;
use memberchat_infra::sqlite::conversation::SqliteConversationRepository;
use memberchat_infra::sqlite::pool::{DatabasePool, default_database_url};
use memberchat_infra::sqlite::user::SqliteUserRepository;
use memberchat_types::config::AppConfig;
use secrecy::SecretString;
use tracing::{info, warn};
use uuid::Uuid;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteAuthService = AuthService<
    SqliteUserRepository,
    Argon2PasswordHasher,
    JwtTokenSigner,
    GoogleIdTokenVerifier,
    MailTransport,
>;

pub type ConcreteChatService =
    ChatService<SqliteConversationRepository, SqliteUserRepository, AssistantBackend>;

const JWKS_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared application state holding all services.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<ConcreteAuthService>,
    pub chat_service: Arc<ConcreteChatService>,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize from the data directory and process environment.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_effective_config(&data_dir).await;
        Self::build(data_dir, config, Secrets::from_env()).await
    }

    /// Connect the database and wire services from explicit inputs.
    ///
    /// `data_dir` only locates the default database file.
    pub async fn build(
        data_dir: PathBuf,
        config: AppConfig,
        secrets: Secrets,
    ) -> anyhow::Result<Self> {
        let db_url = config
            .database
            .url
            .clone()
            .unwrap_or_else(|| default_database_url(&data_dir));
        let db_pool = DatabasePool::new(&db_url).await?;

        // CLI commands never issue tokens; `serve` checks the configured
        // secret before building state.
        let jwt_secret = secrets.jwt_secret.unwrap_or_else(|| {
            SecretString::from(format!(
                "{}{}",
                Uuid::now_v7().simple(),
                Uuid::now_v7().simple()
            ))
        });

        let http_client = reqwest::Client::builder()
            .timeout(JWKS_REQUEST_TIMEOUT)
            .build()?;
        let identity = GoogleIdTokenVerifier::new(config.auth.google_client_id.clone(), http_client);
        if !identity.is_configured() {
            info!("GOOGLE_CLIENT_ID not set; Google sign-in disabled");
        }

        let mailer = MailTransport::from_config(&config.mail, secrets.smtp_password)?;

        let auth_service = AuthService::new(
            SqliteUserRepository::new(db_pool.clone()),
            Argon2PasswordHasher::new(),
            JwtTokenSigner::new(&jwt_secret),
            identity,
            mailer,
            AuthSettings {
                session_ttl_secs: config.auth.session_ttl_minutes * 60,
                reset_ttl_secs: config.auth.reset_ttl_minutes * 60,
                frontend_reset_url: config.auth.frontend_reset_url.clone(),
            },
        );

        let assistant = AssistantBackend::from_config(&config.assistant, secrets.openai_api_key);
        if let AssistantBackend::Unconfigured(reason) = &assistant {
            warn!(reason = %reason, "Assistant not configured; chat requests will fail");
        }

        let chat_service = ChatService::new(
            SqliteConversationRepository::new(db_pool.clone()),
            SqliteUserRepository::new(db_pool.clone()),
            assistant,
            PollPolicy::from_config(&config.assistant.poll),
        );

        Ok(Self {
            auth_service: Arc::new(auth_service),
            chat_service: Arc::new(chat_service),
            db_pool,
        })
    }
}
