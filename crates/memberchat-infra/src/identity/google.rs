//! Google ID token verification.
//!
//! Validates RS256 ID tokens against Google's JWKS endpoint. Keys are
//! cached for the `max-age` the endpoint advertises (at least five minutes)
//! and refreshed when a token names an unknown key id.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use memberchat_core::auth::ports::IdentityVerifier;
use memberchat_types::auth::ExternalIdentity;
use memberchat_types::error::AuthError;
use serde::{Deserialize, Deserializer};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Google's JSON Web Key Set endpoint.
pub const GOOGLE_JWKS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";

/// Issuers Google uses for ID tokens.
const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

const MIN_CACHE_TTL_SECS: i64 = 300;
const DEFAULT_CACHE_TTL_SECS: i64 = 3600;

/// RSA public key components, base64url encoded.
#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: String,
    n: String,
    e: String,
}

#[derive(Debug, Deserialize)]
struct JwkSet {
    keys: Vec<Jwk>,
}

struct CachedKeys {
    keys: HashMap<String, Jwk>,
    expires_at: DateTime<Utc>,
}

/// Claims of a Google ID token that sign-in relies on.
#[derive(Debug, Clone, Deserialize)]
struct GoogleClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default, deserialize_with = "bool_or_string")]
    email_verified: bool,
    #[serde(default)]
    name: Option<String>,
}

impl GoogleClaims {
    fn into_identity(self) -> ExternalIdentity {
        ExternalIdentity {
            subject: self.sub,
            email: self.email,
            email_verified: self.email_verified,
            name: self.name.filter(|n| !n.trim().is_empty()),
        }
    }
}

/// Google sends `email_verified` as a JSON bool, older tokens as `"true"`.
fn bool_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Text(s) => s.eq_ignore_ascii_case("true"),
    })
}

/// Verifies Google ID tokens issued for this application's client id.
#[derive(Clone)]
pub struct GoogleIdTokenVerifier {
    client_id: Option<String>,
    jwks_url: String,
    http_client: reqwest::Client,
    cached_keys: Arc<RwLock<Option<CachedKeys>>>,
}

impl GoogleIdTokenVerifier {
    /// Create a verifier. Without a client id every token is rejected.
    pub fn new(client_id: Option<String>, http_client: reqwest::Client) -> Self {
        Self {
            client_id: client_id.filter(|id| !id.trim().is_empty()),
            jwks_url: GOOGLE_JWKS_URL.to_string(),
            http_client,
            cached_keys: Arc::new(RwLock::new(None)),
        }
    }

    /// Fetch signing keys from `jwks_url` instead of Google's endpoint.
    pub fn with_jwks_url(mut self, jwks_url: impl Into<String>) -> Self {
        self.jwks_url = jwks_url.into();
        self
    }

    pub fn is_configured(&self) -> bool {
        self.client_id.is_some()
    }

    async fn key_for(&self, kid: &str) -> Result<Jwk, AuthError> {
        if let Some(key) = self.cached_key(kid).await {
            return Ok(key);
        }

        self.refresh_keys().await?;

        self.cached_key(kid).await.ok_or_else(|| {
            debug!(kid = %kid, "Google signing key not found");
            AuthError::InvalidToken
        })
    }

    async fn cached_key(&self, kid: &str) -> Option<Jwk> {
        let cache = self.cached_keys.read().await;
        cache
            .as_ref()
            .filter(|cached| cached.expires_at > Utc::now())
            .and_then(|cached| cached.keys.get(kid).cloned())
    }

    async fn refresh_keys(&self) -> Result<(), AuthError> {
        info!("Fetching Google signing keys");
        let response = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                warn!(error = %e, "Failed to fetch Google signing keys");
                AuthError::Provider(e.to_string())
            })?;

        let ttl = response
            .headers()
            .get(reqwest::header::CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_max_age)
            .unwrap_or(DEFAULT_CACHE_TTL_SECS)
            .max(MIN_CACHE_TTL_SECS);

        let set: JwkSet = response.json().await.map_err(|e| {
            warn!(error = %e, "Failed to parse Google signing keys");
            AuthError::Provider(e.to_string())
        })?;

        let keys = set
            .keys
            .into_iter()
            .map(|k| (k.kid.clone(), k))
            .collect::<HashMap<_, _>>();
        debug!(count = keys.len(), ttl_secs = ttl, "Cached Google signing keys");

        *self.cached_keys.write().await = Some(CachedKeys {
            keys,
            expires_at: Utc::now() + Duration::seconds(ttl),
        });
        Ok(())
    }
}

impl IdentityVerifier for GoogleIdTokenVerifier {
    async fn verify(&self, id_token: &str) -> Result<ExternalIdentity, AuthError> {
        let client_id = self
            .client_id
            .as_deref()
            .ok_or_else(|| AuthError::Provider("Google sign-in is not configured".to_string()))?;

        let header = decode_header(id_token).map_err(|e| {
            debug!(error = %e, "Failed to decode Google token header");
            AuthError::InvalidToken
        })?;
        if header.alg != Algorithm::RS256 {
            return Err(AuthError::InvalidToken);
        }
        let kid = header.kid.ok_or(AuthError::InvalidToken)?;

        let jwk = self.key_for(&kid).await?;
        let key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e).map_err(|e| {
            warn!(error = %e, kid = %kid, "Invalid Google signing key");
            AuthError::Provider(format!("invalid signing key: {e}"))
        })?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[client_id]);
        validation.set_issuer(&GOOGLE_ISSUERS);

        let claims = decode::<GoogleClaims>(id_token, &key, &validation)
            .map_err(|e| {
                debug!(error = %e, "Google token validation failed");
                match e.kind() {
                    ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    _ => AuthError::InvalidToken,
                }
            })?
            .claims;

        debug!("Google token validated");
        Ok(claims.into_identity())
    }
}

/// Extract `max-age` seconds from a Cache-Control header value.
fn parse_max_age(header: &str) -> Option<i64> {
    header
        .split(',')
        .map(str::trim)
        .find_map(|directive| directive.strip_prefix("max-age="))
        .and_then(|v| v.parse().ok())
}
