//! Session and password-reset token claims, and external identities.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::user::User;

/// `purpose` claim carried by password-reset tokens.
pub const RESET_PURPOSE: &str = "password_reset";

/// Claims of a signed session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id.
    pub sub: Uuid,
    pub email: String,
    pub is_subscriber: bool,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expiry (unix seconds).
    pub exp: i64,
}

impl SessionClaims {
    /// Build claims for `user` valid for `ttl_secs` from `now`.
    pub fn for_user(user: &User, now: i64, ttl_secs: i64) -> Self {
        Self {
            sub: user.id,
            email: user.email.clone(),
            is_subscriber: user.is_subscriber,
            iat: now,
            exp: now + ttl_secs,
        }
    }
}

/// Claims of a signed password-reset token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetClaims {
    pub sub: Uuid,
    pub email: String,
    pub purpose: String,
    /// Fingerprint of the password hash at issue time. Once the password
    /// changes the fingerprint no longer matches, so a link works once.
    pub pfp: String,
    pub iat: i64,
    pub exp: i64,
}

/// Response body returned by every successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionToken {
    pub access_token: String,
    pub token_type: String,
    /// Seconds until expiry.
    pub expires_in: i64,
    pub is_subscriber: bool,
}

/// A verified identity asserted by an external provider (Google).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
    /// Provider subject id.
    pub subject: String,
    pub email: Option<String>,
    pub email_verified: bool,
    pub name: Option<String>,
}
