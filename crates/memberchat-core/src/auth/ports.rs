//! Trait definitions for the auth service's collaborators.
//!
//! Implementations live in memberchat-infra: Argon2 hashing, HS256 JWT
//! signing, and Google ID token verification.

use memberchat_types::auth::{ExternalIdentity, ResetClaims, SessionClaims};
use memberchat_types::error::AuthError;

/// One-way password hashing.
pub trait PasswordHasher: Send + Sync {
    /// Hash a plaintext password into a self-describing string (PHC format).
    fn hash_password(&self, password: &str) -> Result<String, AuthError>;

    /// Check a plaintext password against a stored hash.
    fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

/// Signs and verifies session and password-reset tokens.
pub trait TokenSigner: Send + Sync {
    fn sign_session(&self, claims: &SessionClaims) -> Result<String, AuthError>;

    /// Verify signature and expiry. Expiry maps to `TokenExpired`,
    /// anything else to `InvalidToken`. The same applies to `verify_reset`.
    fn verify_session(&self, token: &str) -> Result<SessionClaims, AuthError>;

    fn sign_reset(&self, claims: &ResetClaims) -> Result<String, AuthError>;

    fn verify_reset(&self, token: &str) -> Result<ResetClaims, AuthError>;

    /// Keyed digest of a stored password hash, embedded in reset tokens.
    fn password_fingerprint(&self, password_hash: &str) -> String;
}

/// Verifies identity tokens issued by an external provider.
pub trait IdentityVerifier: Send + Sync {
    fn verify(
        &self,
        id_token: &str,
    ) -> impl std::future::Future<Output = Result<ExternalIdentity, AuthError>> + Send;
}
