//! HS256 session and password-reset tokens.
//!
//! Implements the `TokenSigner` port from `memberchat-core` with
//! `jsonwebtoken`. The same secret keys the password fingerprint that
//! makes reset links single-use.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use memberchat_core::auth::ports::TokenSigner;
use memberchat_types::auth::{ResetClaims, SessionClaims};
use memberchat_types::error::AuthError;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Minimum signing secret length accepted by `serve`.
pub const MIN_SECRET_BYTES: usize = 32;

/// JWT signer/verifier keyed by a shared secret.
pub struct JwtTokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    fingerprint_key: Vec<u8>,
}

impl JwtTokenSigner {
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            fingerprint_key: bytes.to_vec(),
        }
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    fn verify<T: DeserializeOwned>(&self, token: &str) -> Result<T, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<T>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "Token verification failed");
                match e.kind() {
                    ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    _ => AuthError::InvalidToken,
                }
            })
    }
}

impl TokenSigner for JwtTokenSigner {
    fn sign_session(&self, claims: &SessionClaims) -> Result<String, AuthError> {
        self.sign(claims)
    }

    fn verify_session(&self, token: &str) -> Result<SessionClaims, AuthError> {
        self.verify(token)
    }

    fn sign_reset(&self, claims: &ResetClaims) -> Result<String, AuthError> {
        self.sign(claims)
    }

    fn verify_reset(&self, token: &str) -> Result<ResetClaims, AuthError> {
        self.verify(token)
    }

    fn password_fingerprint(&self, password_hash: &str) -> String {
        let digest = Sha256::new()
            .chain_update(&self.fingerprint_key)
            .chain_update([0u8])
            .chain_update(password_hash.as_bytes())
            .finalize();
        // Truncated to 128 bits.
        format!("{:x}", digest)[..32].to_string()
    }
}
