//! Auth service orchestrating signup, sign-in and password reset.
//!
//! AuthService is generic over its ports so memberchat-core never depends
//! on the concrete hashing, JWT, identity-provider or SMTP crates.

use chrono::{Datelike, Utc};
use memberchat_types::auth::{RESET_PURPOSE, ResetClaims, SessionClaims, SessionToken};
use memberchat_types::error::{AuthError, RepositoryError};
use memberchat_types::user::{NewUser, User, normalize_email};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::ports::{IdentityVerifier, PasswordHasher, TokenSigner};
use crate::auth::validation::{validate_email, validate_password};
use crate::mail::{Mailer, render_reset_mail, reset_link};
use crate::repository::user::UserRepository;

/// Message returned by `request_password_reset` in every case, so callers
/// cannot tell registered addresses apart.
pub const RESET_REQUESTED_MESSAGE: &str =
    "If the email is registered, you will receive a link to reset your password.";

/// Lifetimes and links used by [`AuthService`].
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub session_ttl_secs: i64,
    pub reset_ttl_secs: i64,
    pub frontend_reset_url: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            session_ttl_secs: 60 * 60,
            reset_ttl_secs: 15 * 60,
            frontend_reset_url: "http://localhost:3000/reset-password".to_string(),
        }
    }
}

/// Account and sign-in flows.
pub struct AuthService<U, P, S, I, M>
where
    U: UserRepository,
    P: PasswordHasher,
    S: TokenSigner,
    I: IdentityVerifier,
    M: Mailer,
{
    users: U,
    hasher: P,
    signer: S,
    identity: I,
    mailer: M,
    settings: AuthSettings,
}

impl<U, P, S, I, M> AuthService<U, P, S, I, M>
where
    U: UserRepository,
    P: PasswordHasher,
    S: TokenSigner,
    I: IdentityVerifier,
    M: Mailer,
{
    pub fn new(
        users: U,
        hasher: P,
        signer: S,
        identity: I,
        mailer: M,
        settings: AuthSettings,
    ) -> Self {
        Self {
            users,
            hasher,
            signer,
            identity,
            mailer,
            settings,
        }
    }

    /// Access the user repository.
    pub fn users(&self) -> &U {
        &self.users
    }

    // --- Accounts ---

    /// Create a password account.
    ///
    /// New accounts are subscribers unless `is_subscriber` says otherwise.
    pub async fn signup(&self, input: NewUser) -> Result<User, AuthError> {
        let email = validate_email(&input.email)?;
        validate_password(&input.password)?;

        if self.users.find_by_email(&email).await?.is_some() {
            debug!(%email, "Signup rejected: email already registered");
            return Err(AuthError::EmailTaken(email));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::now_v7(),
            email,
            name: input.name.map(|n| n.trim().to_string()).unwrap_or_default(),
            password_hash: Some(self.hasher.hash_password(&input.password)?),
            external_id: None,
            is_subscriber: input.is_subscriber.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };

        let user = self.users.create_user(&user).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => {
                AuthError::EmailTaken(user.email.clone())
            }
            other => other.into(),
        })?;

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Current user profile.
    pub async fn me(&self, user_id: &Uuid) -> Result<User, AuthError> {
        self.users
            .get_user(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Replace a user's password without a reset token (operator CLI).
    pub async fn set_password(&self, email: &str, new_password: &str) -> Result<User, AuthError> {
        validate_password(new_password)?;
        let mut user = self
            .users
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or(AuthError::UserNotFound)?;

        user.password_hash = Some(self.hasher.hash_password(new_password)?);
        user.updated_at = Utc::now();
        self.users.update_user(&user).await?;

        info!(user_id = %user.id, "Password set by operator");
        Ok(user)
    }

    // --- Sign-in ---

    /// Email/password login.
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionToken, AuthError> {
        let email = normalize_email(email);
        let Some(user) = self.users.find_by_email(&email).await? else {
            debug!("Login failed: unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        let Some(hash) = user.password_hash.as_deref() else {
            debug!(user_id = %user.id, "Login failed: account has no password");
            return Err(AuthError::ExternalAccountOnly);
        };

        if !self.hasher.verify_password(password, hash)? {
            debug!(user_id = %user.id, "Login failed: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        info!(user_id = %user.id, "Password login succeeded");
        self.issue_session(&user)
    }

    /// Login with a Google ID token.
    ///
    /// Only existing accounts may sign in this way; the provider identity is
    /// linked to the account on first use.
    pub async fn login_with_google(&self, id_token: &str) -> Result<SessionToken, AuthError> {
        let identity = self.identity.verify(id_token).await?;

        if !identity.email_verified {
            return Err(AuthError::EmailNotVerified);
        }
        let email = identity
            .email
            .as_deref()
            .map(normalize_email)
            .ok_or(AuthError::EmailNotVerified)?;

        let Some(mut user) = self.users.find_by_email(&email).await? else {
            warn!("Google login rejected: email not registered");
            return Err(AuthError::NotRegistered);
        };

        match user.external_id.as_deref() {
            Some(linked) if linked != identity.subject => {
                warn!(user_id = %user.id, "Google login rejected: different identity linked");
                return Err(AuthError::IdentityMismatch);
            }
            Some(_) => {}
            None => {
                user.external_id = Some(identity.subject.clone());
                if user.name.is_empty() {
                    if let Some(name) = identity.name.clone() {
                        user.name = name;
                    }
                }
                user.updated_at = Utc::now();
                self.users.update_user(&user).await.map_err(|e| match e {
                    RepositoryError::Conflict(_) => {
                        warn!(user_id = %user.id, "Google login rejected: identity linked to another account");
                        AuthError::IdentityMismatch
                    }
                    other => other.into(),
                })?;
                info!(user_id = %user.id, "Linked Google identity to account");
            }
        }

        info!(user_id = %user.id, "Google login succeeded");
        self.issue_session(&user)
    }

    /// Validate a bearer token presented by a client.
    pub fn authenticate(&self, token: &str) -> Result<SessionClaims, AuthError> {
        self.signer.verify_session(token).map_err(|e| match e {
            AuthError::TokenExpired => AuthError::SessionExpired,
            other => other,
        })
    }

    fn issue_session(&self, user: &User) -> Result<SessionToken, AuthError> {
        let claims = SessionClaims::for_user(
            user,
            Utc::now().timestamp(),
            self.settings.session_ttl_secs,
        );
        Ok(SessionToken {
            access_token: self.signer.sign_session(&claims)?,
            token_type: "Bearer".to_string(),
            expires_in: self.settings.session_ttl_secs,
            is_subscriber: user.is_subscriber,
        })
    }

    // --- Password reset ---

    /// Mail a reset link to a password account.
    ///
    /// Always yields [`RESET_REQUESTED_MESSAGE`]: unknown addresses,
    /// Google-only accounts and delivery failures are only logged.
    pub async fn request_password_reset(&self, email: &str) -> Result<&'static str, AuthError> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(AuthError::MissingField("email"));
        }

        let Some(user) = self.users.find_by_email(&email).await? else {
            debug!("Password reset requested for unknown email");
            return Ok(RESET_REQUESTED_MESSAGE);
        };
        let Some(hash) = user.password_hash.as_deref() else {
            debug!(user_id = %user.id, "Password reset requested for account without password");
            return Ok(RESET_REQUESTED_MESSAGE);
        };

        let now = Utc::now();
        let claims = ResetClaims {
            sub: user.id,
            email: user.email.clone(),
            purpose: RESET_PURPOSE.to_string(),
            pfp: self.signer.password_fingerprint(hash),
            iat: now.timestamp(),
            exp: now.timestamp() + self.settings.reset_ttl_secs,
        };
        let token = self.signer.sign_reset(&claims)?;

        let link = reset_link(&self.settings.frontend_reset_url, &token, &user.email);
        let display_name = if user.name.is_empty() {
            user.email.as_str()
        } else {
            user.name.as_str()
        };
        let mail = render_reset_mail(
            &user.email,
            display_name,
            &link,
            self.settings.reset_ttl_secs / 60,
            now.year(),
        );

        match self.mailer.send(&mail).await {
            Ok(()) => info!(user_id = %user.id, "Password reset mail sent"),
            Err(e) => warn!(user_id = %user.id, error = %e, "Failed to send password reset mail"),
        }

        Ok(RESET_REQUESTED_MESSAGE)
    }

    /// Set a new password using a reset token.
    pub async fn reset_password(
        &self,
        token: &str,
        email: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        if token.trim().is_empty() {
            return Err(AuthError::MissingField("token"));
        }
        if email.trim().is_empty() {
            return Err(AuthError::MissingField("email"));
        }
        if new_password.is_empty() {
            return Err(AuthError::MissingField("new_password"));
        }
        validate_password(new_password)?;

        let claims = self.signer.verify_reset(token.trim()).map_err(|e| match e {
            AuthError::TokenExpired => AuthError::ResetLinkExpired,
            other => other,
        })?;
        let email = normalize_email(email);
        if claims.purpose != RESET_PURPOSE || claims.email != email {
            return Err(AuthError::InvalidToken);
        }

        let mut user = self
            .users
            .get_user(&claims.sub)
            .await?
            .ok_or(AuthError::InvalidToken)?;
        if user.email != email {
            return Err(AuthError::InvalidToken);
        }

        // A used (or otherwise superseded) link no longer matches the stored hash.
        let current = user.password_hash.as_deref().ok_or(AuthError::InvalidToken)?;
        if self.signer.password_fingerprint(current) != claims.pfp {
            debug!(user_id = %user.id, "Reset token fingerprint mismatch");
            return Err(AuthError::InvalidToken);
        }

        user.password_hash = Some(self.hasher.hash_password(new_password)?);
        user.updated_at = Utc::now();
        self.users.update_user(&user).await?;

        info!(user_id = %user.id, "Password reset completed");
        Ok(())
    }
}
