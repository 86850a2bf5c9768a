//! User account types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account.
///
/// `password_hash` is absent for accounts that only ever sign in through an
/// external identity provider. It is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    /// Subject id at the external identity provider, linked on first use.
    pub external_id: Option<String>,
    pub is_subscriber: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether the account can sign in with email and password.
    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }
}

/// Input for account creation (signup endpoint and `mchat user create`).
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "isSubscriber")]
    pub is_subscriber: Option<bool>,
}

/// Normalize an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::now_v7(),
            email: "ana@example.com".to_string(),
            name: "Ana".to_string(),
            password_hash: Some("$argon2id$v=19$...".to_string()),
            external_id: None,
            is_subscriber: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let json = serde_json::to_string(&sample_user()).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"is_subscriber\":true"));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ana@Example.COM "), "ana@example.com");
    }

    #[test]
    fn test_new_user_optional_fields() {
        let input: NewUser =
            serde_json::from_str(r#"{"email":"a@b.co","password":"secret1"}"#).unwrap();
        assert!(input.name.is_none());
        assert!(input.is_subscriber.is_none());
    }

    #[test]
    fn test_new_user_accepts_camel_case_subscriber_flag() {
        let input: NewUser = serde_json::from_str(
            r#"{"email":"a@b.co","password":"secret1","isSubscriber":false}"#,
        )
        .unwrap();
        assert_eq!(input.is_subscriber, Some(false));
    }
}
