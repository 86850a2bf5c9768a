//! Input rules shared by signup, password reset and the CLI.

use memberchat_types::error::AuthError;
use memberchat_types::user::normalize_email;

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Normalize and check an email address.
///
/// Requires a non-empty local part and a domain containing a dot that is
/// neither leading nor trailing.
pub fn validate_email(email: &str) -> Result<String, AuthError> {
    let normalized = normalize_email(email);
    let valid = match normalized.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && !domain.contains(char::is_whitespace)
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };

    if valid {
        Ok(normalized)
    } else {
        Err(AuthError::InvalidEmail(email.trim().to_string()))
    }
}

pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::WeakPassword(MIN_PASSWORD_LEN));
    }
    Ok(())
}
