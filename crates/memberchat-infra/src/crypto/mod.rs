//! Cryptographic operations for memberchat.
//!
//! - `password`: Argon2id password hashing
//! - `token`: HS256 session and password-reset tokens

pub mod password;
pub mod token;
