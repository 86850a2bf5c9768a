//! Infrastructure layer for memberchat.
//!
//! Contains implementations of the port traits defined in `memberchat-core`:
//! SQLite storage, Argon2 password hashing, JWT signing, Google ID token
//! verification, the OpenAI Assistants client, and mail transports.

pub mod assistant;
pub mod config;
pub mod crypto;
pub mod identity;
pub mod mail;
pub mod sqlite;
