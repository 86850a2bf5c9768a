//! Repository trait definitions (ports) for persistence.

pub mod conversation;
pub mod user;
