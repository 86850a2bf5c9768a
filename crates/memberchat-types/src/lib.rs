//! Shared domain types for memberchat.
//!
//! Users, conversations, messages, assistant runs, auth claims and the
//! per-domain error enums used across the workspace.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod assistant;
pub mod auth;
pub mod chat;
pub mod config;
pub mod error;
pub mod mail;
pub mod user;
