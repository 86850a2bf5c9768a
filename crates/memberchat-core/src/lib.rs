//! Business logic and repository trait definitions for memberchat.
//!
//! This crate defines the "ports" (repository, assistant, hashing, token,
//! identity and mail traits) that the infrastructure layer implements. It
//! depends only on `memberchat-types` -- never on `memberchat-infra` or any
//! database/IO crate.

pub mod assistant;
pub mod auth;
pub mod chat;
pub mod mail;
pub mod repository;

#[cfg(test)]
pub(crate) mod testing;
