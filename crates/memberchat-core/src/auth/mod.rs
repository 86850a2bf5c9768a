//! Accounts, sign-in and password reset.
//!
//! - `ports`: hashing, token signing and identity verification traits
//! - `service`: `AuthService` orchestrating the flows
//! - `validation`: email/password input rules

pub mod ports;
pub mod service;
pub mod validation;
