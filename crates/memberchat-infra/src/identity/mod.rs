//! External identity providers.

pub mod google;
