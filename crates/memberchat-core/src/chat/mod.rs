pub mod service;
pub mod title;
