//! Remote assistant abstractions.
//!
//! - `client`: the `AssistantClient` port (threads, messages, runs)
//! - `poller`: bounded, cancellable wait for a run to finish
//! - `registry`: per-conversation in-flight run tracking

pub mod client;
pub mod poller;
pub mod registry;
