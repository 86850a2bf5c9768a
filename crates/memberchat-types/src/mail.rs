//! Outgoing mail envelope.

use serde::{Deserialize, Serialize};

/// A rendered e-mail ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}
