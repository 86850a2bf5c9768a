//! Mailer that writes messages to the log instead of sending them.

use memberchat_core::mail::Mailer;
use memberchat_types::error::MailError;
use memberchat_types::mail::OutgoingMail;
use tracing::info;

/// Development mailer: logs recipient and subject, body at debug level.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

impl LogMailer {
    pub fn new() -> Self {
        Self
    }
}

impl Mailer for LogMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        info!(to = %mail.to, subject = %mail.subject, "SMTP not configured; mail not sent");
        tracing::debug!(body = %mail.html_body, "Unsent mail body");
        Ok(())
    }
}
