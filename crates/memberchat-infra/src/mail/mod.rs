//! Mail transports.
//!
//! `MailTransport` picks SMTP when a relay host is configured and falls back
//! to logging the message otherwise, so password reset works in development
//! without a mail server.

pub mod log;
pub mod smtp;

use memberchat_core::mail::Mailer;
use memberchat_types::config::MailConfig;
use memberchat_types::error::MailError;
use memberchat_types::mail::OutgoingMail;
use secrecy::SecretString;

pub use log::LogMailer;
pub use smtp::SmtpMailer;

/// The configured mail transport.
pub enum MailTransport {
    Smtp(SmtpMailer),
    Log(LogMailer),
}

impl MailTransport {
    /// Build the transport described by `config`.
    pub fn from_config(
        config: &MailConfig,
        smtp_password: Option<SecretString>,
    ) -> Result<Self, MailError> {
        match config.smtp_host.as_deref().filter(|h| !h.trim().is_empty()) {
            Some(host) => Ok(Self::Smtp(SmtpMailer::new(
                host,
                config.smtp_port,
                config.smtp_user.clone(),
                smtp_password,
                &config.from,
            )?)),
            None => Ok(Self::Log(LogMailer::new())),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Smtp(_) => "smtp",
            Self::Log(_) => "log",
        }
    }
}

impl Mailer for MailTransport {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        match self {
            Self::Smtp(smtp) => smtp.send(mail).await,
            Self::Log(log) => log.send(mail).await,
        }
    }
}
