//! SMTP mailer built on `lettre`.
//!
//! Connects to the relay with STARTTLS and authenticates when a user is
//! configured. The password is held as a [`SecretString`].

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use memberchat_core::mail::Mailer;
use memberchat_types::error::MailError;
use memberchat_types::mail::OutgoingMail;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

/// STARTTLS SMTP relay transport.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(
        host: &str,
        port: u16,
        user: Option<String>,
        password: Option<SecretString>,
        from: &str,
    ) -> Result<Self, MailError> {
        let from: Mailbox = from
            .parse()
            .map_err(|e| MailError::Address(format!("{from}: {e}")))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| MailError::Transport(e.to_string()))?
            .port(port);

        if let Some(user) = user.filter(|u| !u.is_empty()) {
            let password = password
                .map(|p| p.expose_secret().to_string())
                .unwrap_or_default();
            builder = builder.credentials(Credentials::new(user, password));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    fn build_message(&self, mail: &OutgoingMail) -> Result<Message, MailError> {
        let to: Mailbox = mail
            .to
            .parse()
            .map_err(|e| MailError::Address(format!("{}: {e}", mail.to)))?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(mail.html_body.clone())
            .map_err(|e| MailError::Build(e.to_string()))
    }
}

impl Mailer for SmtpMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        let message = self.build_message(mail)?;
        match self.transport.send(message).await {
            Ok(response) => {
                debug!(to = %mail.to, code = %response.code(), "Mail accepted by relay");
                Ok(())
            }
            Err(e) => {
                warn!(to = %mail.to, error = %e, "SMTP delivery failed");
                Err(MailError::Transport(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mailer() -> SmtpMailer {
        SmtpMailer::new("smtp.example.com", 587, None, None, "Club <noreply@example.com>").unwrap()
    }

    #[tokio::test]
    async fn test_build_message_headers() {
        let message = mailer()
            .build_message(&OutgoingMail {
                to: "ana@example.com".to_string(),
                subject: "Password reset - members area".to_string(),
                html_body: "<p>hi</p>".to_string(),
            })
            .unwrap();

        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("To: ana@example.com"));
        assert!(raw.contains("Subject: Password reset - members area"));
        assert!(raw.contains("Content-Type: text/html"));
    }

    #[tokio::test]
    async fn test_rejects_bad_recipient() {
        let result = mailer().build_message(&OutgoingMail {
            to: "nobody".to_string(),
            subject: "x".to_string(),
            html_body: String::new(),
        });
        assert!(matches!(result, Err(MailError::Address(_))));
    }
}
