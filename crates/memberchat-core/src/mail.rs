//! Mailer port and the password-reset message.

use memberchat_types::error::MailError;
use memberchat_types::mail::OutgoingMail;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

/// Port for delivering e-mail.
///
/// Implementations live in memberchat-infra (SMTP, log-only).
pub trait Mailer: Send + Sync {
    fn send(
        &self,
        mail: &OutgoingMail,
    ) -> impl std::future::Future<Output = Result<(), MailError>> + Send;
}

/// Build the link the reset e-mail points at.
///
/// Appends `token` and the percent-encoded `email` to the frontend page,
/// respecting a query string already present on the base URL.
pub fn reset_link(base_url: &str, token: &str, email: &str) -> String {
    let separator = if base_url.contains('?') { '&' } else { '?' };
    format!(
        "{base_url}{separator}token={}&email={}",
        utf8_percent_encode(token, NON_ALPHANUMERIC),
        utf8_percent_encode(email, NON_ALPHANUMERIC),
    )
}

/// Render the password-reset e-mail.
pub fn render_reset_mail(
    to: &str,
    name: &str,
    link: &str,
    expires_in_minutes: i64,
    year: i32,
) -> OutgoingMail {
    let name = escape_html(name);
    let href = escape_html(link);
    let html_body = format!(
        "<h1>Hello, {name}!</h1>\n\
         <p>We received a request to reset the password of your members area account.</p>\n\
         <p><a href=\"{href}\">Choose a new password</a></p>\n\
         <p>This link expires in {expires_in_minutes} minutes and can be used once.</p>\n\
         <p>If you did not ask for this, you can ignore this e-mail.</p>\n\
         <p style=\"color:#888\">&copy; {year}</p>\n"
    );

    OutgoingMail {
        to: to.to_string(),
        subject: "Password reset - members area".to_string(),
        html_body,
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
