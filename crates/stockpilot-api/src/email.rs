//! Contact-form delivery via SMTP.
//!
//! [`ContactMailer`] wraps the `lettre` async SMTP transport. It is only
//! built when `email.smtp_host` is configured; without it the contact
//! endpoint answers with an internal error.

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use stockpilot_common::config::EmailConfig;

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Email build error: {0}")]
    Build(String),
}

/// A validated contact-form submission.
#[derive(Debug, Clone)]
pub struct ContactMessage<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub subject: Option<&'a str>,
    pub message: &'a str,
}

impl ContactMessage<'_> {
    fn subject_line(&self) -> String {
        match self.subject.map(str::trim).filter(|s| !s.is_empty()) {
            Some(subject) => format!("[Contact] {subject}"),
            None => format!("[Contact] Message from {}", self.name),
        }
    }

    fn body(&self) -> String {
        format!(
            "Name: {}\nEmail: {}\n\n{}",
            self.name, self.email, self.message
        )
    }
}

#[derive(Clone)]
pub struct ContactMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    support: Mailbox,
}

impl ContactMailer {
    /// `None` when no SMTP relay is configured.
    pub fn from_config(config: &EmailConfig) -> Result<Option<Self>, EmailError> {
        let Some(host) = config.smtp_host.as_deref() else {
            return Ok(None);
        };

        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?.port(config.smtp_port);
        if let (Some(user), Some(pass)) = (&config.smtp_user, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Some(Self {
            transport: builder.build(),
            from: config.from_address.parse()?,
            support: config.support_address.parse()?,
        }))
    }

    /// Send a submission to the support inbox, replying to the sender.
    pub async fn send_contact(&self, contact: &ContactMessage<'_>) -> Result<(), EmailError> {
        let email = build_contact_email(&self.from, &self.support, contact)?;
        self.transport.send(email).await?;
        tracing::info!(reply_to = contact.email, "Contact email sent");
        Ok(())
    }
}

fn build_contact_email(
    from: &Mailbox,
    to: &Mailbox,
    contact: &ContactMessage<'_>,
) -> Result<Message, EmailError> {
    let reply_to = Mailbox::new(Some(contact.name.to_string()), contact.email.parse()?);
    Message::builder()
        .from(from.clone())
        .to(to.clone())
        .reply_to(reply_to)
        .subject(contact.subject_line())
        .header(ContentType::TEXT_PLAIN)
        .body(contact.body())
        .map_err(|e| EmailError::Build(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact<'a>(subject: Option<&'a str>) -> ContactMessage<'a> {
        ContactMessage {
            name: "Ada",
            email: "ada@example.com",
            subject,
            message: "I would like to upgrade my plan.",
        }
    }

    #[test]
    fn subject_falls_back_to_sender_name() {
        assert_eq!(contact(None).subject_line(), "[Contact] Message from Ada");
        assert_eq!(contact(Some("  ")).subject_line(), "[Contact] Message from Ada");
        assert_eq!(contact(Some("Billing")).subject_line(), "[Contact] Billing");
    }

    #[test]
    fn message_replies_to_sender() {
        let from: Mailbox = "noreply@stockpilot.local".parse().unwrap();
        let to: Mailbox = "support@stockpilot.local".parse().unwrap();
        let email = build_contact_email(&from, &to, &contact(Some("Billing"))).unwrap();
        let raw = String::from_utf8(email.formatted()).unwrap();
        let reply_to = raw
            .lines()
            .find(|l| l.starts_with("Reply-To:"))
            .unwrap();
        assert!(reply_to.contains("<ada@example.com>"));
        assert!(raw.contains("Subject: [Contact] Billing"));
        assert!(raw.contains("I would like to upgrade my plan."));
    }

    #[test]
    fn mailer_is_disabled_without_host() {
        let config = stockpilot_common::config::AppConfig::for_tests().email;
        assert!(ContactMailer::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn bad_sender_address_is_rejected() {
        let from: Mailbox = "noreply@stockpilot.local".parse().unwrap();
        let mut msg = contact(None);
        msg.email = "not-an-email";
        assert!(matches!(
            build_contact_email(&from, &from, &msg),
            Err(EmailError::Address(_))
        ));
    }
}
