//! Outbound email.
//!
//! [`Mailer`] is the seam between the signup flow and the SMTP relay;
//! [`SmtpMailer`] is the production implementation.
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid address {address}: {reason}")]
    Address { address: String, reason: String },
    #[error("Failed to build message: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// A single HTML email.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub to_name: String,
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}

/// Connection settings for [`SmtpMailer`].
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: SecretString,
    pub from: String,
}

/// Sends mail through an SMTP relay using STARTTLS and PLAIN authentication.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(settings: SmtpSettings) -> Result<Self, MailError> {
        let from = parse_mailbox(&settings.from, None)?;
        let credentials = Credentials::new(
            settings.user,
            settings.password.expose_secret().to_string(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)?
            .port(settings.port)
            .credentials(credentials)
            .authentication(vec![Mechanism::Plain])
            .build();

        tracing::debug!(host = %settings.host, port = settings.port, "SMTP transport configured");
        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let to = parse_mailbox(&email.to, Some(&email.to_name))?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.as_str())
            .header(ContentType::TEXT_HTML)
            .body(email.html_body.clone())?;

        self.transport.send(message).await?;
        tracing::info!(to = %email.to, subject = %email.subject, "Email sent");
        Ok(())
    }
}

fn parse_mailbox(address: &str, name: Option<&str>) -> Result<Mailbox, MailError> {
    let parsed: lettre::Address = address.parse().map_err(|e: lettre::address::AddressError| {
        MailError::Address {
            address: address.to_string(),
            reason: e.to_string(),
        }
    })?;
    let name = name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);
    Ok(Mailbox::new(name, parsed))
}

/// True when `address` is a syntactically valid email address.
pub fn is_valid_address(address: &str) -> bool {
    address.parse::<lettre::Address>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_addresses() {
        assert!(is_valid_address("ana@example.com"));
        assert!(is_valid_address("first.last+tag@sub.example.com.br"));
    }

    #[test]
    fn test_invalid_addresses() {
        assert!(!is_valid_address("not-an-email"));
        assert!(!is_valid_address(""));
        assert!(!is_valid_address("@example.com"));
        assert!(!is_valid_address("ana@"));
        assert!(!is_valid_address("ana example@example.com"));
    }

    #[test]
    fn test_mailbox_keeps_display_name() {
        let mailbox = parse_mailbox("ana@example.com", Some("Ana")).unwrap();
        assert_eq!(mailbox.name.as_deref(), Some("Ana"));
        assert_eq!(mailbox.email.to_string(), "ana@example.com");
    }

    #[test]
    fn test_blank_display_name_is_dropped() {
        let mailbox = parse_mailbox("ana@example.com", Some("  ")).unwrap();
        assert!(mailbox.name.is_none());
    }

    #[test]
    fn test_bad_from_address_rejected() {
        let result = SmtpMailer::new(SmtpSettings {
            host: "localhost".into(),
            port: 2525,
            user: "u".into(),
            password: SecretString::from("p"),
            from: "not an address".into(),
        });
        assert!(matches!(result, Err(MailError::Address { .. })));
    }

    #[tokio::test]
    async fn test_transport_builds_for_valid_settings() {
        let mailer = SmtpMailer::new(SmtpSettings {
            host: "smtp.example.com".into(),
            port: 587,
            user: "user".into(),
            password: SecretString::from("secret"),
            from: "noreply@example.com".into(),
        });
        assert!(mailer.is_ok());
    }
}
