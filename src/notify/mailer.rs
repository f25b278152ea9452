//! Mail transport.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

use crate::config::SmtpConfig;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("mail sender not configured (set SMTP_FROM or SMTP_USER)")]
    NoSender,

    #[error("invalid address '{address}': {source}")]
    Address {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// A plain-text message. The sender is a property of the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
    pub to: String,
    pub subject: String,
    pub text: String,
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, mail: Mail) -> Result<(), NotifyError>;
}

/// SMTP delivery on the tokio executor.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

fn mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address.parse().map_err(|source| NotifyError::Address {
        address: address.to_string(),
        source,
    })
}

impl SmtpMailer {
    /// `secure` selects implicit TLS; otherwise the connection is upgraded
    /// with STARTTLS. Credentials are used only when both user and pass are set.
    pub fn from_config(config: &SmtpConfig) -> Result<Self, NotifyError> {
        let from = mailbox(config.sender().ok_or(NotifyError::NoSender)?)?;

        let builder = if config.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
        };

        let mut builder = builder.port(config.port);
        if let (Some(user), Some(pass)) = (&config.user, &config.pass) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, mail: Mail) -> Result<(), NotifyError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(mailbox(&mail.to)?)
            .subject(mail.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(mail.text)?;

        self.transport.send(message).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_required() {
        let config = SmtpConfig::default();
        assert!(matches!(SmtpMailer::from_config(&config), Err(NotifyError::NoSender)));
    }

    #[test]
    fn test_invalid_sender() {
        let config = SmtpConfig {
            from: Some("not an address".into()),
            ..SmtpConfig::default()
        };
        assert!(matches!(
            SmtpMailer::from_config(&config),
            Err(NotifyError::Address { .. })
        ));
    }

    #[tokio::test]
    async fn test_sender_falls_back_to_user() {
        let config = SmtpConfig {
            user: Some("jobs@example.com".into()),
            pass: Some("pw".into()),
            ..SmtpConfig::default()
        };
        let mailer = SmtpMailer::from_config(&config).unwrap();
        assert_eq!(mailer.from.email.to_string(), "jobs@example.com");
    }
}
