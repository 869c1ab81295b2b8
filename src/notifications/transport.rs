use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;

use super::settings::SmtpSettings;

/// Bound on connection, greeting and socket waits for one delivery attempt
pub const SEND_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Invalid email address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to build message: {0}")]
    Message(String),

    #[error("SMTP delivery failed: {0}")]
    Transport(String),

    #[error("Delivery timed out after {0:?}")]
    Timeout(Duration),
}

/// Fully rendered message ready for delivery
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Attempt a single delivery with the given transport settings
    async fn deliver(&self, smtp: &SmtpSettings, email: &OutgoingEmail)
        -> Result<(), NotificationError>;
}

/// SMTP delivery through lettre. A transport is built per call from the
/// settings that were current at send time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SmtpMailer;

impl SmtpMailer {
    pub fn new() -> Self {
        Self
    }

    fn build_transport(
        &self,
        smtp: &SmtpSettings,
    ) -> Result<AsyncSmtpTransport<Tokio1Executor>, NotificationError> {
        // 465 speaks TLS from the first byte, everything else upgrades via STARTTLS
        let builder = if smtp.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
        }
        .map_err(|e| NotificationError::Transport(e.to_string()))?;

        Ok(builder
            .port(smtp.port)
            .credentials(Credentials::new(smtp.user.clone(), smtp.password.clone()))
            .timeout(Some(SEND_TIMEOUT))
            .build())
    }
}

fn parse_address(address: &str) -> Result<Address, NotificationError> {
    address
        .trim()
        .parse::<Address>()
        .map_err(|e| NotificationError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn deliver(
        &self,
        smtp: &SmtpSettings,
        email: &OutgoingEmail,
    ) -> Result<(), NotificationError> {
        let from = Mailbox::new(Some(smtp.from_name.clone()), parse_address(&smtp.from_email)?);
        let to = Mailbox::new(None, parse_address(&email.to)?);

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(email.html.clone())
            .map_err(|e| NotificationError::Message(e.to_string()))?;

        let transport = self.build_transport(smtp)?;

        tracing::debug!(
            host = %smtp.host,
            port = smtp.port,
            to = %email.to,
            "Sending email via SMTP"
        );

        transport
            .send(message)
            .await
            .map_err(|e| NotificationError::Transport(e.to_string()))?;

        Ok(())
    }
}
