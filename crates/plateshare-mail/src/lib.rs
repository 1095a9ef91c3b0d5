//! Outbound SMTP notifications.
//!
//! Notifications are fire-and-forget: the moderation action is the durable
//! side effect, and a send failure surfaces to the admin as a soft warning,
//! never as a rollback.

pub mod templates;

use anyhow::{Context, Result};
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_name: String,
    pub from_address: String,
}

pub struct Mailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: Option<Mailbox>,
}

impl Mailer {
    pub fn new(config: &MailConfig) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .context("failed to build SMTP transport")?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        let from = Mailbox::new(
            Some(config.from_name.clone()),
            config
                .from_address
                .parse::<Address>()
                .context("invalid SMTP from address")?,
        );

        info!("SMTP notifications enabled via {}:{}", config.host, config.port);
        Ok(Self {
            transport: Some(transport),
            from: Some(from),
        })
    }

    /// A mailer with no transport. Every send fails softly, which the action
    /// handlers report as a warning suffix on the success message.
    pub fn disabled() -> Self {
        Self {
            transport: None,
            from: None,
        }
    }

    pub async fn send(&self, to_name: &str, to_email: &str, subject: &str, html: String) -> Result<()> {
        let (Some(transport), Some(from)) = (&self.transport, &self.from) else {
            anyhow::bail!("SMTP transport is not configured");
        };

        let message = Message::builder()
            .from(from.clone())
            .to(Mailbox::new(
                Some(to_name.to_string()),
                to_email
                    .parse::<Address>()
                    .context("invalid recipient address")?,
            ))
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html)
            .context("failed to build notification email")?;

        transport
            .send(message)
            .await
            .context("SMTP send failed")?;
        Ok(())
    }

    pub async fn notify_donation_approved(
        &self,
        to_name: &str,
        to_email: &str,
        title: &str,
    ) -> Result<()> {
        let (subject, body) = templates::donation_approved(to_name, title);
        self.send(to_name, to_email, &subject, body).await
    }

    pub async fn notify_donation_rejected(
        &self,
        to_name: &str,
        to_email: &str,
        title: &str,
        reason: &str,
    ) -> Result<()> {
        let (subject, body) = templates::donation_rejected(to_name, title, reason);
        self.send(to_name, to_email, &subject, body).await
    }

    pub async fn notify_account_approved(&self, to_name: &str, to_email: &str) -> Result<()> {
        let (subject, body) = templates::account_approved(to_name);
        self.send(to_name, to_email, &subject, body).await
    }

    pub async fn notify_account_rejected(
        &self,
        to_name: &str,
        to_email: &str,
        reason: &str,
    ) -> Result<()> {
        let (subject, body) = templates::account_rejected(to_name, reason);
        self.send(to_name, to_email, &subject, body).await
    }
}
