//! Delivery of one-time login links.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Tokio1Executor};

use crate::config::{Config, SmtpConfig};
use crate::error::{DiaryError, Result};

const SUBJECT: &str = "Your Secret Diary login link";

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_login_link(&self, to: &Address, link: &str) -> Result<()>;
}

/// Writes the link to the log instead of sending mail. Used when no SMTP host is configured.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_login_link(&self, to: &Address, link: &str) -> Result<()> {
        tracing::info!(to = %to, link = %link, "login link issued (SMTP not configured)");
        Ok(())
    }
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e| DiaryError::Config(format!("invalid SDIARY_SMTP_FROM: {}", e)))?;

        let mut builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| DiaryError::Config(format!("invalid SMTP relay: {}", e)))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };
        builder = builder.port(config.port);
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_login_link(&self, to: &Address, link: &str) -> Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(Mailbox::new(None, to.clone()))
            .subject(SUBJECT)
            .header(ContentType::TEXT_PLAIN)
            .body(login_email_body(link))
            .map_err(|e| DiaryError::Mail(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| DiaryError::Mail(e.to_string()))?;

        tracing::info!(to = %to, "login link mailed");
        Ok(())
    }
}

fn login_email_body(link: &str) -> String {
    format!(
        "Follow this link to open your diary:\n\n{}\n\nIf you did not ask to sign in, you can ignore this email.\n",
        link
    )
}

/// Pick the mailer the configuration asks for.
pub fn from_config(config: &Config) -> Result<Arc<dyn Mailer>> {
    match &config.smtp {
        Some(smtp) => Ok(Arc::new(SmtpMailer::new(smtp)?)),
        None => {
            tracing::warn!("SDIARY_SMTP_HOST not set, login links will only be logged");
            Ok(Arc::new(LogMailer))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_contains_link() {
        let body = login_email_body("http://localhost:3000/auth/verify?token=abc");
        assert!(body.contains("http://localhost:3000/auth/verify?token=abc"));
    }

    #[test]
    fn smtp_mailer_rejects_bad_sender() {
        let config = SmtpConfig {
            host: "localhost".to_string(),
            port: 25,
            username: None,
            password: None,
            from: "not an address".to_string(),
            starttls: false,
        };
        assert!(matches!(SmtpMailer::new(&config), Err(DiaryError::Config(_))));
    }

    #[tokio::test]
    async fn log_mailer_accepts_any_address() {
        let to: Address = "me@example.com".parse().unwrap();
        LogMailer.send_login_link(&to, "http://x/auth/verify?token=t").await.unwrap();
    }
}
