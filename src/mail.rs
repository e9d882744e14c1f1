// src/mail.rs

//! Magic-link delivery.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail delivery failed: {0}")]
    Delivery(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_magic_link(&self, email: &str, link: &Url) -> Result<(), MailError>;
}

/// Writes the sign-in link to the application log instead of sending mail.
/// Used when no mail relay is configured.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_magic_link(&self, email: &str, link: &Url) -> Result<(), MailError> {
        tracing::info!(%email, %link, "Magic link issued");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub email: String,
    pub link: Url,
}

/// Keeps every message in memory so tests can follow the link.
#[derive(Debug, Clone, Default)]
pub struct OutboxMailer {
    sent: Arc<Mutex<Vec<SentMail>>>,
}

impl OutboxMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent message sent to `email`.
    pub fn last_for(&self, email: &str) -> Option<SentMail> {
        let sent = self.sent.lock().ok()?;
        sent.iter().rev().find(|m| m.email == email).cloned()
    }
}

#[async_trait]
impl Mailer for OutboxMailer {
    async fn send_magic_link(&self, email: &str, link: &Url) -> Result<(), MailError> {
        let mut sent = self
            .sent
            .lock()
            .map_err(|e| MailError::Delivery(e.to_string()))?;
        sent.push(SentMail {
            email: email.to_string(),
            link: link.clone(),
        });
        Ok(())
    }
}
