use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

mod resend;
pub mod templates;

pub use resend::ResendMailer;

/// A single transactional email.
#[derive(Debug, Clone, Serialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

/// Provider acknowledgement for an accepted message.
#[derive(Debug, Clone, Deserialize)]
pub struct SendReceipt {
    pub id: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Hand the message to the provider. No retries; callers decide what a failure means.
    async fn send(&self, message: &EmailMessage) -> anyhow::Result<SendReceipt>;
}

/// Logs messages instead of delivering them. Used when no provider key is configured.
#[derive(Clone, Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> anyhow::Result<SendReceipt> {
        let id = format!("log-{}", uuid::Uuid::new_v4());
        info!(
            id = %id,
            to = ?message.to,
            subject = %message.subject,
            html = %message.html,
            "email delivery stub"
        );
        Ok(SendReceipt { id })
    }
}
