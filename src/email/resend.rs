use anyhow::Context;
use async_trait::async_trait;
use tracing::debug;

use super::{EmailMessage, Mailer, SendReceipt};
use crate::config::EmailConfig;

/// Client for Resend's `POST /emails` API.
#[derive(Clone)]
pub struct ResendMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl ResendMailer {
    pub fn new(api_url: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// `None` when no API key is configured.
    pub fn from_config(config: &EmailConfig) -> Option<Self> {
        config
            .resend_api_key
            .as_deref()
            .map(|key| Self::new(&config.resend_api_url, key))
    }

    fn endpoint(&self) -> String {
        format!("{}/emails", self.api_url)
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, message: &EmailMessage) -> anyhow::Result<SendReceipt> {
        let res = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(message)
            .send()
            .await
            .context("resend request")?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            anyhow::bail!("resend rejected email with {}: {}", status, body);
        }

        let receipt = res
            .json::<SendReceipt>()
            .await
            .context("decode resend response")?;
        debug!(id = %receipt.id, "resend accepted email");
        Ok(receipt)
    }
}
