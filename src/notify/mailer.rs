use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// A best-effort mail transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &MailMessage) -> Result<()>;
}

/// Writes messages to the log instead of delivering them.
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &MailMessage) -> Result<()> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            "mail: {}",
            message.body
        );
        Ok(())
    }
}

/// Posts each message as JSON to an HTTP mail relay.
pub struct RelayMailer {
    client: Client,
    endpoint: String,
}

impl RelayMailer {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        if endpoint.is_empty() {
            return Err(Error::Config("mail relay url is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build http client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl Mailer for RelayMailer {
    async fn send(&self, message: &MailMessage) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(message)
            .send()
            .await
            .map_err(|e| Error::Mail(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(Error::Mail(format!(
            "relay returned {status}: {}",
            body.chars().take(200).collect::<String>()
        )))
    }
}
