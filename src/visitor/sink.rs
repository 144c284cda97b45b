//! Notification delivery.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use super::message::payload;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Webhook request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Webhook returned {0}")]
    Status(reqwest::StatusCode),

    #[error("Webhook delivery timed out")]
    Timeout,
}

/// Where notifications go. Delivery is best-effort: callers log errors and
/// move on, nothing is retried.
pub trait NotificationSink: Send + Sync + 'static {
    /// A disabled sink drops everything; callers can skip building messages
    fn is_enabled(&self) -> bool {
        true
    }

    fn deliver(&self, message: &str) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

/// Posts `{"content": ...}` to a Discord-style webhook
#[derive(Debug, Clone)]
pub struct WebhookSink {
    client: reqwest::Client,
    url: Option<String>,
}

impl WebhookSink {
    /// A sink without a URL is disabled
    pub fn new(url: Option<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }
}

impl NotificationSink for WebhookSink {
    fn is_enabled(&self) -> bool {
        self.url.is_some()
    }

    async fn deliver(&self, message: &str) -> Result<(), NotifyError> {
        let Some(url) = &self.url else {
            return Ok(());
        };
        let response = self.client.post(url).json(&payload(message)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status));
        }
        Ok(())
    }
}
