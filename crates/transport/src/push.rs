//! Push notification transport.
//!
//! [`PushDelivery`] posts a Pushover-compatible form (`token`, `user`,
//! `message`, `priority`). Delivery is a single attempt: a failed send is
//! retried by the engine on its next evaluation, never inside this call.

use std::time::Duration;

use async_trait::async_trait;

/// Title attached to every push message.
const MESSAGE_TITLE: &str = "proxwatch";

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("Push endpoint returned HTTP {0}")]
    HttpStatus(u16),
}

// ---------------------------------------------------------------------------
// NotificationTransport
// ---------------------------------------------------------------------------

#[async_trait]
pub trait NotificationTransport: Send + Sync {
    async fn send(&self, message: &str, priority: i32) -> Result<(), PushError>;
}

// ---------------------------------------------------------------------------
// PushDelivery
// ---------------------------------------------------------------------------

pub struct PushDelivery {
    client: reqwest::Client,
    url: String,
    token: String,
    user: String,
}

impl PushDelivery {
    pub fn new(
        url: impl Into<String>,
        token: impl Into<String>,
        user: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, PushError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            token: token.into(),
            user: user.into(),
        })
    }

    fn form<'a>(&'a self, message: &'a str, priority: &'a str) -> [(&'static str, &'a str); 5] {
        [
            ("token", self.token.as_str()),
            ("user", self.user.as_str()),
            ("title", MESSAGE_TITLE),
            ("message", message),
            ("priority", priority),
        ]
    }
}

#[async_trait]
impl NotificationTransport for PushDelivery {
    async fn send(&self, message: &str, priority: i32) -> Result<(), PushError> {
        let priority = priority.to_string();
        let response = self
            .client
            .post(&self.url)
            .form(&self.form(message, &priority))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PushError::HttpStatus(response.status().as_u16()));
        }

        tracing::debug!(priority = %priority, "Push notification delivered");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// LogOnlyTransport
// ---------------------------------------------------------------------------

/// Transport used when no push endpoint is configured: messages are written
/// to the log and count as delivered.
#[derive(Debug, Default)]
pub struct LogOnlyTransport;

#[async_trait]
impl NotificationTransport for LogOnlyTransport {
    async fn send(&self, message: &str, priority: i32) -> Result<(), PushError> {
        tracing::info!(priority, body = message, "Notification (no push endpoint configured)");
        Ok(())
    }
}
