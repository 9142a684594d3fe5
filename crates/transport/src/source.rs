//! Upstream location source.
//!
//! The engine only ever learns that the source is unavailable and, for
//! rate limiting, a [`FailureCode`] saying roughly why.

use std::time::Duration;

use async_trait::async_trait;
use proxwatch_core::failure_codes::FailureCode;
use proxwatch_core::observation::RawObservation;
use reqwest::StatusCode;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("Upstream source unavailable ({code}): {reason}")]
    Unavailable { code: FailureCode, reason: String },
}

impl UpstreamError {
    pub fn unavailable(code: FailureCode, reason: impl Into<String>) -> Self {
        UpstreamError::Unavailable {
            code,
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> FailureCode {
        match self {
            UpstreamError::Unavailable { code, .. } => *code,
        }
    }
}

/// Map an HTTP status from the feed to a failure code.
///
/// Rejected credentials get their own code; everything else is treated as
/// the source being unreachable.
pub fn failure_code_for_status(status: StatusCode) -> FailureCode {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FailureCode::InvalidSession,
        _ => FailureCode::SourceUnreachable,
    }
}

// ---------------------------------------------------------------------------
// LocationSource
// ---------------------------------------------------------------------------

/// Yields the currently shared location of every tracked person.
#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn poll(&self) -> Result<Vec<RawObservation>, UpstreamError>;
}

// ---------------------------------------------------------------------------
// HttpFeedSource
// ---------------------------------------------------------------------------

/// Polls a JSON endpoint returning an array of observations.
pub struct HttpFeedSource {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl HttpFeedSource {
    pub fn new(
        url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            token,
        })
    }
}

#[async_trait]
impl LocationSource for HttpFeedSource {
    async fn poll(&self) -> Result<Vec<RawObservation>, UpstreamError> {
        let mut request = self.client.get(&self.url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| UpstreamError::unavailable(FailureCode::SourceUnreachable, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::unavailable(
                failure_code_for_status(status),
                format!("feed returned HTTP {}", status.as_u16()),
            ));
        }

        let observations: Vec<RawObservation> = response
            .json()
            .await
            .map_err(|e| UpstreamError::unavailable(FailureCode::MalformedResponse, e.to_string()))?;

        tracing::debug!(count = observations.len(), "Polled upstream location feed");
        Ok(observations)
    }
}
