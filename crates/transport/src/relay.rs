//! Downstream position relay.
//!
//! [`OsmAndRelay`] speaks the OsmAnd tracking URL format understood by
//! PhoneTrack and similar self-hosted trackers: one GET per position, the
//! device name in the path and the fix as query parameters.

use std::time::Duration;

use async_trait::async_trait;
use proxwatch_core::types::Timestamp;
use reqwest::Url;

/// Path below the relay host, before the key and device name.
const OSMAND_PATH: [&str; 5] = ["index.php", "apps", "phonetrack", "log", "osmand"];

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("Relay returned HTTP {0}")]
    HttpStatus(u16),

    /// The configured host cannot be turned into a request URL.
    #[error("Invalid relay URL: {0}")]
    InvalidUrl(String),
}

// ---------------------------------------------------------------------------
// RelayPosition
// ---------------------------------------------------------------------------

/// One position to forward.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayPosition {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    pub battery_level: Option<i64>,
    pub timestamp: Option<Timestamp>,
}

// ---------------------------------------------------------------------------
// PositionRelay
// ---------------------------------------------------------------------------

#[async_trait]
pub trait PositionRelay: Send + Sync {
    async fn forward(&self, position: &RelayPosition) -> Result<(), RelayError>;
}

// ---------------------------------------------------------------------------
// OsmAndRelay
// ---------------------------------------------------------------------------

pub struct OsmAndRelay {
    client: reqwest::Client,
    host: Url,
    key: String,
}

impl OsmAndRelay {
    /// Build a relay for `host` (e.g. `https://cloud.example.org`) and the
    /// per-session logging key.
    pub fn new(host: &str, key: impl Into<String>, timeout: Duration) -> Result<Self, RelayError> {
        let host = Url::parse(host).map_err(|e| RelayError::InvalidUrl(format!("{host}: {e}")))?;
        if host.cannot_be_a_base() {
            return Err(RelayError::InvalidUrl(host.to_string()));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            host,
            key: key.into(),
        })
    }

    /// Request URL for a position. The device name is percent-encoded as a
    /// single path segment.
    pub fn position_url(&self, position: &RelayPosition) -> Result<Url, RelayError> {
        let mut url = self.host.clone();
        url.path_segments_mut()
            .map_err(|_| RelayError::InvalidUrl(self.host.to_string()))?
            .pop_if_empty()
            .extend(OSMAND_PATH)
            .push(&self.key)
            .push(&position.name);

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("lat", &position.latitude.to_string());
            query.append_pair("lon", &position.longitude.to_string());
            if let Some(accuracy) = position.accuracy {
                query.append_pair("acc", &accuracy.to_string());
            }
            if let Some(battery) = position.battery_level {
                query.append_pair("bat", &battery.to_string());
            }
            if let Some(ts) = position.timestamp {
                query.append_pair("timestamp", &ts.timestamp().to_string());
            }
        }

        Ok(url)
    }
}

#[async_trait]
impl PositionRelay for OsmAndRelay {
    async fn forward(&self, position: &RelayPosition) -> Result<(), RelayError> {
        let url = self.position_url(position)?;
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(RelayError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}
