//! Raw location observations as delivered by the upstream source, and the
//! content-addressed identity derived from them.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::types::Timestamp;

/// Field separator for the content hash preimage.
const HASH_SEPARATOR: &str = "|";

/// Observation timestamp as reported upstream.
///
/// Providers report either epoch milliseconds or an ISO-8601 string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    EpochMillis(i64),
    Text(String),
}

impl RawTimestamp {
    /// Parse into a UTC timestamp, or `None` when the value is unusable.
    pub fn parse(&self) -> Option<Timestamp> {
        match self {
            RawTimestamp::EpochMillis(ms) => Utc.timestamp_millis_opt(*ms).single(),
            RawTimestamp::Text(text) => parse_timestamp_text(text),
        }
    }

    /// Timestamp as it enters the content hash: parseable values at full
    /// precision in UTC, anything else as its trimmed text.
    fn hash_form(&self) -> String {
        match (self.parse(), self) {
            (Some(ts), _) => ts.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            (None, RawTimestamp::Text(text)) => text.trim().to_string(),
            (None, RawTimestamp::EpochMillis(ms)) => ms.to_string(),
        }
    }
}

fn parse_timestamp_text(text: &str) -> Option<Timestamp> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    // Some feeds stringify the epoch-millis value.
    text.parse::<i64>()
        .ok()
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
}

/// One location report for one person, exactly as polled.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawObservation {
    pub full_name: String,
    #[serde(default)]
    pub nickname: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub timestamp: Option<RawTimestamp>,
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub charging: Option<bool>,
    #[serde(default)]
    pub battery_level: Option<i64>,
}

impl RawObservation {
    /// Minimal observation with only the required fields set.
    pub fn new(full_name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            full_name: full_name.into(),
            nickname: None,
            latitude,
            longitude,
            timestamp: None,
            accuracy: None,
            address: None,
            country_code: None,
            charging: None,
            battery_level: None,
        }
    }

    /// The observation timestamp, if present and parseable.
    pub fn parsed_timestamp(&self) -> Option<Timestamp> {
        self.timestamp.as_ref().and_then(RawTimestamp::parse)
    }

    /// Content-hash identifier.
    ///
    /// SHA-256 over the `|`-joined attribute tuple, absent values rendered as
    /// the empty string. A parseable timestamp enters in normalized UTC form,
    /// so the same instant reported as millis or as text hashes identically.
    pub fn content_id(&self) -> String {
        let timestamp = self
            .timestamp
            .as_ref()
            .map(RawTimestamp::hash_form)
            .unwrap_or_default();

        let fields = [
            self.full_name.clone(),
            opt_to_string(&self.nickname),
            self.latitude.to_string(),
            self.longitude.to_string(),
            timestamp,
            opt_to_string(&self.accuracy),
            opt_to_string(&self.address),
            opt_to_string(&self.country_code),
            opt_to_string(&self.charging),
            opt_to_string(&self.battery_level),
        ];

        sha256_hex(fields.join(HASH_SEPARATOR).as_bytes())
    }
}

fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

fn opt_to_string<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}
