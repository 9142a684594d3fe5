//! Sample entity model and insert DTO.

use proxwatch_core::observation::RawObservation;
use proxwatch_core::types::Timestamp;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `samples` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Sample {
    /// SHA-256 content hash of the observation tuple.
    pub id: String,
    pub full_name: String,
    pub nickname: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    /// `None` when the upstream timestamp was missing or unparseable.
    pub timestamp: Option<Timestamp>,
    pub accuracy: Option<f64>,
    pub address: Option<String>,
    pub country_code: Option<String>,
    pub charging: Option<bool>,
    pub battery_level: Option<i64>,
    /// When this row was first ingested.
    pub created_at: Timestamp,
}

/// Normalized observation ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSample {
    pub id: String,
    pub full_name: String,
    pub nickname: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: Option<Timestamp>,
    pub accuracy: Option<f64>,
    pub address: Option<String>,
    pub country_code: Option<String>,
    pub charging: Option<bool>,
    pub battery_level: Option<i64>,
}

impl NewSample {
    pub fn from_observation(obs: &RawObservation) -> Self {
        Self {
            id: obs.content_id(),
            full_name: obs.full_name.clone(),
            nickname: obs.nickname.clone(),
            latitude: obs.latitude,
            longitude: obs.longitude,
            timestamp: obs.parsed_timestamp(),
            accuracy: obs.accuracy,
            address: obs.address.clone(),
            country_code: obs.country_code.clone(),
            charging: obs.charging,
            battery_level: obs.battery_level,
        }
    }
}

/// Result of an idempotent ingest.
#[derive(Debug, Clone)]
pub struct Ingested {
    pub sample: Sample,
    /// `false` when an identical observation was already stored.
    pub is_new: bool,
}
