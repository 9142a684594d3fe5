//! Proximity record models.

use proxwatch_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `proximity_records` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ProximityRecord {
    pub id: DbId,
    pub person1_sample_id: String,
    pub person2_sample_id: String,
    /// Great-circle distance in meters.
    pub spatial_distance: f64,
    /// Absolute timestamp difference in seconds.
    pub temporal_distance: f64,
    /// Midpoint of the two observation timestamps.
    pub timestamp: Timestamp,
    pub created_at: Timestamp,
}

/// A proximity record joined with the names of both people.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ProximityHistoryRow {
    pub id: DbId,
    pub person1_name: String,
    pub person2_name: String,
    pub spatial_distance: f64,
    pub timestamp: Timestamp,
}

impl ProximityHistoryRow {
    /// The two names in lexicographic order.
    pub fn pair_key(&self) -> (String, String) {
        if self.person1_name <= self.person2_name {
            (self.person1_name.clone(), self.person2_name.clone())
        } else {
            (self.person2_name.clone(), self.person1_name.clone())
        }
    }
}

/// DTO for inserting a proximity record.
///
/// Sample ids are kept in ascending order so an unordered pair has exactly
/// one representation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProximityRecord {
    person1_sample_id: String,
    person2_sample_id: String,
    pub spatial_distance: f64,
    pub temporal_distance: f64,
    pub timestamp: Timestamp,
}

impl NewProximityRecord {
    pub fn new(
        sample_a: &str,
        sample_b: &str,
        spatial_distance: f64,
        temporal_distance: f64,
        timestamp: Timestamp,
    ) -> Self {
        let (person1_sample_id, person2_sample_id) = ordered_pair(sample_a, sample_b);
        Self {
            person1_sample_id,
            person2_sample_id,
            spatial_distance,
            temporal_distance,
            timestamp,
        }
    }

    pub fn person1_sample_id(&self) -> &str {
        &self.person1_sample_id
    }

    pub fn person2_sample_id(&self) -> &str {
        &self.person2_sample_id
    }
}

/// Order two sample ids ascending.
pub fn ordered_pair(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}
