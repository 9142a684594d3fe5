//! Repository for the `proximity_records` table.

use chrono::Utc;
use proxwatch_core::types::format_timestamp;
use sqlx::SqlitePool;

use crate::models::proximity::{
    ordered_pair, NewProximityRecord, ProximityHistoryRow, ProximityRecord,
};

/// Column list for `proximity_records` SELECT queries.
const COLUMNS: &str = "\
    id, person1_sample_id, person2_sample_id, \
    spatial_distance, temporal_distance, timestamp, created_at";

/// Provides operations for pairwise proximity records.
pub struct ProximityRepo;

impl ProximityRepo {
    /// Whether a record exists for the unordered pair of sample ids.
    pub async fn exists_for_pair(
        pool: &SqlitePool,
        sample_a: &str,
        sample_b: &str,
    ) -> Result<bool, sqlx::Error> {
        let (first, second) = ordered_pair(sample_a, sample_b);
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM proximity_records \
             WHERE person1_sample_id = ? AND person2_sample_id = ?",
        )
        .bind(first)
        .bind(second)
        .fetch_one(pool)
        .await?;
        Ok(count > 0)
    }

    /// Insert a record, returning `None` if the pair was already recorded.
    pub async fn create(
        pool: &SqlitePool,
        record: &NewProximityRecord,
    ) -> Result<Option<ProximityRecord>, sqlx::Error> {
        let query = format!(
            "INSERT INTO proximity_records \
                 (person1_sample_id, person2_sample_id, spatial_distance, \
                  temporal_distance, timestamp, created_at) \
             VALUES (?, ?, ?, ?, ?, ?) \
             ON CONFLICT (person1_sample_id, person2_sample_id) DO NOTHING \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProximityRecord>(&query)
            .bind(record.person1_sample_id())
            .bind(record.person2_sample_id())
            .bind(record.spatial_distance)
            .bind(record.temporal_distance)
            .bind(format_timestamp(&record.timestamp))
            .bind(format_timestamp(&Utc::now()))
            .fetch_optional(pool)
            .await
    }

    /// Every record joined with the full names of both sides.
    ///
    /// Ordered by representative timestamp, then id.
    pub async fn list_history(pool: &SqlitePool) -> Result<Vec<ProximityHistoryRow>, sqlx::Error> {
        sqlx::query_as::<_, ProximityHistoryRow>(
            "SELECT p.id, s1.full_name AS person1_name, s2.full_name AS person2_name, \
                    p.spatial_distance, p.timestamp \
             FROM proximity_records p \
             JOIN samples s1 ON s1.id = p.person1_sample_id \
             JOIN samples s2 ON s2.id = p.person2_sample_id \
             ORDER BY p.timestamp, p.id",
        )
        .fetch_all(pool)
        .await
    }

    /// Total number of proximity records.
    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM proximity_records")
            .fetch_one(pool)
            .await
    }
}
