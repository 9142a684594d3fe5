//! Repository for the `forwarded_samples` table.

use chrono::Utc;
use proxwatch_core::types::format_timestamp;
use sqlx::SqlitePool;

use super::ledger_repo::COLUMNS as SAMPLE_COLUMNS;
use crate::models::sample::Sample;

/// Tracks which samples have been relayed downstream.
pub struct ForwardingRepo;

impl ForwardingRepo {
    /// All samples without a forwarded mark, oldest observation first.
    ///
    /// Samples without a timestamp sort first.
    pub async fn pending(pool: &SqlitePool) -> Result<Vec<Sample>, sqlx::Error> {
        let query = format!(
            "SELECT {SAMPLE_COLUMNS} FROM samples \
             WHERE NOT EXISTS ( \
                 SELECT 1 FROM forwarded_samples f WHERE f.sample_id = samples.id \
             ) \
             ORDER BY timestamp, id"
        );
        sqlx::query_as::<_, Sample>(&query).fetch_all(pool).await
    }

    /// Record that a sample was relayed.
    ///
    /// Idempotent: returns `true` only when a new mark was written.
    pub async fn mark_forwarded(pool: &SqlitePool, sample_id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO forwarded_samples (sample_id, forwarded_at) \
             VALUES (?, ?) \
             ON CONFLICT (sample_id) DO NOTHING",
        )
        .bind(sample_id)
        .bind(format_timestamp(&Utc::now()))
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Whether a sample already carries a forwarded mark.
    pub async fn is_forwarded(pool: &SqlitePool, sample_id: &str) -> Result<bool, sqlx::Error> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM forwarded_samples WHERE sample_id = ?")
                .bind(sample_id)
                .fetch_one(pool)
                .await?;
        Ok(count > 0)
    }
}
