//! Repository for the `upstream_failures` table.

use proxwatch_core::failure_codes::FailureCode;
use proxwatch_core::types::{format_timestamp, Timestamp};
use sqlx::SqlitePool;

use crate::models::upstream_failure::UpstreamFailure;

/// Column list for `upstream_failures` SELECT queries.
const COLUMNS: &str = "id, code, created_at";

/// Append-only log of upstream unavailability events.
pub struct UpstreamFailureRepo;

impl UpstreamFailureRepo {
    /// Record a failure observed at `at`.
    pub async fn record(
        pool: &SqlitePool,
        code: FailureCode,
        at: Timestamp,
    ) -> Result<UpstreamFailure, sqlx::Error> {
        let query = format!(
            "INSERT INTO upstream_failures (code, created_at) \
             VALUES (?, ?) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UpstreamFailure>(&query)
            .bind(code.as_str())
            .bind(format_timestamp(&at))
            .fetch_one(pool)
            .await
    }

    /// Whether any failure was recorded at or after `cutoff`.
    pub async fn exists_since(pool: &SqlitePool, cutoff: Timestamp) -> Result<bool, sqlx::Error> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM upstream_failures WHERE created_at >= ?")
                .bind(format_timestamp(&cutoff))
                .fetch_one(pool)
                .await?;
        Ok(count > 0)
    }

    /// The most recent failure, if any.
    pub async fn latest(pool: &SqlitePool) -> Result<Option<UpstreamFailure>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM upstream_failures ORDER BY created_at DESC, id DESC LIMIT 1"
        );
        sqlx::query_as::<_, UpstreamFailure>(&query)
            .fetch_optional(pool)
            .await
    }
}
