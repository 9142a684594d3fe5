//! Repository for the `proximity_alerts` table.

use chrono::Utc;
use proxwatch_core::proximity::ProximityState;
use proxwatch_core::types::{format_timestamp, DbId};
use sqlx::SqlitePool;

use crate::models::alert::ProximityAlert;

/// Column list for `proximity_alerts` SELECT queries.
const COLUMNS: &str = "id, proximity_record_id, state, created_at";

/// Records which state-change alerts have already been sent.
pub struct AlertRepo;

impl AlertRepo {
    /// Whether an alert was sent for this record and state.
    pub async fn exists(
        pool: &SqlitePool,
        proximity_record_id: DbId,
        state: ProximityState,
    ) -> Result<bool, sqlx::Error> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM proximity_alerts \
             WHERE proximity_record_id = ? AND state = ?",
        )
        .bind(proximity_record_id)
        .bind(state.as_str())
        .fetch_one(pool)
        .await?;
        Ok(count > 0)
    }

    /// Persist a sent alert. Returns `false` if it was already recorded.
    pub async fn create(
        pool: &SqlitePool,
        proximity_record_id: DbId,
        state: ProximityState,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO proximity_alerts (proximity_record_id, state, created_at) \
             VALUES (?, ?, ?) \
             ON CONFLICT (proximity_record_id, state) DO NOTHING",
        )
        .bind(proximity_record_id)
        .bind(state.as_str())
        .bind(format_timestamp(&Utc::now()))
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All alerts, oldest first.
    pub async fn list(pool: &SqlitePool) -> Result<Vec<ProximityAlert>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM proximity_alerts ORDER BY id");
        sqlx::query_as::<_, ProximityAlert>(&query)
            .fetch_all(pool)
            .await
    }
}
