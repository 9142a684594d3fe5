//! Repository for the `samples` table (the sample ledger).

use chrono::Utc;
use proxwatch_core::observation::RawObservation;
use proxwatch_core::types::{format_timestamp, Timestamp};
use sqlx::SqlitePool;

use crate::models::sample::{Ingested, NewSample, Sample};

/// Column list for `samples` queries. The id is content-derived, so
/// inserts supply every column.
pub(crate) const COLUMNS: &str = "\
    id, full_name, nickname, latitude, longitude, timestamp, \
    accuracy, address, country_code, charging, battery_level, created_at";

/// Content-addressed, append-only store of location samples.
pub struct LedgerRepo;

impl LedgerRepo {
    /// Insert an observation unless an identical one is already stored.
    ///
    /// Returns the stored row either way. The insert and the read-back run
    /// in one transaction.
    pub async fn ingest(pool: &SqlitePool, obs: &RawObservation) -> Result<Ingested, sqlx::Error> {
        let new = NewSample::from_observation(obs);
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO samples ({COLUMNS}) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT (id) DO NOTHING"
        );
        let inserted = sqlx::query(&query)
            .bind(&new.id)
            .bind(&new.full_name)
            .bind(&new.nickname)
            .bind(new.latitude)
            .bind(new.longitude)
            .bind(new.timestamp.as_ref().map(format_timestamp))
            .bind(new.accuracy)
            .bind(&new.address)
            .bind(&new.country_code)
            .bind(new.charging)
            .bind(new.battery_level)
            .bind(format_timestamp(&Utc::now()))
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        let query = format!("SELECT {COLUMNS} FROM samples WHERE id = ?");
        let sample = sqlx::query_as::<_, Sample>(&query)
            .bind(&new.id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Ingested {
            sample,
            is_new: inserted,
        })
    }

    /// Find a sample by its content hash.
    pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Sample>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM samples WHERE id = ?");
        sqlx::query_as::<_, Sample>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Samples with a timestamp no older than `window` before now.
    pub async fn recent(
        pool: &SqlitePool,
        window: chrono::Duration,
    ) -> Result<Vec<Sample>, sqlx::Error> {
        Self::recent_since(pool, Utc::now() - window).await
    }

    /// Samples with a non-null timestamp at or after `cutoff`.
    pub async fn recent_since(
        pool: &SqlitePool,
        cutoff: Timestamp,
    ) -> Result<Vec<Sample>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM samples \
             WHERE timestamp IS NOT NULL AND timestamp >= ?"
        );
        sqlx::query_as::<_, Sample>(&query)
            .bind(format_timestamp(&cutoff))
            .fetch_all(pool)
            .await
    }

    /// Total number of stored samples.
    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM samples")
            .fetch_one(pool)
            .await
    }
}
