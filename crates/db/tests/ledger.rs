//! Integration tests for the sample ledger.

mod common;

use chrono::Duration;
use proxwatch_core::observation::{RawObservation, RawTimestamp};
use proxwatch_db::repositories::LedgerRepo;
use sqlx::SqlitePool;

use common::observation;

// ---------------------------------------------------------------------------
// Ingest
// ---------------------------------------------------------------------------

/// Ingesting the same observation twice stores one row and returns the same id.
#[sqlx::test(migrations = "../../db/migrations")]
async fn ingest_is_idempotent(pool: SqlitePool) {
    let obs = observation("Ada Lovelace", 51.5, -0.12, 30);

    let first = LedgerRepo::ingest(&pool, &obs).await.unwrap();
    let second = LedgerRepo::ingest(&pool, &obs).await.unwrap();

    assert!(first.is_new);
    assert!(!second.is_new);
    assert_eq!(first.sample.id, second.sample.id);
    assert_eq!(first.sample, second.sample);
    assert_eq!(LedgerRepo::count(&pool).await.unwrap(), 1);
}

/// Observations that differ in any attribute get distinct ids.
#[sqlx::test(migrations = "../../db/migrations")]
async fn distinct_observations_get_distinct_rows(pool: SqlitePool) {
    let obs = observation("Ada Lovelace", 51.5, -0.12, 30);
    let mut charging = obs.clone();
    charging.charging = Some(true);

    let a = LedgerRepo::ingest(&pool, &obs).await.unwrap();
    let b = LedgerRepo::ingest(&pool, &charging).await.unwrap();

    assert_ne!(a.sample.id, b.sample.id);
    assert_eq!(LedgerRepo::count(&pool).await.unwrap(), 2);
}

/// All optional attributes survive the round trip through SQLite.
#[sqlx::test(migrations = "../../db/migrations")]
async fn ingest_stores_all_attributes(pool: SqlitePool) {
    let obs = RawObservation {
        nickname: Some("Ada".into()),
        accuracy: Some(15.5),
        address: Some("12 St James's Square, London".into()),
        country_code: Some("GB".into()),
        charging: Some(false),
        battery_level: Some(64),
        ..observation("Ada Lovelace", 51.5074, -0.1278, 10)
    };

    let stored = LedgerRepo::ingest(&pool, &obs).await.unwrap().sample;
    let found = LedgerRepo::find_by_id(&pool, &stored.id).await.unwrap().unwrap();

    assert_eq!(found.id, obs.content_id());
    assert_eq!(found.nickname.as_deref(), Some("Ada"));
    assert_eq!(found.accuracy, Some(15.5));
    assert_eq!(found.country_code.as_deref(), Some("GB"));
    assert_eq!(found.charging, Some(false));
    assert_eq!(found.battery_level, Some(64));
    assert_eq!(
        found.timestamp.map(|t| t.timestamp_millis()),
        obs.parsed_timestamp().map(|t| t.timestamp_millis())
    );
}

/// A malformed timestamp is stored as null but the sample is still created.
#[sqlx::test(migrations = "../../db/migrations")]
async fn malformed_timestamp_is_stored_as_null(pool: SqlitePool) {
    let obs = RawObservation {
        timestamp: Some(RawTimestamp::Text("not a time".into())),
        ..RawObservation::new("Bob", 48.1, 11.5)
    };

    let stored = LedgerRepo::ingest(&pool, &obs).await.unwrap().sample;

    assert_eq!(stored.timestamp, None);
    assert_eq!(LedgerRepo::count(&pool).await.unwrap(), 1);
}

// ---------------------------------------------------------------------------
// Recent window
// ---------------------------------------------------------------------------

/// `recent` excludes samples outside the window and samples without a timestamp.
#[sqlx::test(migrations = "../../db/migrations")]
async fn recent_filters_by_window_and_null_timestamp(pool: SqlitePool) {
    let fresh = LedgerRepo::ingest(&pool, &observation("Ada", 1.0, 1.0, 60))
        .await
        .unwrap();
    LedgerRepo::ingest(&pool, &observation("Bob", 1.0, 1.0, 7200))
        .await
        .unwrap();
    LedgerRepo::ingest(&pool, &RawObservation::new("Cy", 1.0, 1.0))
        .await
        .unwrap();

    let recent = LedgerRepo::recent(&pool, Duration::hours(1)).await.unwrap();

    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].id, fresh.sample.id);
}
