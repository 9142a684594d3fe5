mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::Duration;
use common::{context, observation, FakeRelay, FakeSource};
use proxwatch_core::error::CoreError;
use proxwatch_core::failure_codes::FailureCode;
use proxwatch_db::repositories::{ForwardingRepo, LedgerRepo, UpstreamFailureRepo};
use proxwatch_worker::engine::failure_limiter::FailureLimiter;
use proxwatch_worker::engine::forward::{forward_pending, upload};
use proxwatch_worker::engine::ingest::ingest;
use proxwatch_worker::EngineError;
use sqlx::SqlitePool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn ingest_stores_new_observations_once(pool: SqlitePool) {
    let batch = vec![
        observation("Ada", 52.52, 13.405, 10),
        observation("Bob", 48.85, 2.35, 20),
    ];
    let (ctx, _) = context(pool.clone());
    let ctx = ctx.with_source(FakeSource::with_batch(batch));

    let first = ingest(&ctx).await.unwrap();
    let second = ingest(&ctx).await.unwrap();

    assert_eq!((first.polled, first.inserted), (2, 2));
    assert_eq!((second.inserted, second.duplicates), (0, 2));
    assert_eq!(LedgerRepo::count(&pool).await.unwrap(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn ingest_without_source_is_a_no_op(pool: SqlitePool) {
    let (ctx, _) = context(pool.clone());

    let summary = ingest(&ctx).await.unwrap();

    assert_eq!(summary.polled, 0);
    assert!(!summary.upstream_unavailable);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn persistent_outage_notifies_once_per_cooldown(pool: SqlitePool) {
    let source = FakeSource::failing();
    let (ctx, notifier) = context(pool.clone());
    let ctx = ctx.with_source(source.clone());

    let first = ingest(&ctx).await.unwrap();
    let second = ingest(&ctx).await.unwrap();

    assert!(first.upstream_unavailable && second.upstream_unavailable);
    assert_eq!(*source.polls.lock().unwrap(), 2);
    let messages = notifier.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("source_unreachable"));

    let latest = UpstreamFailureRepo::latest(&pool).await.unwrap().unwrap();
    assert_eq!(latest.code, "source_unreachable");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn limiter_signals_only_the_first_failure_in_window(pool: SqlitePool) {
    let limiter = FailureLimiter::new(pool, Duration::hours(12));

    assert!(!limiter.recent_failures(Duration::hours(12)).await.unwrap());
    assert!(limiter.should_notify(FailureCode::InvalidSession).await.unwrap());
    assert!(!limiter.should_notify(FailureCode::InvalidSession).await.unwrap());
    assert!(limiter.recent_failures(Duration::hours(1)).await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn limiter_with_zero_cooldown_always_notifies(pool: SqlitePool) {
    let limiter = FailureLimiter::new(pool, Duration::zero());

    assert!(limiter.should_notify(FailureCode::MalformedResponse).await.unwrap());
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    assert!(limiter.should_notify(FailureCode::MalformedResponse).await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_failure_code_is_rejected(pool: SqlitePool) {
    let limiter = FailureLimiter::new(pool.clone(), Duration::hours(12));

    assert_matches!(
        limiter.record_failure("server_on_fire").await,
        Err(EngineError::Core(CoreError::InvalidFailureCode(_)))
    );
    assert!(UpstreamFailureRepo::latest(&pool).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failed_relay_leaves_sample_pending(pool: SqlitePool) {
    let ada = LedgerRepo::ingest(&pool, &observation("Ada", 52.52, 13.405, 10))
        .await
        .unwrap()
        .sample;
    let bob = LedgerRepo::ingest(&pool, &observation("Bob", 48.85, 2.35, 20))
        .await
        .unwrap()
        .sample;
    let relay = Arc::new(FakeRelay {
        reject: vec!["Bob".into()],
        ..FakeRelay::default()
    });
    let (ctx, _) = context(pool.clone());
    let ctx = ctx.with_relay(relay.clone());

    let summary = forward_pending(&ctx).await.unwrap();

    assert_eq!((summary.pending, summary.forwarded, summary.failed), (2, 1, 1));
    assert!(ForwardingRepo::is_forwarded(&pool, &ada.id).await.unwrap());
    let pending = ForwardingRepo::pending(&pool).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, bob.id);

    let forwarded = relay.forwarded.lock().unwrap();
    assert_eq!(forwarded.len(), 1);
    assert_eq!(forwarded[0].name, "Ada");
    assert_eq!(forwarded[0].latitude, 52.52);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn forwarded_samples_are_not_sent_twice(pool: SqlitePool) {
    LedgerRepo::ingest(&pool, &observation("Ada", 52.52, 13.405, 10)).await.unwrap();
    let relay = Arc::new(FakeRelay::default());
    let (ctx, _) = context(pool.clone());
    let ctx = ctx.with_relay(relay.clone());

    forward_pending(&ctx).await.unwrap();
    let second = forward_pending(&ctx).await.unwrap();

    assert_eq!(second.pending, 0);
    assert_eq!(relay.forwarded.lock().unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn upload_without_relay_is_an_error(pool: SqlitePool) {
    LedgerRepo::ingest(&pool, &observation("Ada", 52.52, 13.405, 10)).await.unwrap();
    let (ctx, _) = context(pool.clone());

    assert_matches!(upload(&ctx).await, Err(EngineError::RelayNotConfigured));
    assert_eq!(ForwardingRepo::pending(&pool).await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn upload_with_relay_forwards_pending(pool: SqlitePool) {
    LedgerRepo::ingest(&pool, &observation("Ada", 52.52, 13.405, 10)).await.unwrap();
    let (ctx, _) = context(pool.clone());
    let ctx = ctx.with_relay(Arc::new(FakeRelay::default()));

    let summary = upload(&ctx).await.unwrap();

    assert_eq!((summary.pending, summary.forwarded), (1, 1));
}
