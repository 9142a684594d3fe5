#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, FixedOffset, Utc};
use proxwatch_core::failure_codes::FailureCode;
use proxwatch_core::observation::{RawObservation, RawTimestamp};
use proxwatch_core::proximity::Thresholds;
use proxwatch_transport::{
    LocationSource, NotificationTransport, PositionRelay, PushError, RelayError, RelayPosition,
    UpstreamError,
};
use proxwatch_worker::{EngineContext, EngineSettings};
use sqlx::SqlitePool;

pub fn settings() -> EngineSettings {
    EngineSettings {
        thresholds: Thresholds::new(500.0, 1000.0).unwrap(),
        proximity_window: Duration::hours(1),
        failure_cooldown: Duration::hours(12),
        display_offset: FixedOffset::east_opt(3600).unwrap(),
    }
}

/// Observation for `name` taken `secs_ago` seconds before now.
pub fn observation(name: &str, lat: f64, lon: f64, secs_ago: i64) -> RawObservation {
    let ts = Utc::now() - Duration::seconds(secs_ago);
    RawObservation {
        timestamp: Some(RawTimestamp::EpochMillis(ts.timestamp_millis())),
        ..RawObservation::new(name, lat, lon)
    }
}

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

/// Location source returning a fixed batch, or failing on demand.
#[derive(Default)]
pub struct FakeSource {
    pub batch: Mutex<Vec<RawObservation>>,
    pub unavailable: AtomicBool,
    pub polls: Mutex<usize>,
}

impl FakeSource {
    pub fn with_batch(batch: Vec<RawObservation>) -> Arc<Self> {
        Arc::new(Self {
            batch: Mutex::new(batch),
            ..Self::default()
        })
    }

    pub fn failing() -> Arc<Self> {
        let source = Self::default();
        source.unavailable.store(true, Ordering::SeqCst);
        Arc::new(source)
    }
}

#[async_trait]
impl LocationSource for FakeSource {
    async fn poll(&self) -> Result<Vec<RawObservation>, UpstreamError> {
        *self.polls.lock().unwrap() += 1;
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(UpstreamError::unavailable(
                FailureCode::SourceUnreachable,
                "connection refused",
            ));
        }
        Ok(self.batch.lock().unwrap().clone())
    }
}

/// Relay that records positions and rejects names listed in `reject`.
#[derive(Default)]
pub struct FakeRelay {
    pub forwarded: Mutex<Vec<RelayPosition>>,
    pub reject: Vec<String>,
}

#[async_trait]
impl PositionRelay for FakeRelay {
    async fn forward(&self, position: &RelayPosition) -> Result<(), RelayError> {
        if self.reject.contains(&position.name) {
            return Err(RelayError::HttpStatus(503));
        }
        self.forwarded.lock().unwrap().push(position.clone());
        Ok(())
    }
}

/// Notifier that records messages, or fails every send while `failing`.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, i32)>>,
    pub failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(m, _)| m.clone())
            .collect()
    }
}

#[async_trait]
impl NotificationTransport for RecordingNotifier {
    async fn send(&self, message: &str, priority: i32) -> Result<(), PushError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PushError::HttpStatus(500));
        }
        self.sent.lock().unwrap().push((message.to_string(), priority));
        Ok(())
    }
}

/// Context over `pool` with a recording notifier.
pub fn context(pool: SqlitePool) -> (EngineContext, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let ctx = EngineContext::new(pool, settings()).with_notifier(notifier.clone());
    (ctx, notifier)
}
