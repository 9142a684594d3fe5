use chrono::{Duration, Utc};
use proxwatch_core::observation::{RawObservation, RawTimestamp};

/// Observation for `name` taken `secs_ago` seconds before now.
pub fn observation(name: &str, lat: f64, lon: f64, secs_ago: i64) -> RawObservation {
    let ts = Utc::now() - Duration::seconds(secs_ago);
    RawObservation {
        timestamp: Some(RawTimestamp::EpochMillis(ts.timestamp_millis())),
        ..RawObservation::new(name, lat, lon)
    }
}
