//! Proximity step: pairwise distances between the latest positions.

use std::collections::BTreeMap;

use proxwatch_core::geo::haversine_m;
use proxwatch_core::proximity::{midpoint, temporal_distance_secs, within_temporal_gate};
use proxwatch_db::models::proximity::NewProximityRecord;
use proxwatch_db::models::sample::Sample;
use proxwatch_db::repositories::{LedgerRepo, ProximityRepo};

use crate::context::EngineContext;
use crate::error::EngineError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProximitySummary {
    /// Distinct people with a timestamped sample in the window.
    pub people: usize,
    pub pairs_considered: usize,
    /// Pairs skipped because their timestamps were too far apart.
    pub skipped_gate: usize,
    /// Pairs whose exact sample pair was already recorded.
    pub already_recorded: usize,
    pub created: usize,
    pub failed: usize,
}

/// Latest timestamped sample per full name, ordered by name.
///
/// Equal timestamps are resolved by sample id so the choice is stable.
pub fn latest_per_person(samples: &[Sample]) -> Vec<&Sample> {
    let mut latest: BTreeMap<&str, &Sample> = BTreeMap::new();
    for sample in samples {
        let Some(ts) = sample.timestamp else {
            continue;
        };
        latest
            .entry(sample.full_name.as_str())
            .and_modify(|current| {
                if (Some(ts), &sample.id) > (current.timestamp, &current.id) {
                    *current = sample;
                }
            })
            .or_insert(sample);
    }
    latest.into_values().collect()
}

/// Create a proximity record for every gated pair of current positions that
/// has not been recorded yet.
pub async fn compute_proximities(ctx: &EngineContext) -> Result<ProximitySummary, EngineError> {
    let samples = LedgerRepo::recent(&ctx.pool, ctx.settings.proximity_window).await?;
    let people = latest_per_person(&samples);

    let mut summary = ProximitySummary {
        people: people.len(),
        ..ProximitySummary::default()
    };

    for (i, a) in people.iter().enumerate() {
        for b in &people[i + 1..] {
            summary.pairs_considered += 1;

            let (Some(ta), Some(tb)) = (a.timestamp, b.timestamp) else {
                continue;
            };
            if !within_temporal_gate(ta, tb) {
                summary.skipped_gate += 1;
                continue;
            }

            match record_pair(ctx, a, b).await {
                Ok(true) => summary.created += 1,
                Ok(false) => summary.already_recorded += 1,
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!(
                        person1 = %a.full_name,
                        person2 = %b.full_name,
                        error = %e,
                        "Failed to record proximity"
                    );
                }
            }
        }
    }

    tracing::info!(
        people = summary.people,
        created = summary.created,
        skipped_gate = summary.skipped_gate,
        "Proximity computation complete"
    );

    Ok(summary)
}

async fn record_pair(ctx: &EngineContext, a: &Sample, b: &Sample) -> Result<bool, EngineError> {
    if ProximityRepo::exists_for_pair(&ctx.pool, &a.id, &b.id).await? {
        return Ok(false);
    }

    let (Some(ta), Some(tb)) = (a.timestamp, b.timestamp) else {
        return Ok(false);
    };
    let spatial = haversine_m(a.latitude, a.longitude, b.latitude, b.longitude);
    let record = NewProximityRecord::new(
        &a.id,
        &b.id,
        spatial,
        temporal_distance_secs(ta, tb),
        midpoint(ta, tb),
    );

    let created = ProximityRepo::create(&ctx.pool, &record).await?;
    if let Some(row) = &created {
        tracing::debug!(
            record_id = row.id,
            person1 = %a.full_name,
            person2 = %b.full_name,
            spatial_m = row.spatial_distance,
            "Recorded proximity"
        );
    }
    Ok(created.is_some())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn sample(id: &str, name: &str, secs: Option<i64>) -> Sample {
        let base = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
        Sample {
            id: id.into(),
            full_name: name.into(),
            nickname: None,
            latitude: 0.0,
            longitude: 0.0,
            timestamp: secs.map(|s| base + Duration::seconds(s)),
            accuracy: None,
            address: None,
            country_code: None,
            charging: None,
            battery_level: None,
            created_at: base,
        }
    }

    #[test]
    fn latest_sample_wins_per_person() {
        let samples = vec![
            sample("a1", "Ada", Some(0)),
            sample("a2", "Ada", Some(60)),
            sample("b1", "Bob", Some(30)),
        ];
        let ids: Vec<&str> = latest_per_person(&samples)
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a2", "b1"]);
    }

    #[test]
    fn untimestamped_samples_are_ignored() {
        let samples = vec![sample("a1", "Ada", None), sample("b1", "Bob", Some(0))];
        let latest = latest_per_person(&samples);
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].full_name, "Bob");
    }

    #[test]
    fn timestamp_ties_resolve_by_id() {
        let samples = vec![sample("b", "Ada", Some(10)), sample("a", "Ada", Some(10))];
        assert_eq!(latest_per_person(&samples)[0].id, "b");
    }
}
