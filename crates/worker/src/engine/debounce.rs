//! Debounce step: turn proximity histories into state-change notifications.
//!
//! Every evaluation reads the full history per pair of names, so an alert
//! whose delivery failed is retried on the next cycle. Alerts are keyed on
//! (trigger record, state) and persisted only after a successful send.

use std::collections::BTreeMap;

use chrono::FixedOffset;
use proxwatch_core::proximity::{detect_state_change, ProximityState, StateChange, Thresholds};
use proxwatch_core::types::{DbId, Timestamp};
use proxwatch_db::models::proximity::ProximityHistoryRow;
use proxwatch_db::repositories::{AlertRepo, ProximityRepo};

use crate::context::EngineContext;
use crate::error::EngineError;

/// Priority for state-change notifications.
const STATE_CHANGE_PRIORITY: i32 = 0;

/// One history entry with its classification.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedRecord {
    pub record_id: DbId,
    pub timestamp: Timestamp,
    pub distance_m: f64,
    pub state: ProximityState,
}

/// Outcome of evaluating one pair of people.
#[derive(Debug, Clone, PartialEq)]
pub struct PairEvaluation {
    /// Both names in lexicographic order.
    pub names: (String, String),
    /// Full history, oldest first.
    pub history: Vec<ClassifiedRecord>,
    /// Confirmed state change, if any, whether or not it was announced now.
    pub change: Option<ProximityState>,
    /// A notification was delivered during this evaluation.
    pub notified: bool,
}

pub type PairHistories = BTreeMap<(String, String), Vec<ProximityHistoryRow>>;

/// Group history rows by pair of names, each group sorted by timestamp.
pub fn group_by_pair(rows: Vec<ProximityHistoryRow>) -> PairHistories {
    let mut pairs: BTreeMap<_, Vec<ProximityHistoryRow>> = BTreeMap::new();
    for row in rows {
        pairs.entry(row.pair_key()).or_default().push(row);
    }
    for history in pairs.values_mut() {
        history.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
    }
    pairs
}

pub fn classify_history(
    rows: &[ProximityHistoryRow],
    thresholds: &Thresholds,
) -> Vec<ClassifiedRecord> {
    rows.iter()
        .map(|row| ClassifiedRecord {
            record_id: row.id,
            timestamp: row.timestamp,
            distance_m: row.spatial_distance,
            state: thresholds.classify(row.spatial_distance),
        })
        .collect()
}

/// Notification text: both names, the state and the trigger time in the
/// display timezone.
pub fn state_change_message(
    names: &(String, String),
    state: ProximityState,
    at: Timestamp,
    offset: &FixedOffset,
) -> String {
    let local = at.with_timezone(offset);
    format!(
        "{} and {} are {} ({})",
        names.0,
        names.1,
        state,
        local.format("%Y-%m-%d %H:%M %:z")
    )
}

/// Evaluate every pair and send notifications for new state changes.
///
/// A failure for one pair is logged and does not stop the others.
pub async fn evaluate_all(ctx: &EngineContext) -> Result<Vec<PairEvaluation>, EngineError> {
    let rows = ProximityRepo::list_history(&ctx.pool).await?;
    let mut evaluations = Vec::new();

    for (names, rows) in group_by_pair(rows) {
        let history = classify_history(&rows, &ctx.settings.thresholds);
        let states: Vec<ProximityState> = history.iter().map(|r| r.state).collect();
        let change = detect_state_change(&states).change();

        let notified = match change {
            Some(change) => match announce(ctx, &names, &history, change).await {
                Ok(notified) => notified,
                Err(e) => {
                    tracing::error!(
                        person1 = %names.0,
                        person2 = %names.1,
                        error = %e,
                        "Failed to evaluate pair"
                    );
                    false
                }
            },
            None => false,
        };

        evaluations.push(PairEvaluation {
            names,
            history,
            change: change.map(|c| c.state),
            notified,
        });
    }

    let sent = evaluations.iter().filter(|e| e.notified).count();
    tracing::info!(pairs = evaluations.len(), sent, "Debounce evaluation complete");

    Ok(evaluations)
}

/// Send and persist the alert for `change` unless it was already sent.
async fn announce(
    ctx: &EngineContext,
    names: &(String, String),
    history: &[ClassifiedRecord],
    change: StateChange,
) -> Result<bool, EngineError> {
    let Some(trigger) = history.get(change.trigger_index) else {
        return Ok(false);
    };

    if AlertRepo::exists(&ctx.pool, trigger.record_id, change.state).await? {
        return Ok(false);
    }

    let message = state_change_message(
        names,
        change.state,
        trigger.timestamp,
        &ctx.settings.display_offset,
    );

    if let Err(e) = ctx.notifier.send(&message, STATE_CHANGE_PRIORITY).await {
        tracing::warn!(
            record_id = trigger.record_id,
            state = %change.state,
            error = %e,
            "Notification failed, will retry on next evaluation"
        );
        return Ok(false);
    }

    AlertRepo::create(&ctx.pool, trigger.record_id, change.state).await?;
    tracing::info!(
        record_id = trigger.record_id,
        state = %change.state,
        person1 = %names.0,
        person2 = %names.1,
        "State change announced"
    );
    Ok(true)
}
