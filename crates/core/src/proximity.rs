//! Proximity classification and the notification debounce rules.
//!
//! A pair of people produces a time series of distance measurements. Each
//! measurement is classified against two independent thresholds into
//! [`ProximityState`], and [`detect_state_change`] decides whether the tail
//! of that series is a confirmed transition worth announcing.

use std::fmt;

use chrono::Duration;

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum timestamp difference for two observations to be compared.
pub const TEMPORAL_GATE_SECS: i64 = 300;

/// Number of most recent records per pair considered by the debouncer.
pub const HISTORY_LEN: usize = 4;

/// Number of agreeing non-neutral readings required to confirm a state.
pub const CONFIRMATION_LEN: usize = 2;

/// A label seen at least this often in the history is a steady state that
/// has already been announced.
pub const STEADY_STATE_MIN: usize = 3;

// ---------------------------------------------------------------------------
// ProximityState
// ---------------------------------------------------------------------------

/// Classification of a single distance measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProximityState {
    Close,
    Far,
    Neutral,
}

impl ProximityState {
    /// String representation for database storage and messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProximityState::Close => "close",
            ProximityState::Far => "far",
            ProximityState::Neutral => "neutral",
        }
    }

    /// Whether this label can confirm a state change.
    pub fn is_decisive(&self) -> bool {
        !matches!(self, ProximityState::Neutral)
    }
}

impl fmt::Display for ProximityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// Distance thresholds in meters.
///
/// The two values are independent: `close` need not be below `far`. When
/// both comparisons match, `close` wins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    close_m: f64,
    far_m: f64,
}

impl Thresholds {
    /// Validate and build a threshold pair.
    pub fn new(close_m: f64, far_m: f64) -> Result<Self, CoreError> {
        validate_threshold(close_m, "close")?;
        validate_threshold(far_m, "far")?;
        Ok(Self { close_m, far_m })
    }

    pub fn close_m(&self) -> f64 {
        self.close_m
    }

    pub fn far_m(&self) -> f64 {
        self.far_m
    }

    /// Classify a distance in meters.
    pub fn classify(&self, distance_m: f64) -> ProximityState {
        if distance_m < self.close_m {
            ProximityState::Close
        } else if distance_m > self.far_m {
            ProximityState::Far
        } else {
            ProximityState::Neutral
        }
    }
}

fn validate_threshold(value: f64, name: &str) -> Result<(), CoreError> {
    if !value.is_finite() || value < 0.0 {
        return Err(CoreError::InvalidThreshold(format!(
            "{name} must be a finite, non-negative distance in meters, got {value}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Pair timing
// ---------------------------------------------------------------------------

/// Absolute time between two observations, in seconds.
pub fn temporal_distance_secs(t1: Timestamp, t2: Timestamp) -> f64 {
    (t2 - t1).num_milliseconds().abs() as f64 / 1000.0
}

/// Whether two observations are close enough in time to be compared.
pub fn within_temporal_gate(t1: Timestamp, t2: Timestamp) -> bool {
    (t2 - t1).num_milliseconds().abs() <= TEMPORAL_GATE_SECS * 1000
}

/// Representative timestamp of a pair: `t1 + (t2 - t1) / 2`.
pub fn midpoint(t1: Timestamp, t2: Timestamp) -> Timestamp {
    t1 + Duration::milliseconds((t2 - t1).num_milliseconds() / 2)
}

// ---------------------------------------------------------------------------
// Debounce
// ---------------------------------------------------------------------------

/// A confirmed transition found at the tail of a classified history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    /// The state that was entered.
    pub state: ProximityState,
    /// Index into the evaluated slice of the record that triggers the alert.
    pub trigger_index: usize,
}

/// Outcome of evaluating a pair's recent history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// No two agreeing decisive readings at the tail.
    NoCandidate,
    /// The candidate state has already been the dominant label long enough.
    SteadyState(ProximityState),
    /// A fresh transition that should be announced.
    Changed(StateChange),
}

impl Decision {
    pub fn change(&self) -> Option<StateChange> {
        match self {
            Decision::Changed(change) => Some(*change),
            _ => None,
        }
    }
}

/// Evaluate a chronologically ordered history of labels.
///
/// Only the last [`HISTORY_LEN`] labels are considered. Indices in the
/// returned [`StateChange`] refer to the full `labels` slice.
pub fn detect_state_change(labels: &[ProximityState]) -> Decision {
    let offset = labels.len().saturating_sub(HISTORY_LEN);
    let kept = &labels[offset..];

    let decisive: Vec<(usize, ProximityState)> = kept
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, state)| state.is_decisive())
        .collect();

    let tail = &decisive[decisive.len().saturating_sub(CONFIRMATION_LEN)..];
    if tail.len() != CONFIRMATION_LEN || tail.iter().any(|(_, s)| *s != tail[0].1) {
        return Decision::NoCandidate;
    }

    let (trigger_index, state) = tail[CONFIRMATION_LEN - 1];

    let occurrences = kept.iter().filter(|s| **s == state).count();
    if occurrences >= STEADY_STATE_MIN {
        return Decision::SteadyState(state);
    }

    Decision::Changed(StateChange {
        state,
        trigger_index: offset + trigger_index,
    })
}
