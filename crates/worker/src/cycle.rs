//! One full engine cycle: ingest, forward, compute proximity, debounce.

use crate::context::EngineContext;
use crate::engine::debounce::{self, PairEvaluation};
use crate::engine::forward::{self, ForwardSummary};
use crate::engine::ingest::{self, IngestSummary};
use crate::engine::proximity::{self, ProximitySummary};
use crate::error::EngineError;

/// What each step of a cycle did.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub ingest: IngestSummary,
    pub forward: ForwardSummary,
    pub proximity: ProximitySummary,
    pub evaluations: Vec<PairEvaluation>,
}

impl CycleReport {
    /// Number of notifications delivered by the debounce step.
    pub fn notifications_sent(&self) -> usize {
        self.evaluations.iter().filter(|e| e.notified).count()
    }
}

/// Run the steps in order. The first step-level error aborts the cycle;
/// the next cycle starts over from stored state.
pub async fn run_cycle(ctx: &EngineContext) -> Result<CycleReport, EngineError> {
    let ingest = ingest::ingest(ctx)
        .await
        .inspect_err(|e| tracing::error!(step = "ingest", error = %e, "Cycle step failed"))?;
    let forward = forward::forward_pending(ctx)
        .await
        .inspect_err(|e| tracing::error!(step = "forward", error = %e, "Cycle step failed"))?;
    let proximity = proximity::compute_proximities(ctx)
        .await
        .inspect_err(|e| tracing::error!(step = "proximity", error = %e, "Cycle step failed"))?;
    let evaluations = debounce::evaluate_all(ctx)
        .await
        .inspect_err(|e| tracing::error!(step = "debounce", error = %e, "Cycle step failed"))?;

    let report = CycleReport {
        ingest,
        forward,
        proximity,
        evaluations,
    };

    tracing::info!(
        inserted = report.ingest.inserted,
        forwarded = report.forward.forwarded,
        proximities = report.proximity.created,
        notifications = report.notifications_sent(),
        "Cycle complete"
    );

    Ok(report)
}
