//! Forwarding step: relay every pending sample downstream.

use proxwatch_db::models::sample::Sample;
use proxwatch_db::repositories::ForwardingRepo;
use proxwatch_transport::RelayPosition;

use crate::context::EngineContext;
use crate::error::EngineError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForwardSummary {
    pub pending: usize,
    pub forwarded: usize,
    pub failed: usize,
}

/// Relay payload for a stored sample.
pub fn relay_position(sample: &Sample) -> RelayPosition {
    RelayPosition {
        name: sample.full_name.clone(),
        latitude: sample.latitude,
        longitude: sample.longitude,
        accuracy: sample.accuracy,
        battery_level: sample.battery_level,
        timestamp: sample.timestamp,
    }
}

/// Explicit upload: like [`forward_pending`] but a missing relay is an error
/// instead of a skipped step.
pub async fn upload(ctx: &EngineContext) -> Result<ForwardSummary, EngineError> {
    if ctx.relay.is_none() {
        return Err(EngineError::RelayNotConfigured);
    }
    forward_pending(ctx).await
}

/// Forward all samples without a forwarded mark.
///
/// A failed relay call leaves the sample pending for the next cycle.
pub async fn forward_pending(ctx: &EngineContext) -> Result<ForwardSummary, EngineError> {
    let Some(relay) = &ctx.relay else {
        tracing::debug!("No position relay configured, skipping forwarding");
        return Ok(ForwardSummary::default());
    };

    let pending = ForwardingRepo::pending(&ctx.pool).await?;
    let mut summary = ForwardSummary {
        pending: pending.len(),
        ..ForwardSummary::default()
    };

    for sample in &pending {
        if let Err(e) = relay.forward(&relay_position(sample)).await {
            summary.failed += 1;
            tracing::warn!(sample_id = %sample.id, error = %e, "Relay failed, sample stays pending");
            continue;
        }

        match ForwardingRepo::mark_forwarded(&ctx.pool, &sample.id).await {
            Ok(_) => summary.forwarded += 1,
            Err(e) => {
                summary.failed += 1;
                tracing::error!(sample_id = %sample.id, error = %e, "Relayed sample could not be marked");
            }
        }
    }

    if summary.pending > 0 {
        tracing::info!(
            pending = summary.pending,
            forwarded = summary.forwarded,
            failed = summary.failed,
            "Forwarding complete"
        );
    }

    Ok(summary)
}
