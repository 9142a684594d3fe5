//! Ingestion step: poll the upstream source and store new samples.

use proxwatch_db::repositories::LedgerRepo;
use proxwatch_transport::UpstreamError;

use super::failure_limiter::FailureLimiter;
use crate::context::EngineContext;
use crate::error::EngineError;

/// Priority for "location source unavailable" notifications.
const FAILURE_PRIORITY: i32 = 0;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub polled: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub failed: usize,
    /// The source could not be polled this cycle.
    pub upstream_unavailable: bool,
}

/// Poll once and ingest every observation.
///
/// An unavailable source is not an error: the limiter decides whether to
/// notify and the cycle continues with what is already stored.
pub async fn ingest(ctx: &EngineContext) -> Result<IngestSummary, EngineError> {
    let Some(source) = &ctx.source else {
        tracing::debug!("No upstream source configured, skipping ingestion");
        return Ok(IngestSummary::default());
    };

    let observations = match source.poll().await {
        Ok(observations) => observations,
        Err(e) => {
            tracing::warn!(error = %e, "Upstream location source unavailable");
            report_upstream_failure(ctx, &e).await?;
            return Ok(IngestSummary {
                upstream_unavailable: true,
                ..IngestSummary::default()
            });
        }
    };

    let mut summary = IngestSummary {
        polled: observations.len(),
        ..IngestSummary::default()
    };

    for obs in &observations {
        match LedgerRepo::ingest(&ctx.pool, obs).await {
            Ok(ingested) if ingested.is_new => {
                summary.inserted += 1;
                tracing::debug!(
                    sample_id = %ingested.sample.id,
                    person = %ingested.sample.full_name,
                    has_timestamp = ingested.sample.timestamp.is_some(),
                    "Stored new sample"
                );
            }
            Ok(_) => summary.duplicates += 1,
            Err(e) => {
                summary.failed += 1;
                tracing::error!(person = %obs.full_name, error = %e, "Failed to store observation");
            }
        }
    }

    tracing::info!(
        polled = summary.polled,
        inserted = summary.inserted,
        duplicates = summary.duplicates,
        failed = summary.failed,
        "Ingestion complete"
    );

    Ok(summary)
}

async fn report_upstream_failure(
    ctx: &EngineContext,
    error: &UpstreamError,
) -> Result<(), EngineError> {
    let limiter = FailureLimiter::new(ctx.pool.clone(), ctx.settings.failure_cooldown);
    if !limiter.should_notify(error.code()).await? {
        return Ok(());
    }

    let message = format!("Location updates are failing: {error}");
    if let Err(e) = ctx.notifier.send(&message, FAILURE_PRIORITY).await {
        tracing::error!(error = %e, "Failed to send upstream failure notification");
    }
    Ok(())
}
