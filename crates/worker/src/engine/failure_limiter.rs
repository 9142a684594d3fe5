//! Rate limiting for upstream-unavailability notifications.
//!
//! A persistent outage produces one failure mark and one notification per
//! cooldown window, however often the scheduler runs.

use chrono::Utc;
use proxwatch_core::failure_codes::FailureCode;
use proxwatch_db::models::upstream_failure::UpstreamFailure;
use proxwatch_db::repositories::UpstreamFailureRepo;
use proxwatch_db::DbPool;

use crate::error::EngineError;

pub struct FailureLimiter {
    pool: DbPool,
    cooldown: chrono::Duration,
}

impl FailureLimiter {
    pub fn new(pool: DbPool, cooldown: chrono::Duration) -> Self {
        Self { pool, cooldown }
    }

    /// Whether any failure was recorded within the trailing `window`.
    pub async fn recent_failures(&self, window: chrono::Duration) -> Result<bool, EngineError> {
        let cutoff = Utc::now() - window;
        Ok(UpstreamFailureRepo::exists_since(&self.pool, cutoff).await?)
    }

    /// Persist a failure mark. Unknown codes are rejected.
    pub async fn record_failure(&self, code: &str) -> Result<UpstreamFailure, EngineError> {
        let code: FailureCode = code.parse()?;
        Ok(UpstreamFailureRepo::record(&self.pool, code, Utc::now()).await?)
    }

    /// Record `code` and return `true` unless a failure was already recorded
    /// within the cooldown, in which case nothing is written.
    pub async fn should_notify(&self, code: FailureCode) -> Result<bool, EngineError> {
        if self.recent_failures(self.cooldown).await? {
            tracing::debug!(code = %code, "Upstream failure already reported within cooldown");
            return Ok(false);
        }
        self.record_failure(code.as_str()).await?;
        Ok(true)
    }
}
