//! Upstream failure mark model.

use proxwatch_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `upstream_failures` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct UpstreamFailure {
    pub id: DbId,
    pub code: String,
    pub created_at: Timestamp,
}
