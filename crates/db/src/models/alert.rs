//! Proximity alert model.

use proxwatch_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `proximity_alerts` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ProximityAlert {
    pub id: DbId,
    pub proximity_record_id: DbId,
    /// `close` or `far`.
    pub state: String,
    pub created_at: Timestamp,
}
