use chrono::SecondsFormat;

/// Auto-increment primary keys (SQLite `INTEGER PRIMARY KEY`).
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Canonical text form used for every stored timestamp.
///
/// Fixed width (millisecond precision, `Z` suffix) so that lexicographic
/// comparison in SQL matches chronological order.
pub fn format_timestamp(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}
