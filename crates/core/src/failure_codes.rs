//! Upstream failure codes recorded by the failure-rate limiter.
//!
//! These must match the `CHECK` constraint in
//! `20261019000005_create_upstream_failures_table.sql`.

use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Why the upstream location source could not be polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCode {
    /// Credentials were rejected (expired cookies, revoked token).
    InvalidSession,
    /// The source could not be reached at all (DNS, timeout, 5xx).
    SourceUnreachable,
    /// The source answered but the payload could not be decoded.
    MalformedResponse,
}

impl FailureCode {
    pub const ALL: [FailureCode; 3] = [
        FailureCode::InvalidSession,
        FailureCode::SourceUnreachable,
        FailureCode::MalformedResponse,
    ];

    /// String representation for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureCode::InvalidSession => "invalid_session",
            FailureCode::SourceUnreachable => "source_unreachable",
            FailureCode::MalformedResponse => "malformed_response",
        }
    }
}

impl FromStr for FailureCode {
    type Err = CoreError;

    /// Unknown codes are rejected rather than mapped to a default.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FailureCode::ALL
            .into_iter()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| CoreError::InvalidFailureCode(s.to_string()))
    }
}

impl fmt::Display for FailureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
