use std::str::FromStr;
use std::time::Duration;

use chrono::FixedOffset;
use proxwatch_core::error::CoreError;
use proxwatch_core::proximity::Thresholds;

/// Default push endpoint when only credentials are configured.
const DEFAULT_PUSH_URL: &str = "https://api.pushover.net/1/messages.json";

/// Upper bound for the proximity window and failure cooldown (100 years).
const MAX_SPAN_SECS: i64 = 100 * 365 * 24 * 3600;

/// Upstream location feed settings.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamConfig {
    pub url: String,
    pub token: Option<String>,
}

/// Position relay settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayConfig {
    pub host: String,
    pub key: String,
}

/// Push transport settings.
#[derive(Debug, Clone, PartialEq)]
pub struct PushConfig {
    pub url: String,
    pub token: String,
    pub user: String,
}

/// Worker configuration loaded from environment variables.
///
/// Optional collaborators are `None` when their variables are unset: no
/// upstream means ingestion is skipped, no relay means forwarding is
/// skipped, and no push endpoint means notifications are only logged.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    pub thresholds: Thresholds,
    pub poll_interval: Duration,
    pub proximity_window: chrono::Duration,
    pub failure_cooldown: chrono::Duration,
    pub display_offset: FixedOffset,
    pub http_timeout: Duration,
    pub upstream: Option<UpstreamConfig>,
    pub relay: Option<RelayConfig>,
    pub push: Option<PushConfig>,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                 |
    /// |------------------------------|-------------------------|
    /// | `DATABASE_URL`               | `sqlite:./data/data.db` |
    /// | `CLOSE_THRESHOLD_M`          | `500`                   |
    /// | `FAR_THRESHOLD_M`            | `1000`                  |
    /// | `POLL_INTERVAL_SECS`         | `300`                   |
    /// | `PROXIMITY_WINDOW_SECS`      | `3600`                  |
    /// | `FAILURE_COOLDOWN_SECS`      | `43200`                 |
    /// | `DISPLAY_UTC_OFFSET_MINUTES` | `60`                    |
    /// | `HTTP_TIMEOUT_SECS`          | `10`                    |
    /// | `UPSTREAM_FEED_URL`, `UPSTREAM_TOKEN` | --         |
    /// | `RELAY_HOST`, `RELAY_KEY`    | --                      |
    /// | `PUSH_URL`, `PUSH_TOKEN`, `PUSH_USER` | --         |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let database_url = var("DATABASE_URL").unwrap_or_else(|| "sqlite:./data/data.db".into());

        let close: f64 = parse_or(&var, "CLOSE_THRESHOLD_M", 500.0)
            .map_err(|e| CoreError::InvalidThreshold(e.to_string()))?;
        let far: f64 = parse_or(&var, "FAR_THRESHOLD_M", 1000.0)
            .map_err(|e| CoreError::InvalidThreshold(e.to_string()))?;
        let thresholds = Thresholds::new(close, far)?;

        let poll_interval_secs: u64 = parse_or(&var, "POLL_INTERVAL_SECS", 300)?;
        if poll_interval_secs == 0 {
            return Err(CoreError::Validation(
                "POLL_INTERVAL_SECS must be greater than zero".into(),
            ));
        }
        let window_secs: i64 = parse_or(&var, "PROXIMITY_WINDOW_SECS", 3600)?;
        let cooldown_secs: i64 = parse_or(&var, "FAILURE_COOLDOWN_SECS", 43_200)?;
        let offset_minutes: i32 = parse_or(&var, "DISPLAY_UTC_OFFSET_MINUTES", 60)?;
        let http_timeout_secs: u64 = parse_or(&var, "HTTP_TIMEOUT_SECS", 10)?;

        if window_secs <= 0 || cooldown_secs < 0 {
            return Err(CoreError::Validation(
                "PROXIMITY_WINDOW_SECS must be positive and FAILURE_COOLDOWN_SECS non-negative"
                    .into(),
            ));
        }
        let proximity_window = span("PROXIMITY_WINDOW_SECS", window_secs)?;
        let failure_cooldown = span("FAILURE_COOLDOWN_SECS", cooldown_secs)?;

        let display_offset = offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "DISPLAY_UTC_OFFSET_MINUTES out of range: {offset_minutes}"
                ))
            })?;

        let upstream = var("UPSTREAM_FEED_URL").map(|url| UpstreamConfig {
            url,
            token: var("UPSTREAM_TOKEN"),
        });

        let relay = match (var("RELAY_HOST"), var("RELAY_KEY")) {
            (Some(host), Some(key)) => Some(RelayConfig { host, key }),
            (None, None) => None,
            _ => {
                return Err(CoreError::Validation(
                    "RELAY_HOST and RELAY_KEY must be set together".into(),
                ))
            }
        };

        let push = match (var("PUSH_TOKEN"), var("PUSH_USER")) {
            (Some(token), Some(user)) => Some(PushConfig {
                url: var("PUSH_URL").unwrap_or_else(|| DEFAULT_PUSH_URL.into()),
                token,
                user,
            }),
            (None, None) => None,
            _ => {
                return Err(CoreError::Validation(
                    "PUSH_TOKEN and PUSH_USER must be set together".into(),
                ))
            }
        };

        Ok(Self {
            database_url,
            thresholds,
            poll_interval: Duration::from_secs(poll_interval_secs),
            proximity_window,
            failure_cooldown,
            display_offset,
            http_timeout: Duration::from_secs(http_timeout_secs),
            upstream,
            relay,
            push,
        })
    }
}

/// A look-back span, bounded so `now - span` stays representable.
fn span(name: &str, secs: i64) -> Result<chrono::Duration, CoreError> {
    if secs > MAX_SPAN_SECS {
        return Err(CoreError::Validation(format!(
            "{name} exceeds {MAX_SPAN_SECS} seconds: {secs}"
        )));
    }
    chrono::Duration::try_seconds(secs)
        .ok_or_else(|| CoreError::Validation(format!("{name} out of range: {secs}")))
}

fn parse_or<T, F>(var: &F, name: &str, default: T) -> Result<T, CoreError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match var(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| CoreError::Validation(format!("{name} is invalid ({raw:?}): {e}"))),
        None => Ok(default),
    }
}
