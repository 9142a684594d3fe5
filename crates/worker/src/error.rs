use proxwatch_core::error::CoreError;

/// Errors that abort an engine step.
///
/// Per-sample and per-pair failures never surface here; they are logged
/// and the step moves on to the next item.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("No position relay configured (set RELAY_HOST and RELAY_KEY)")]
    RelayNotConfigured,

    #[error("Setup failed: {0}")]
    Setup(String),
}
