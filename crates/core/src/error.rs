#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),

    #[error("Invalid failure code: {0}")]
    InvalidFailureCode(String),

    #[error("Validation failed: {0}")]
    Validation(String),
}
