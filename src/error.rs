// Analytics error taxonomy

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// A caller-supplied parameter is out of range.
    #[error("invalid parameter: {0}")]
    Validation(String),

    /// Input did not satisfy an ordering or grouping precondition.
    #[error("precondition violated: {0}")]
    Precondition(String),

    #[error("event source failed: {0:#}")]
    Source(anyhow::Error),

    #[error("event fetch timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("computation cancelled")]
    Cancelled,

    #[error("analytics worker failed: {0}")]
    Worker(String),
}

impl AnalyticsError {
    pub fn validation(message: impl Into<String>) -> Self {
        AnalyticsError::Validation(message.into())
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        AnalyticsError::Precondition(message.into())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, AnalyticsError::Cancelled)
    }
}

impl From<tokio::task::JoinError> for AnalyticsError {
    fn from(err: tokio::task::JoinError) -> Self {
        AnalyticsError::Worker(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;

/// Returns `Cancelled` once the token has fired.
pub(crate) fn check_cancelled(cancel: &tokio_util::sync::CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        Err(AnalyticsError::Cancelled)
    } else {
        Ok(())
    }
}
