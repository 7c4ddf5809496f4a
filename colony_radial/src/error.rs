use thiserror::Error;

/// Failures the radial engine surfaces to its caller.
///
/// Skipped edges and empty files are not errors; they are reported through
/// `SkipTally` and `FileOutcome` instead.
#[derive(Error, Debug)]
pub enum RadialError {
    /// The configuration cannot produce meaningful elapsed times.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A worker task of the parallel pipeline went away before answering.
    #[error("worker pool failure: {0}")]
    WorkerPool(String),

    /// The batch was cancelled through its `CancelHandle`.
    #[error("radial analysis cancelled")]
    Cancelled,
}

impl RadialError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        RadialError::InvalidConfig(message.into())
    }

    pub fn worker_pool(message: impl Into<String>) -> Self {
        RadialError::WorkerPool(message.into())
    }
}
