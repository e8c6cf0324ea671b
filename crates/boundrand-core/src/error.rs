//! Sampling error types.

use thiserror::Error;

/// Top-level error type for bounded sampling.
#[derive(Debug, Error)]
pub enum SamplingError {
    /// The caller supplied an unusable argument (for example a bound of zero).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The entropy source was queried before it was seeded.
    #[error("entropy source is not initialized")]
    UninitializedEntropySource,

    /// A sampler configuration value is missing or invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The entropy source or its synchronization failed.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}
