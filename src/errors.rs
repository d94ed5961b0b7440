//! Crate error types.

use thiserror::Error;

/// Failures the analysis itself can produce. I/O-level failures around
/// report interchange are wrapped with context at the `io` module boundary.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The code model supplied a function without an obtainable body
    /// (metadata-only reference, abstract declaration).
    #[error("no body available for function `{0}`")]
    MissingBody(String),

    #[error("report serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
