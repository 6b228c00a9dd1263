//! Error types for the simulation engine.

use std::fmt;

/// Specific error types for LatencyLab's core engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The model failed validation upstream and must not be run. The core
    /// never produces this variant itself; it is here so collaborators
    /// (e.g. a model loader) can report failures through the same type.
    ModelInvalid(String),

    /// An internal inconsistency was detected while scheduling a run: an
    /// unknown task/event/context reference surfaced mid-run, or a sampled
    /// duration came back negative. Always a programmer error, never a
    /// data problem the caller can retry past.
    InvariantViolated(String),

    /// A batch was cancelled between runs. Carries no data of its own; the
    /// caller already has the partial `Vec<RunResult>` returned alongside.
    Cancelled,

    /// A `deadline_ms` was exceeded between runs.
    DeadlineExceeded,

    /// The legacy (schema v1) engine was requested but is not available in
    /// this build/configuration.
    LegacyUnavailable,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ModelInvalid(reason) => write!(f, "model invalid: {reason}"),
            Error::InvariantViolated(reason) => write!(f, "invariant violated: {reason}"),
            Error::Cancelled => write!(f, "batch cancelled between runs"),
            Error::DeadlineExceeded => write!(f, "deadline exceeded between runs"),
            Error::LegacyUnavailable => {
                write!(f, "legacy (schema v1) engine is not available")
            }
        }
    }
}

impl std::error::Error for Error {}
