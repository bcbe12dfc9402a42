use thiserror::Error;

use crate::models::Source;

/// Errors surfaced to callers of [`Asker::ask`](crate::ask::Asker::ask).
#[derive(Debug, Error)]
pub enum AskError {
    /// Malformed request. Never retried.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Every record source was unreachable.
    #[error("corpus build failed: {0}")]
    BuildFailure(String),
}

/// A single adapter could not read its records. Absorbed by the
/// fail-soft policy in [`sources::collect_soft`](crate::sources::collect_soft).
#[derive(Debug, Error)]
#[error("{origin} source unavailable: {message}")]
pub struct SourceUnavailable {
    pub origin: Source,
    pub message: String,
}

impl SourceUnavailable {
    pub fn new(origin: Source, err: impl std::fmt::Display) -> Self {
        Self {
            origin,
            message: err.to_string(),
        }
    }
}
