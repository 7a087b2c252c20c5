//! Engine-wide error taxonomy.

use thiserror::Error;

use crate::curriculum::ContentKind;
use crate::storage::DatabaseError;

/// Errors surfaced by engine operations.
///
/// There is no "already granted" variant: an idempotent re-grant is a
/// normal outcome reported as `granted = false`, never an error.
/// `Database` errors are retryable; a mutation either fully happened or
/// did not, so callers may re-submit the same event.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed input, rejected before any state is touched
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A completion signal whose shape does not match the content kind
    #[error("Completion signal for {got} content does not apply to {expected} item")]
    KindMismatch {
        expected: ContentKind,
        got: ContentKind,
    },

    /// A signal for content the child cannot currently reach
    #[error("Not applicable: {0}")]
    NotApplicable(String),

    /// Persistence failure, safe to retry end to end
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl EngineError {
    pub fn not_applicable(msg: impl Into<String>) -> Self {
        EngineError::NotApplicable(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        EngineError::Validation(msg.into())
    }
}
