//! Domain error model.

use thiserror::Error;

use crate::id::AggregateId;
use crate::revision::{Revision, Sequence};

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic failures (validation, history
/// continuity, invariants). Storage and concurrency outcomes belong to the
/// infrastructure layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An identifier was invalid (e.g. empty).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A revision gap or duplicate inside an event or commit sequence.
    #[error("continuity violation: expected revision {expected}, found {found}")]
    ContinuityViolation { expected: Revision, found: Revision },

    /// A commit was pushed out of stream order.
    #[error("sequence violation: expected sequence {expected}, found {found}")]
    SequenceViolation { expected: Sequence, found: Sequence },

    /// A commit must bundle at least one event.
    #[error("commit event log must not be empty")]
    EmptyEventLog,

    /// An event or commit belongs to a different aggregate than its container.
    #[error("aggregate mismatch: expected '{expected}', found '{found}'")]
    AggregateMismatch {
        expected: AggregateId,
        found: AggregateId,
    },

    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl DomainError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn continuity(expected: Revision, found: Revision) -> Self {
        Self::ContinuityViolation { expected, found }
    }

    pub fn aggregate_mismatch(expected: &AggregateId, found: &AggregateId) -> Self {
        Self::AggregateMismatch {
            expected: expected.clone(),
            found: found.clone(),
        }
    }
}
