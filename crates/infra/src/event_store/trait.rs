use std::sync::Arc;

use thiserror::Error;

use chronicle_core::{AggregateId, DomainError, DomainEvent, Revision, Sequence};
use chronicle_events::Stream;

/// Result of a conditional append.
///
/// A conflict is an expected outcome of optimistic concurrency, not a
/// failure, so it is reported here rather than through [`StorageError`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The stream was persisted.
    Appended,
    /// The persisted head moved since the caller last observed it.
    Conflict { expected: Sequence, actual: Sequence },
}

impl AppendOutcome {
    pub fn is_conflict(&self) -> bool {
        matches!(self, AppendOutcome::Conflict { .. })
    }
}

/// Storage failure unrelated to concurrency.
///
/// None of these are retried by the unit of work.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("no stream found for aggregate '{0}'")]
    NotFound(AggregateId),

    #[error("storage backend failure: {0}")]
    Backend(String),

    #[error("stored stream is corrupted: {0}")]
    Corrupted(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Durable home of streams.
///
/// ## Append semantics
///
/// `append(stream, expected_head)` is a compare-and-swap on the persisted
/// head sequence: it must persist `stream` only if the currently persisted
/// head sequence of that aggregate equals `expected_head` (the initial
/// sequence meaning "no stream yet"), and otherwise return
/// [`AppendOutcome::Conflict`]. It never overwrites silently and must be
/// atomic with respect to concurrent appends.
///
/// ## Load semantics
///
/// `load(id, revision)` returns the persisted stream or
/// [`StorageError::NotFound`]. A non-empty `revision` is a hint that the
/// caller only needs history up to that revision; implementations may ignore
/// it.
///
/// Timeouts, if any, are the implementation's concern.
pub trait StreamStorage<E: DomainEvent>: Send + Sync {
    fn load(
        &self,
        aggregate_id: &AggregateId,
        revision: Revision,
    ) -> Result<Stream<E>, StorageError>;

    fn append(
        &self,
        stream: &Stream<E>,
        expected_head: Sequence,
    ) -> Result<AppendOutcome, StorageError>;
}

impl<E, S> StreamStorage<E> for Arc<S>
where
    E: DomainEvent,
    S: StreamStorage<E> + ?Sized,
{
    fn load(
        &self,
        aggregate_id: &AggregateId,
        revision: Revision,
    ) -> Result<Stream<E>, StorageError> {
        (**self).load(aggregate_id, revision)
    }

    fn append(
        &self,
        stream: &Stream<E>,
        expected_head: Sequence,
    ) -> Result<AppendOutcome, StorageError> {
        (**self).append(stream, expected_head)
    }
}
