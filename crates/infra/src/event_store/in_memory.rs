use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chronicle_core::{AggregateId, DomainError, DomainEvent, Revision, Sequence};
use chronicle_events::Stream;

use super::r#trait::{AppendOutcome, StorageError, StreamStorage};

/// In-memory stream storage.
///
/// Intended for tests/dev. Streams are values, so the stored copy can never
/// be changed through a stream handed out by `load`. The revision hint on
/// `load` is ignored; the whole stream is always returned.
#[derive(Debug)]
pub struct InMemoryStreamStorage<E> {
    streams: RwLock<HashMap<AggregateId, Stream<E>>>,
}

impl<E> Default for InMemoryStreamStorage<E> {
    fn default() -> Self {
        Self {
            streams: RwLock::new(HashMap::new()),
        }
    }
}

impl<E> InMemoryStreamStorage<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted streams.
    ///
    /// Every write replaces a whole stream, so the map is still consistent
    /// after a writer panicked and the count is read through the poison.
    pub fn len(&self) -> usize {
        self.streams
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E: DomainEvent> StreamStorage<E> for InMemoryStreamStorage<E> {
    fn load(
        &self,
        aggregate_id: &AggregateId,
        _revision: Revision,
    ) -> Result<Stream<E>, StorageError> {
        let streams = self
            .streams
            .read()
            .map_err(|_| StorageError::Backend("lock poisoned".to_string()))?;

        streams
            .get(aggregate_id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(aggregate_id.clone()))
    }

    fn append(
        &self,
        stream: &Stream<E>,
        expected_head: Sequence,
    ) -> Result<AppendOutcome, StorageError> {
        let mut streams = self
            .streams
            .write()
            .map_err(|_| StorageError::Backend("lock poisoned".to_string()))?;

        let actual = streams
            .get(stream.aggregate_id())
            .map(Stream::head_sequence)
            .unwrap_or_else(Sequence::initial);

        if actual != expected_head {
            tracing::debug!(
                aggregate_id = %stream.aggregate_id(),
                expected = %expected_head,
                actual = %actual,
                "conditional append rejected"
            );
            return Ok(AppendOutcome::Conflict {
                expected: expected_head,
                actual,
            });
        }

        // The stream must move the head forward.
        if stream.head_sequence() <= expected_head {
            return Err(DomainError::SequenceViolation {
                expected: expected_head.increment(),
                found: stream.head_sequence(),
            }
            .into());
        }

        streams.insert(stream.aggregate_id().clone(), stream.clone());
        Ok(AppendOutcome::Appended)
    }
}
