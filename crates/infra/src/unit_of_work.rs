//! Commit/checkout orchestration for event-sourced aggregates.
//!
//! A [`UnitOfWork`] checks aggregates out of a [`StreamStorage`], remembers the
//! stream each one was rebuilt from, and later commits the events the
//! aggregate recorded as a single new commit on that stream.
//!
//! ## Commit flow
//!
//! ```text
//! INIT
//!   ↓
//! APPEND_ATTEMPT ──ok──→ SUCCESS
//!   ↓ conflict
//! race limit reached? ──yes──→ ConcurrencyRaceLost
//!   ↓ no
//! reload + CONFLICT_CHECK ──conflicts──→ UnresolvableConflict
//!   ↓ none
//! resequence onto the reloaded head, back to APPEND_ATTEMPT
//! ```
//!
//! Storage is the only serialization point: an append is a compare-and-swap
//! on the stream's head sequence. When another writer wins the race, the
//! events it persisted are checked against ours with
//! [`DomainEvent::conflicts_with`]. Only if nothing conflicts are our events
//! renumbered and retried.

use std::marker::PhantomData;

use thiserror::Error;

use chronicle_core::{AggregateId, AggregateRoot, DomainError, DomainEvent, DomainEventSequence, Revision};
use chronicle_events::{CommitSequence, Metadata, Stream, StreamMap};

use crate::config::UnitOfWorkConfig;
use crate::event_store::{AppendOutcome, StorageError, StreamStorage};
use crate::stream_processor::StreamProcessor;

#[derive(Debug, Error)]
pub enum UnitOfWorkError<E: core::fmt::Debug> {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("stream for aggregate '{0}' has no commits")]
    EmptyStream(AggregateId),

    #[error("aggregate '{aggregate_id}' is at revision {actual}, not the requested {requested}")]
    RevisionMismatch {
        aggregate_id: AggregateId,
        requested: Revision,
        actual: Revision,
    },

    /// The aggregate has history but was not checked out through this unit of work.
    #[error("aggregate '{0}' was not checked out by this unit of work")]
    NotCheckedOut(AggregateId),

    #[error("gave up on aggregate '{aggregate_id}' after {attempts} lost write races")]
    ConcurrencyRaceLost {
        aggregate_id: AggregateId,
        lost_events: Vec<E>,
        attempts: u32,
    },

    #[error(
        "{} concurrently persisted events conflict with changes to aggregate '{aggregate_id}'",
        .conflicting_events.len()
    )]
    UnresolvableConflict {
        aggregate_id: AggregateId,
        conflicting_events: Vec<E>,
    },
}

/// Tracks checked-out aggregates and commits their recorded events.
///
/// Methods take `&mut self`; one unit of work belongs to one writer. Several
/// units of work may share a storage (e.g. through `Arc`).
pub struct UnitOfWork<A: AggregateRoot, S> {
    storage: S,
    processor: Option<Box<dyn StreamProcessor<A::Event>>>,
    tracked: StreamMap<A::Event>,
    config: UnitOfWorkConfig,
    _aggregate: PhantomData<fn() -> A>,
}

impl<A, S> UnitOfWork<A, S>
where
    A: AggregateRoot,
    S: StreamStorage<A::Event>,
{
    pub fn new(storage: S) -> Self {
        Self::with_config(storage, UnitOfWorkConfig::default())
    }

    pub fn with_config(storage: S, config: UnitOfWorkConfig) -> Self {
        Self {
            storage,
            processor: None,
            tracked: StreamMap::new(),
            config,
            _aggregate: PhantomData,
        }
    }

    /// Transform loaded streams before they are replayed.
    pub fn with_stream_processor(
        mut self,
        processor: impl StreamProcessor<A::Event> + 'static,
    ) -> Self {
        self.processor = Some(Box::new(processor));
        self
    }

    pub fn config(&self) -> &UnitOfWorkConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Whether a stream is currently tracked for `aggregate_id`.
    pub fn is_tracked(&self, aggregate_id: &AggregateId) -> bool {
        self.tracked.contains(aggregate_id)
    }

    /// Rebuild an aggregate from its persisted history.
    ///
    /// An empty `revision` means "latest"; a concrete one must equal the
    /// head revision of the stream. On success the loaded stream becomes the
    /// base of the next [`commit`](Self::commit) for this aggregate.
    pub fn checkout(
        &mut self,
        aggregate_id: &AggregateId,
        revision: Revision,
    ) -> Result<A, UnitOfWorkError<A::Event>> {
        tracing::debug!(aggregate_id = %aggregate_id, revision = %revision, "checking out aggregate");

        let stream = self.storage.load(aggregate_id, revision)?;
        if stream.is_empty() {
            return Err(UnitOfWorkError::EmptyStream(aggregate_id.clone()));
        }

        let history = match &self.processor {
            Some(processor) => processor.process(stream.clone()).history()?,
            None => stream.history()?,
        };

        if !revision.is_empty() && revision != history.head_revision() {
            return Err(UnitOfWorkError::RevisionMismatch {
                aggregate_id: aggregate_id.clone(),
                requested: revision,
                actual: history.head_revision(),
            });
        }

        let aggregate = A::reconstitute_from_history(aggregate_id.clone(), &history)?;
        self.tracked.register(stream);
        Ok(aggregate)
    }

    /// Persist the aggregate's tracked events as one new commit.
    ///
    /// Returns the commits this call added to the stream. On success the
    /// aggregate is no longer tracked; check it out again to keep writing.
    pub fn commit(
        &mut self,
        aggregate: &A,
        metadata: Metadata,
    ) -> Result<CommitSequence<A::Event>, UnitOfWorkError<A::Event>> {
        let aggregate_id = aggregate.identifier().clone();
        let tracked_events = aggregate.tracked_events();

        let mut base = self.base_stream(aggregate)?;
        let mut events = tracked_events.clone();
        let mut known = aggregate.revision();
        let mut races: u32 = 0;

        loop {
            let expected = base.head_sequence();
            let candidate = base.append_events(events.clone(), metadata.clone())?;

            tracing::debug!(
                aggregate_id = %aggregate_id,
                expected_head = %expected,
                events = events.len(),
                race = races,
                "appending commit"
            );

            match self.storage.append(&candidate, expected)? {
                AppendOutcome::Appended => {
                    self.tracked.unregister(&aggregate_id);
                    tracing::info!(
                        aggregate_id = %aggregate_id,
                        sequence = %candidate.head_sequence(),
                        revision = %candidate.head_revision(),
                        "commit persisted"
                    );
                    return Ok(candidate
                        .commit_range(expected.increment(), Some(candidate.head_sequence())));
                }
                AppendOutcome::Conflict { expected, actual } => {
                    races += 1;
                    tracing::warn!(
                        aggregate_id = %aggregate_id,
                        expected_head = %expected,
                        actual_head = %actual,
                        race = races,
                        "storage conflict"
                    );

                    if races > self.config.max_race_attempts {
                        tracing::warn!(aggregate_id = %aggregate_id, attempts = races, "write race lost");
                        return Err(UnitOfWorkError::ConcurrencyRaceLost {
                            aggregate_id,
                            lost_events: tracked_events.iter().cloned().collect(),
                            attempts: races,
                        });
                    }

                    let reloaded = self.storage.load(&aggregate_id, Revision::empty())?;
                    let persisted = reloaded.find_commits_since(known.increment());
                    let conflicting = conflicting_events(&persisted, tracked_events);
                    if !conflicting.is_empty() {
                        return Err(UnitOfWorkError::UnresolvableConflict {
                            aggregate_id,
                            conflicting_events: conflicting,
                        });
                    }

                    known = reloaded.head_revision();
                    events = tracked_events.resequence(known);
                    base = reloaded;
                }
            }
        }
    }

    fn base_stream(&mut self, aggregate: &A) -> Result<Stream<A::Event>, UnitOfWorkError<A::Event>> {
        let aggregate_id = aggregate.identifier();
        if let Some(stream) = self.tracked.get(aggregate_id) {
            return Ok(stream.clone());
        }

        // A brand-new aggregate starts its own stream.
        if aggregate.tracked_events().tail_revision().is_initial() {
            let stream = Stream::from_aggregate_id(aggregate_id.clone());
            self.tracked.register(stream.clone());
            return Ok(stream);
        }

        Err(UnitOfWorkError::NotCheckedOut(aggregate_id.clone()))
    }
}

/// Persisted events that make `ours` impossible to rebase.
///
/// From the first persisted event any of `ours` conflicts with, that event and
/// every later one are reported, each once, in stream order.
fn conflicting_events<E: DomainEvent>(
    persisted: &CommitSequence<E>,
    ours: &DomainEventSequence<E>,
) -> Vec<E> {
    let mut poisoned = false;
    let mut conflicting = Vec::new();
    for commit in persisted {
        for theirs in commit.event_log() {
            poisoned = poisoned || ours.iter().any(|mine| mine.conflicts_with(theirs));
            if poisoned {
                conflicting.push(theirs.clone());
            }
        }
    }
    conflicting
}
