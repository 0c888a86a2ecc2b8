//! Aggregate root capability for event-sourced domain models.

use crate::error::DomainResult;
use crate::event::DomainEvent;
use crate::event_sequence::DomainEventSequence;
use crate::id::AggregateId;
use crate::revision::Revision;

/// Aggregate root as seen by the unit of work.
///
/// Each aggregate type implements this directly; there is no registry of
/// aggregate types. The unit of work is generic over it and uses it to
/// rebuild instances from history and to read back what they recorded.
///
/// ## Revision
///
/// `revision()` is the revision the aggregate was reconstituted at, i.e. the
/// last persisted event it knows about. It does **not** include the events in
/// `tracked_events()`, which carry `revision().increment()` onwards.
pub trait AggregateRoot: Sized {
    type Event: DomainEvent;

    /// Rebuild an instance by replaying `history` in order.
    fn reconstitute_from_history(
        aggregate_id: AggregateId,
        history: &DomainEventSequence<Self::Event>,
    ) -> DomainResult<Self>;

    fn identifier(&self) -> &AggregateId;

    /// Last persisted revision known to this instance (empty if never persisted).
    fn revision(&self) -> Revision;

    /// Events recorded since reconstitution, not yet persisted.
    fn tracked_events(&self) -> &DomainEventSequence<Self::Event>;
}
