use crate::id::AggregateId;
use crate::revision::Revision;

/// A revisioned fact recorded by an aggregate.
///
/// Events are:
/// - **immutable** (treat them as facts; `with_revision` returns a copy)
/// - **owned** by exactly one aggregate
/// - **revisioned**, forming a gapless history per aggregate
///
/// `conflicts_with` is a business rule supplied by the domain. It is consulted
/// after a lost write race to decide whether locally recorded events can be
/// replayed on top of events another writer persisted in the meantime.
pub trait DomainEvent: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event type identifier (e.g. "inventory.item.renamed").
    fn event_type(&self) -> &'static str;

    /// Aggregate this event belongs to.
    fn aggregate_id(&self) -> &AggregateId;

    /// Position of this event in the aggregate's history.
    fn revision(&self) -> Revision;

    /// Copy of this event at another revision, every other field preserved.
    fn with_revision(&self, revision: Revision) -> Self;

    /// Whether this event cannot be applied on top of `other`.
    fn conflicts_with(&self, other: &Self) -> bool;
}
