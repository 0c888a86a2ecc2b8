//! Ordered, immutable, revision-contiguous event lists.

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::error::{DomainError, DomainResult};
use crate::event::DomainEvent;
use crate::revision::Revision;

/// Ordered list of events of one aggregate with contiguous revisions.
///
/// Every mutator returns a new sequence; the receiver is never changed.
///
/// ## Continuity
///
/// Each pushed event must carry `head_revision().increment()`. An empty
/// sequence accepts any concrete revision as its first element, which is what
/// lets an aggregate at revision `n` track new events starting at `n + 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainEventSequence<E> {
    events: Vec<E>,
}

impl<E> Default for DomainEventSequence<E> {
    fn default() -> Self {
        Self { events: Vec::new() }
    }
}

impl<E> DomainEventSequence<E> {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, E> {
        self.events.iter()
    }

    pub fn first(&self) -> Option<&E> {
        self.events.first()
    }

    pub fn last(&self) -> Option<&E> {
        self.events.last()
    }

    pub fn as_slice(&self) -> &[E] {
        &self.events
    }
}

impl<E: DomainEvent> DomainEventSequence<E> {
    /// Build a sequence, validating continuity between consecutive events.
    pub fn from_events(events: impl IntoIterator<Item = E>) -> DomainResult<Self> {
        let mut sequence = Self::empty();
        for event in events {
            sequence.check_next(&event)?;
            sequence.events.push(event);
        }
        Ok(sequence)
    }

    /// Append one event.
    ///
    /// Fails with [`DomainError::ContinuityViolation`] unless the event's
    /// revision immediately follows the head revision, and with
    /// [`DomainError::AggregateMismatch`] if it belongs to another aggregate.
    pub fn push(&self, event: E) -> DomainResult<Self> {
        self.check_next(&event)?;
        let mut events = Vec::with_capacity(self.events.len() + 1);
        events.extend(self.events.iter().cloned());
        events.push(event);
        Ok(Self { events })
    }

    /// Concatenate `other` onto this sequence, validating the seam.
    pub fn append(&self, other: &Self) -> DomainResult<Self> {
        let mut sequence = self.clone();
        for event in other.iter() {
            sequence.check_next(event)?;
            sequence.events.push(event.clone());
        }
        Ok(sequence)
    }

    /// Copy with revisions rewritten to `base + 1 ..= base + len`, order kept.
    ///
    /// Used to rebase not-yet-persisted events onto a newer stream head.
    pub fn resequence(&self, base: Revision) -> Self {
        let mut next = base;
        let events = self
            .events
            .iter()
            .map(|event| {
                next = next.increment();
                event.with_revision(next)
            })
            .collect();
        Self { events }
    }

    /// Revision of the last event, empty when there are none.
    pub fn head_revision(&self) -> Revision {
        self.events
            .last()
            .map(DomainEvent::revision)
            .unwrap_or_else(Revision::empty)
    }

    /// Revision of the first event, empty when there are none.
    pub fn tail_revision(&self) -> Revision {
        self.events
            .first()
            .map(DomainEvent::revision)
            .unwrap_or_else(Revision::empty)
    }

    fn check_next(&self, event: &E) -> DomainResult<()> {
        let found = event.revision();
        match self.events.last() {
            None => {
                if found.is_empty() {
                    return Err(DomainError::continuity(Revision::empty().increment(), found));
                }
            }
            Some(head) => {
                if head.aggregate_id() != event.aggregate_id() {
                    return Err(DomainError::aggregate_mismatch(
                        head.aggregate_id(),
                        event.aggregate_id(),
                    ));
                }
                let Some(expected) = head.revision().checked_increment() else {
                    return Err(DomainError::continuity(head.revision(), found));
                };
                if found != expected {
                    return Err(DomainError::continuity(expected, found));
                }
            }
        }
        Ok(())
    }
}

impl<'a, E> IntoIterator for &'a DomainEventSequence<E> {
    type Item = &'a E;
    type IntoIter = core::slice::Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

impl<E> IntoIterator for DomainEventSequence<E> {
    type Item = E;
    type IntoIter = std::vec::IntoIter<E>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

impl<E: Serialize> Serialize for DomainEventSequence<E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.events)
    }
}

impl<'de, E> Deserialize<'de> for DomainEventSequence<E>
where
    E: DomainEvent + Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let events = Vec::<E>::deserialize(deserializer)?;
        Self::from_events(events).map_err(de::Error::custom)
    }
}
