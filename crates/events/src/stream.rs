//! The commit history of a single aggregate.

use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use chronicle_core::{
    AggregateId, DomainError, DomainEvent, DomainEventSequence, DomainResult, Revision, Sequence,
};

use crate::commit::{COMMIT_IMPLEMENTOR, Commit};
use crate::commit_sequence::CommitSequence;
use crate::metadata::Metadata;

/// Full ordered commit history of one aggregate identity.
///
/// A stream is a value: `append_events` and `append_commit` return a new
/// stream and leave the receiver as it was. Both versions share the commits
/// they have in common.
///
/// ## Derived state
///
/// - `head_sequence()`: sequence of the last commit, initial when empty
/// - `head_revision()`: aggregate revision of the last commit, empty when empty
#[derive(Debug, Clone, PartialEq)]
pub struct Stream<E> {
    aggregate_id: AggregateId,
    commit_sequence: CommitSequence<E>,
    commit_implementor: String,
}

impl<E> Stream<E> {
    /// An empty stream for `aggregate_id`.
    pub fn from_aggregate_id(aggregate_id: AggregateId) -> Self {
        Self {
            aggregate_id,
            commit_sequence: CommitSequence::empty(),
            commit_implementor: COMMIT_IMPLEMENTOR.to_string(),
        }
    }

    pub fn aggregate_id(&self) -> &AggregateId {
        &self.aggregate_id
    }

    pub fn commit_sequence(&self) -> &CommitSequence<E> {
        &self.commit_sequence
    }

    /// Name of the commit type this stream builds and accepts.
    pub fn commit_implementor(&self) -> &str {
        &self.commit_implementor
    }

    pub fn head(&self) -> Option<&Arc<Commit<E>>> {
        self.commit_sequence.head()
    }

    pub fn head_sequence(&self) -> Sequence {
        self.commit_sequence.head_sequence()
    }

    pub fn len(&self) -> usize {
        self.commit_sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commit_sequence.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Arc<Commit<E>>> {
        self.commit_sequence.iter()
    }

    /// Commits with sequence in `[from, to]`; `to` defaults to the head.
    pub fn commit_range(&self, from: Sequence, to: Option<Sequence>) -> CommitSequence<E> {
        let to = to.unwrap_or_else(|| self.head_sequence());
        self.commit_sequence.slice(from, to)
    }
}

impl<E: DomainEvent> Stream<E> {
    pub fn head_revision(&self) -> Revision {
        self.commit_sequence.head_revision()
    }

    /// Wrap `event_log` into the next commit and append it.
    pub fn append_events(
        &self,
        event_log: DomainEventSequence<E>,
        metadata: Metadata,
    ) -> DomainResult<Self> {
        let commit = Commit::make(
            self.aggregate_id.clone(),
            self.head_sequence().increment(),
            event_log,
            metadata,
        )?;
        self.append_commit(commit)
    }

    /// Append a prepared commit, subject to the commit sequence's continuity checks.
    pub fn append_commit(&self, commit: impl Into<Arc<Commit<E>>>) -> DomainResult<Self> {
        let commit = commit.into();
        if commit.aggregate_id() != &self.aggregate_id {
            return Err(DomainError::aggregate_mismatch(
                &self.aggregate_id,
                commit.aggregate_id(),
            ));
        }
        Ok(Self {
            aggregate_id: self.aggregate_id.clone(),
            commit_sequence: self.commit_sequence.push(commit)?,
            commit_implementor: self.commit_implementor.clone(),
        })
    }

    /// Commits whose tail revision is at or after `revision`, in order.
    ///
    /// Used to find what other writers persisted after a lost race.
    pub fn find_commits_since(&self, revision: Revision) -> CommitSequence<E> {
        self.commit_sequence
            .filtered(|c| c.tail_revision().is_greater_than_or_equal(&revision))
    }

    /// Every event of every commit, in stream order.
    pub fn history(&self) -> DomainResult<DomainEventSequence<E>> {
        self.commit_sequence.events()
    }
}

impl<'a, E> IntoIterator for &'a Stream<E> {
    type Item = &'a Arc<Commit<E>>;
    type IntoIter = core::slice::Iter<'a, Arc<Commit<E>>>;

    fn into_iter(self) -> Self::IntoIter {
        self.commit_sequence.iter()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StreamRecordRef<'a, E> {
    aggregate_id: &'a AggregateId,
    commit_sequence: &'a CommitSequence<E>,
    commit_implementor: &'a str,
}

fn default_commit_implementor() -> String {
    COMMIT_IMPLEMENTOR.to_string()
}

#[derive(Deserialize)]
#[serde(
    rename_all = "camelCase",
    bound(deserialize = "E: DomainEvent + Deserialize<'de>")
)]
struct StreamRecord<E> {
    aggregate_id: AggregateId,
    commit_sequence: CommitSequence<E>,
    #[serde(default = "default_commit_implementor")]
    commit_implementor: String,
}

impl<E: Serialize> Serialize for Stream<E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        StreamRecordRef {
            aggregate_id: &self.aggregate_id,
            commit_sequence: &self.commit_sequence,
            commit_implementor: &self.commit_implementor,
        }
        .serialize(serializer)
    }
}

impl<'de, E> Deserialize<'de> for Stream<E>
where
    E: DomainEvent + Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = StreamRecord::<E>::deserialize(deserializer)?;
        if record.commit_implementor != COMMIT_IMPLEMENTOR {
            return Err(de::Error::custom(format!(
                "unsupported commit implementor '{}'",
                record.commit_implementor
            )));
        }
        if let Some(foreign) = record
            .commit_sequence
            .iter()
            .find(|c| c.aggregate_id() != &record.aggregate_id)
        {
            return Err(de::Error::custom(DomainError::aggregate_mismatch(
                &record.aggregate_id,
                foreign.aggregate_id(),
            )));
        }
        Ok(Self {
            aggregate_id: record.aggregate_id,
            commit_sequence: record.commit_sequence,
            commit_implementor: record.commit_implementor,
        })
    }
}
