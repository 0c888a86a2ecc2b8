use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use chronicle_core::{
    AggregateId, DomainError, DomainEvent, DomainEventSequence, DomainResult, Revision, Sequence,
};

use crate::metadata::Metadata;

/// Type discriminator written with every serialized commit.
pub const COMMIT_IMPLEMENTOR: &str = "chronicle.commit";

/// An immutable batch of one or more events appended atomically to a stream.
///
/// ## Invariants
///
/// - the event log is non-empty and internally contiguous
/// - every event belongs to `aggregate_id`
/// - `sequence` is a concrete stream position (never the initial sentinel)
/// - `committed_at` is assigned once, at creation
#[derive(Debug, Clone, PartialEq)]
pub struct Commit<E> {
    aggregate_id: AggregateId,
    sequence: Sequence,
    event_log: DomainEventSequence<E>,
    committed_at: DateTime<Utc>,
    metadata: Metadata,
}

impl<E> Commit<E> {
    pub fn aggregate_id(&self) -> &AggregateId {
        &self.aggregate_id
    }

    /// Position of this commit within its stream.
    pub fn sequence(&self) -> Sequence {
        self.sequence
    }

    pub fn event_log(&self) -> &DomainEventSequence<E> {
        &self.event_log
    }

    pub fn committed_at(&self) -> DateTime<Utc> {
        self.committed_at
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}

impl<E: DomainEvent> Commit<E> {
    /// Create a commit stamped with the current time.
    pub fn make(
        aggregate_id: AggregateId,
        sequence: Sequence,
        event_log: DomainEventSequence<E>,
        metadata: Metadata,
    ) -> DomainResult<Self> {
        Self::restore(aggregate_id, sequence, event_log, Utc::now(), metadata)
    }

    /// Rebuild a previously persisted commit, keeping its original timestamp.
    pub fn restore(
        aggregate_id: AggregateId,
        sequence: Sequence,
        event_log: DomainEventSequence<E>,
        committed_at: DateTime<Utc>,
        metadata: Metadata,
    ) -> DomainResult<Self> {
        if event_log.is_empty() {
            return Err(DomainError::EmptyEventLog);
        }
        if sequence.is_initial() {
            return Err(DomainError::SequenceViolation {
                expected: Sequence::initial().increment(),
                found: sequence,
            });
        }
        if let Some(foreign) = event_log.iter().find(|e| e.aggregate_id() != &aggregate_id) {
            return Err(DomainError::aggregate_mismatch(
                &aggregate_id,
                foreign.aggregate_id(),
            ));
        }

        Ok(Self {
            aggregate_id,
            sequence,
            event_log,
            committed_at,
            metadata,
        })
    }

    /// Revision of the last event in this commit.
    pub fn head_revision(&self) -> Revision {
        self.event_log.head_revision()
    }

    /// Revision of the first event in this commit.
    pub fn tail_revision(&self) -> Revision {
        self.event_log.tail_revision()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CommitRecordRef<'a, E> {
    #[serde(rename = "@type")]
    kind: &'a str,
    aggregate_id: &'a AggregateId,
    sequence: Sequence,
    committed_at: &'a DateTime<Utc>,
    metadata: &'a Metadata,
    event_log: &'a DomainEventSequence<E>,
}

#[derive(Deserialize)]
#[serde(
    rename_all = "camelCase",
    bound(deserialize = "E: DomainEvent + Deserialize<'de>")
)]
struct CommitRecord<E> {
    #[serde(rename = "@type")]
    kind: String,
    aggregate_id: AggregateId,
    sequence: Sequence,
    committed_at: DateTime<Utc>,
    #[serde(default)]
    metadata: Metadata,
    event_log: DomainEventSequence<E>,
}

impl<E: Serialize> Serialize for Commit<E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        CommitRecordRef {
            kind: COMMIT_IMPLEMENTOR,
            aggregate_id: &self.aggregate_id,
            sequence: self.sequence,
            committed_at: &self.committed_at,
            metadata: &self.metadata,
            event_log: &self.event_log,
        }
        .serialize(serializer)
    }
}

impl<'de, E> Deserialize<'de> for Commit<E>
where
    E: DomainEvent + Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = CommitRecord::<E>::deserialize(deserializer)?;
        if record.kind != COMMIT_IMPLEMENTOR {
            return Err(de::Error::custom(format!(
                "unknown commit type '{}', expected '{COMMIT_IMPLEMENTOR}'",
                record.kind
            )));
        }
        Self::restore(
            record.aggregate_id,
            record.sequence,
            record.event_log,
            record.committed_at,
            record.metadata,
        )
        .map_err(de::Error::custom)
    }
}
