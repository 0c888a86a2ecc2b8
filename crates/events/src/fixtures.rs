//! Test event type shared by this crate's unit tests.

use chronicle_core::{AggregateId, DomainEvent, DomainEventSequence, Revision};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "@type")]
pub enum TestEvent {
    #[serde(rename = "test.opened")]
    Opened {
        aggregate_id: AggregateId,
        revision: Revision,
    },
    #[serde(rename = "test.noted")]
    Noted {
        aggregate_id: AggregateId,
        revision: Revision,
        field: String,
    },
}

impl DomainEvent for TestEvent {
    fn event_type(&self) -> &'static str {
        match self {
            TestEvent::Opened { .. } => "test.opened",
            TestEvent::Noted { .. } => "test.noted",
        }
    }

    fn aggregate_id(&self) -> &AggregateId {
        match self {
            TestEvent::Opened { aggregate_id, .. } | TestEvent::Noted { aggregate_id, .. } => {
                aggregate_id
            }
        }
    }

    fn revision(&self) -> Revision {
        match self {
            TestEvent::Opened { revision, .. } | TestEvent::Noted { revision, .. } => *revision,
        }
    }

    fn with_revision(&self, revision: Revision) -> Self {
        let mut copy = self.clone();
        match &mut copy {
            TestEvent::Opened { revision: r, .. } | TestEvent::Noted { revision: r, .. } => {
                *r = revision
            }
        }
        copy
    }

    fn conflicts_with(&self, other: &Self) -> bool {
        match (self, other) {
            (TestEvent::Noted { field: a, .. }, TestEvent::Noted { field: b, .. }) => a == b,
            _ => false,
        }
    }
}

pub fn test_id() -> AggregateId {
    AggregateId::new("stream-1").unwrap()
}

pub fn noted(revision: u64, field: &str) -> TestEvent {
    TestEvent::Noted {
        aggregate_id: test_id(),
        revision: Revision::new(revision),
        field: field.to_string(),
    }
}

/// Event log covering `from..=to`, starting with `Opened` when `from == 1`.
pub fn log(from: u64, to: u64) -> DomainEventSequence<TestEvent> {
    DomainEventSequence::from_events((from..=to).map(|revision| {
        if revision == 1 {
            TestEvent::Opened {
                aggregate_id: test_id(),
                revision: Revision::new(1),
            }
        } else {
            noted(revision, &format!("field-{revision}"))
        }
    }))
    .unwrap()
}
