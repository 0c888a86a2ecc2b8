//! `chronicle-core`: event-sourcing domain building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identities, the two history counters, domain events and the ordered event
//! sequences aggregates produce and are rebuilt from.

pub mod aggregate;
pub mod error;
pub mod event;
pub mod event_sequence;
pub mod id;
pub mod revision;

pub use aggregate::AggregateRoot;
pub use error::{DomainError, DomainResult};
pub use event::DomainEvent;
pub use event_sequence::DomainEventSequence;
pub use id::AggregateId;
pub use revision::{Revision, Sequence};
