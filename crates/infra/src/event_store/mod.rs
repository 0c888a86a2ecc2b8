//! Durable stream storage boundary.
//!
//! This module defines the compare-and-swap contract the unit of work relies
//! on, plus an in-memory reference backend.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryStreamStorage;
pub use r#trait::{AppendOutcome, StorageError, StreamStorage};
