//! Durable history: commits, commit sequences and streams.
//!
//! Everything here is a value type. Appending to a [`Stream`] or
//! [`CommitSequence`] returns a new value; commits are shared between the old
//! and the new value and are never mutated.

pub mod commit;
pub mod commit_sequence;
pub mod metadata;
pub mod stream;
pub mod stream_map;

pub use commit::Commit;
pub use commit_sequence::CommitSequence;
pub use metadata::Metadata;
pub use stream::Stream;
pub use stream_map::StreamMap;

#[cfg(test)]
pub(crate) mod fixtures;
