use std::collections::HashMap;

use chronicle_core::AggregateId;

use crate::stream::Stream;

/// Streams currently checked out, keyed by aggregate.
///
/// Transient registry owned by a single unit of work; it is never persisted.
#[derive(Debug)]
pub struct StreamMap<E> {
    streams: HashMap<AggregateId, Stream<E>>,
}

impl<E> Default for StreamMap<E> {
    fn default() -> Self {
        Self {
            streams: HashMap::new(),
        }
    }
}

impl<E> StreamMap<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `stream`, returning the entry it replaced.
    pub fn register(&mut self, stream: Stream<E>) -> Option<Stream<E>> {
        self.streams.insert(stream.aggregate_id().clone(), stream)
    }

    pub fn unregister(&mut self, aggregate_id: &AggregateId) -> Option<Stream<E>> {
        self.streams.remove(aggregate_id)
    }

    pub fn get(&self, aggregate_id: &AggregateId) -> Option<&Stream<E>> {
        self.streams.get(aggregate_id)
    }

    pub fn contains(&self, aggregate_id: &AggregateId) -> bool {
        self.streams.contains_key(aggregate_id)
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}
