//! Optional transformation applied to a loaded stream before replay.

use chronicle_events::Stream;

/// Rewrites a freshly loaded stream (e.g. upcasting old event shapes).
///
/// Implementations must keep the aggregate id and the commit order intact.
pub trait StreamProcessor<E>: Send + Sync {
    fn process(&self, stream: Stream<E>) -> Stream<E>;
}

impl<E, F> StreamProcessor<E> for F
where
    F: Fn(Stream<E>) -> Stream<E> + Send + Sync,
{
    fn process(&self, stream: Stream<E>) -> Stream<E> {
        self(stream)
    }
}
