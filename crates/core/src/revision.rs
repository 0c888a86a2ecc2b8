//! History counters: event revisions and commit sequences.
//!
//! Both counters share one algebra (ordered, incrementable, with a sentinel
//! that sorts before every concrete value) but count different things: a
//! [`Revision`] is the position of a single event in an aggregate's history,
//! a [`Sequence`] the position of a commit within a stream. One commit may
//! bundle many events, so the two are kept apart.

use serde::{Deserialize, Serialize};

/// Position of an individual domain event in an aggregate's history.
///
/// Concrete revisions start at 1. The empty revision denotes "never
/// persisted" and, as a checkout target, "latest".
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(Option<u64>);

/// Position of a commit within a stream.
///
/// Concrete sequences start at 1; the initial sequence is the head of a
/// stream that has no commits yet.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sequence(Option<u64>);

macro_rules! impl_counter {
    ($t:ty, $sentinel:literal) => {
        impl $t {
            pub const fn new(value: u64) -> Self {
                Self(Some(value))
            }

            /// The concrete value, `None` for the sentinel.
            pub const fn value(&self) -> Option<u64> {
                self.0
            }

            /// Next position; the sentinel increments to 1. Saturates at `u64::MAX`.
            pub const fn increment(&self) -> Self {
                match self.0 {
                    Some(value) => Self(Some(value.saturating_add(1))),
                    None => Self(Some(1)),
                }
            }

            /// Next position, `None` once the counter is exhausted.
            pub const fn checked_increment(&self) -> Option<Self> {
                match self.0 {
                    Some(value) => match value.checked_add(1) {
                        Some(next) => Some(Self(Some(next))),
                        None => None,
                    },
                    None => Some(Self(Some(1))),
                }
            }

            pub fn is_greater_than_or_equal(&self, other: &Self) -> bool {
                self >= other
            }
        }

        impl From<u64> for $t {
            fn from(value: u64) -> Self {
                Self::new(value)
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                match self.0 {
                    Some(value) => core::fmt::Display::fmt(&value, f),
                    None => f.write_str($sentinel),
                }
            }
        }
    };
}

impl_counter!(Revision, "<empty>");
impl_counter!(Sequence, "<initial>");

impl Revision {
    pub const fn empty() -> Self {
        Self(None)
    }

    pub const fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// Whether this is the first valid revision of an aggregate.
    pub const fn is_initial(&self) -> bool {
        matches!(self.0, Some(1))
    }
}

impl Sequence {
    pub const fn initial() -> Self {
        Self(None)
    }

    pub const fn is_initial(&self) -> bool {
        self.0.is_none()
    }

    /// Inclusive range check.
    pub fn is_within_range(&self, start: &Self, end: &Self) -> bool {
        self >= start && self <= end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_revision_increments_to_first() {
        let first = Revision::empty().increment();
        assert_eq!(first, Revision::new(1));
        assert!(first.is_initial());
        assert!(!first.is_empty());
        assert_eq!(Revision::new(7).increment(), Revision::new(8));
    }

    #[test]
    fn empty_is_distinct_from_zero() {
        assert_ne!(Revision::empty(), Revision::new(0));
        assert!(Revision::empty() < Revision::new(0));
        assert!(!Revision::new(0).is_empty());
        assert_eq!(Revision::new(0).increment(), Revision::new(1));
    }

    #[test]
    fn exhausted_counter_does_not_overflow() {
        let last = Revision::new(u64::MAX);
        assert_eq!(last.increment(), last);
        assert_eq!(last.checked_increment(), None);
        assert_eq!(Revision::empty().checked_increment(), Some(Revision::new(1)));
        assert_eq!(Sequence::new(u64::MAX).checked_increment(), None);
        assert_eq!(Sequence::new(4).checked_increment(), Some(Sequence::new(5)));
    }

    #[test]
    fn ordering_and_comparison() {
        assert!(Revision::new(3).is_greater_than_or_equal(&Revision::new(3)));
        assert!(Revision::new(4).is_greater_than_or_equal(&Revision::new(3)));
        assert!(!Revision::new(2).is_greater_than_or_equal(&Revision::new(3)));
        assert!(Revision::new(1).is_greater_than_or_equal(&Revision::empty()));
    }

    #[test]
    fn initial_sequence_and_ranges() {
        let initial = Sequence::initial();
        assert!(initial.is_initial());
        assert_eq!(initial.increment(), Sequence::new(1));
        assert_eq!(Sequence::default(), initial);

        let (start, end) = (Sequence::new(2), Sequence::new(4));
        assert!(Sequence::new(2).is_within_range(&start, &end));
        assert!(Sequence::new(4).is_within_range(&start, &end));
        assert!(!Sequence::new(5).is_within_range(&start, &end));
        assert!(!initial.is_within_range(&start, &end));
    }

    #[test]
    fn display_marks_sentinels() {
        assert_eq!(Revision::empty().to_string(), "<empty>");
        assert_eq!(Sequence::initial().to_string(), "<initial>");
        assert_eq!(Sequence::new(12).to_string(), "12");
    }

    #[test]
    fn serializes_sentinel_as_null() {
        assert_eq!(serde_json::to_string(&Revision::new(5)).unwrap(), "5");
        assert_eq!(serde_json::to_string(&Revision::empty()).unwrap(), "null");
        let seq: Sequence = serde_json::from_str("null").unwrap();
        assert!(seq.is_initial());
    }
}
