use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use chronicle_core::{
    DomainError, DomainEvent, DomainEventSequence, DomainResult, Revision, Sequence,
};

use crate::commit::Commit;

/// Ordered, immutable list of the commits of one stream.
///
/// ## Continuity
///
/// Revisions are continuous across the whole sequence: the tail revision of
/// a pushed commit must equal `head.head_revision().increment()`, and its
/// sequence must equal `head.sequence().increment()`. An empty sequence
/// accepts any commit as its first.
///
/// Commits are held behind `Arc`, so copies share them.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitSequence<E> {
    commits: Vec<Arc<Commit<E>>>,
}

impl<E> Default for CommitSequence<E> {
    fn default() -> Self {
        Self {
            commits: Vec::new(),
        }
    }
}

impl<E> CommitSequence<E> {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Arc<Commit<E>>> {
        self.commits.iter()
    }

    /// Last commit.
    pub fn head(&self) -> Option<&Arc<Commit<E>>> {
        self.commits.last()
    }

    /// First commit.
    pub fn tail(&self) -> Option<&Arc<Commit<E>>> {
        self.commits.first()
    }

    /// Commit stored at `sequence`.
    pub fn get(&self, sequence: Sequence) -> Option<&Arc<Commit<E>>> {
        self.commits.iter().find(|c| c.sequence() == sequence)
    }

    /// 1-based position of this exact commit instance, by identity.
    ///
    /// An equal commit that is not the same instance is not found.
    pub fn position_of(&self, commit: &Commit<E>) -> Option<Sequence> {
        self.commits
            .iter()
            .position(|c| core::ptr::eq(Arc::as_ptr(c), commit))
            .map(|idx| Sequence::new(idx as u64 + 1))
    }

    /// Every commit whose own sequence lies in `[start, end]`, in order.
    pub fn slice(&self, start: Sequence, end: Sequence) -> Self {
        self.filtered(|c| c.sequence().is_within_range(&start, &end))
    }

    /// Sequence of the last commit, initial when empty.
    pub fn head_sequence(&self) -> Sequence {
        self.head()
            .map(|c| c.sequence())
            .unwrap_or_else(Sequence::initial)
    }

    // Subsets taken here are contiguous runs of an already validated sequence.
    pub(crate) fn filtered(&self, keep: impl Fn(&Commit<E>) -> bool) -> Self {
        Self {
            commits: self.commits.iter().filter(|c| keep(c)).cloned().collect(),
        }
    }
}

impl<E: DomainEvent> CommitSequence<E> {
    /// Build a sequence, validating continuity between consecutive commits.
    pub fn from_commits(commits: impl IntoIterator<Item = Commit<E>>) -> DomainResult<Self> {
        let mut sequence = Self::empty();
        for commit in commits {
            sequence.check_next(&commit)?;
            sequence.commits.push(Arc::new(commit));
        }
        Ok(sequence)
    }

    /// Append a commit, returning the extended sequence.
    ///
    /// Fails with [`DomainError::ContinuityViolation`] or
    /// [`DomainError::SequenceViolation`]; `self` is unchanged either way.
    pub fn push(&self, commit: impl Into<Arc<Commit<E>>>) -> DomainResult<Self> {
        let commit = commit.into();
        self.check_next(&commit)?;
        let mut commits = Vec::with_capacity(self.commits.len() + 1);
        commits.extend(self.commits.iter().cloned());
        commits.push(commit);
        Ok(Self { commits })
    }

    /// Aggregate revision reached by the last commit, empty when empty.
    pub fn head_revision(&self) -> Revision {
        self.head()
            .map(|c| c.head_revision())
            .unwrap_or_else(Revision::empty)
    }

    /// All event logs concatenated in commit order.
    pub fn events(&self) -> DomainResult<DomainEventSequence<E>> {
        self.commits
            .iter()
            .try_fold(DomainEventSequence::empty(), |history, commit| {
                history.append(commit.event_log())
            })
    }

    fn check_next(&self, commit: &Commit<E>) -> DomainResult<()> {
        let Some(head) = self.head() else {
            return Ok(());
        };
        if head.aggregate_id() != commit.aggregate_id() {
            return Err(DomainError::aggregate_mismatch(
                head.aggregate_id(),
                commit.aggregate_id(),
            ));
        }
        let Some(expected) = head.head_revision().checked_increment() else {
            return Err(DomainError::continuity(head.head_revision(), commit.tail_revision()));
        };
        if commit.tail_revision() != expected {
            return Err(DomainError::continuity(expected, commit.tail_revision()));
        }
        let Some(expected) = head.sequence().checked_increment() else {
            return Err(DomainError::SequenceViolation {
                expected: head.sequence(),
                found: commit.sequence(),
            });
        };
        if commit.sequence() != expected {
            return Err(DomainError::SequenceViolation {
                expected,
                found: commit.sequence(),
            });
        }
        Ok(())
    }
}

impl<'a, E> IntoIterator for &'a CommitSequence<E> {
    type Item = &'a Arc<Commit<E>>;
    type IntoIter = core::slice::Iter<'a, Arc<Commit<E>>>;

    fn into_iter(self) -> Self::IntoIter {
        self.commits.iter()
    }
}

impl<E: Serialize> Serialize for CommitSequence<E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.commits.iter().map(|c| c.as_ref()))
    }
}

impl<'de, E> Deserialize<'de> for CommitSequence<E>
where
    E: DomainEvent + Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let commits = Vec::<Commit<E>>::deserialize(deserializer)?;
        Self::from_commits(commits).map_err(de::Error::custom)
    }
}
