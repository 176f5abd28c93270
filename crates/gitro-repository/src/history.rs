//! History walking: commits from a branch tip toward the root.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use gitro_hash::ObjectId;
use gitro_object::{Commit, Object, ObjectType};

use crate::{RepoError, Repository};

/// One step of a history walk: the commit id, its parsed headers, and its
/// message (both inside [`Commit`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub id: ObjectId,
    pub commit: Commit,
}

/// An entry in the walk priority queue.
struct WalkEntry {
    oid: ObjectId,
    commit: Commit,
    /// Committer timestamp; 0 when the header is absent or malformed, in
    /// which case insertion order decides.
    commit_time: i64,
    /// Insertion counter for stable ordering among equal dates.
    insertion_ctr: u64,
}

impl PartialEq for WalkEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for WalkEntry {}

impl PartialOrd for WalkEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WalkEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Newest first; ties go to the earlier insertion so a linear
        // chain of equal dates comes out in push order.
        self.commit_time
            .cmp(&other.commit_time)
            .then_with(|| other.insertion_ctr.cmp(&self.insertion_ctr))
    }
}

/// Iterator over commits, yielded newest-first along parent chains: a
/// commit always appears before any of its parents.
pub struct History<'a> {
    repo: &'a Repository,
    queue: BinaryHeap<WalkEntry>,
    seen: HashSet<ObjectId>,
    insertion_ctr: u64,
}

impl<'a> History<'a> {
    /// Start a walk at the given tip commit.
    pub(crate) fn from_tip(repo: &'a Repository, tip: ObjectId) -> Result<Self, RepoError> {
        let mut walk = Self {
            repo,
            queue: BinaryHeap::new(),
            seen: HashSet::new(),
            insertion_ctr: 0,
        };
        walk.push(tip)?;
        Ok(walk)
    }

    /// Enqueue a commit unless it was already visited.
    fn push(&mut self, oid: ObjectId) -> Result<(), RepoError> {
        if !self.seen.insert(oid) {
            return Ok(());
        }

        let raw = self.repo.object(&oid)?;
        let commit = match raw.parse()? {
            Object::Commit(commit) => commit,
            other => {
                return Err(RepoError::UnexpectedType {
                    oid,
                    expected: ObjectType::Commit,
                    actual: other.object_type(),
                })
            }
        };

        let commit_time = commit.commit_time().unwrap_or(0);
        self.queue.push(WalkEntry {
            oid,
            commit,
            commit_time,
            insertion_ctr: self.insertion_ctr,
        });
        self.insertion_ctr += 1;
        Ok(())
    }
}

impl<'a> Iterator for History<'a> {
    type Item = Result<HistoryEntry, RepoError>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.queue.pop()?;

        for &parent in &entry.commit.parents {
            if let Err(e) = self.push(parent) {
                return Some(Err(e));
            }
        }

        Some(Ok(HistoryEntry {
            id: entry.oid,
            commit: entry.commit,
        }))
    }
}
