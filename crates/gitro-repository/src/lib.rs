//! The repository handle: the read-only surface over refs and objects.
//!
//! Opening a repository points at its metadata directory (commonly named
//! `.git`), reads HEAD and the branch table eagerly, and rejects layouts
//! that are missing any of them. Objects are materialized lazily through
//! the unified store and retained in a bounded cache for the lifetime of
//! the handle. Nothing is ever written.

mod error;
mod history;

pub use error::RepoError;
pub use history::{History, HistoryEntry};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use gitro_hash::ObjectId;
use gitro_object::{Object, ObjectType, RawObject, TreeEntry};
use gitro_odb::ObjectDatabase;
use gitro_ref::{discover_branches, Head};

/// A read-only handle to one repository.
pub struct Repository {
    /// Path to the metadata directory.
    git_dir: PathBuf,
    /// Parsed HEAD pointer.
    head: Head,
    /// Branch table: short name → commit id, ordered by name.
    branches: BTreeMap<String, ObjectId>,
    /// Unified object store.
    odb: ObjectDatabase,
}

impl Repository {
    /// Open the repository whose metadata directory is at `git_dir`.
    ///
    /// Fails if the path is not a directory, if `HEAD` is missing or
    /// unreadable, or if no branch can be discovered from either
    /// `refs/heads/` or `packed-refs`.
    pub fn open(git_dir: impl AsRef<Path>) -> Result<Self, RepoError> {
        let git_dir = git_dir.as_ref().to_path_buf();
        if !git_dir.is_dir() {
            return Err(RepoError::NotADirectory(git_dir));
        }

        let head = Head::read(&git_dir)?;
        let branches = discover_branches(&git_dir)?;
        if branches.is_empty() {
            return Err(RepoError::NoBranches(git_dir));
        }

        let odb = ObjectDatabase::open(git_dir.join("objects"))?;

        Ok(Self {
            git_dir,
            head,
            branches,
            odb,
        })
    }

    /// Path to the metadata directory.
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    /// The parsed HEAD pointer.
    pub fn head(&self) -> &Head {
        &self.head
    }

    /// Branch names in lexicographic order.
    pub fn branches(&self) -> Vec<&str> {
        self.branches.keys().map(|name| name.as_str()).collect()
    }

    /// The commit id a branch points at.
    pub fn branch_target(&self, branch: &str) -> Result<ObjectId, RepoError> {
        self.branches
            .get(branch)
            .copied()
            .ok_or_else(|| RepoError::UnknownBranch(branch.to_string()))
    }

    /// Materialize an object by id: its type and full content bytes.
    pub fn object(&self, oid: &ObjectId) -> Result<RawObject, RepoError> {
        self.odb
            .read_cached(oid)?
            .ok_or(RepoError::NotFound(*oid))
    }

    /// Walk a branch's history from its tip toward the root, children
    /// before their parents. All parents of a merge are traversed.
    pub fn history(&self, branch: &str) -> Result<History<'_>, RepoError> {
        let tip = self.branch_target(branch)?;
        let tip = self.peel_to_commit(tip)?;
        History::from_tip(self, tip)
    }

    /// The entries of a tree object: child id, name, and whether the
    /// child is itself a directory (via `entry.is_dir()`).
    pub fn tree_entries(&self, oid: &ObjectId) -> Result<Vec<TreeEntry>, RepoError> {
        let raw = self.object(oid)?;
        match raw.parse()? {
            Object::Tree(tree) => Ok(tree.entries),
            other => Err(RepoError::UnexpectedType {
                oid: *oid,
                expected: ObjectType::Tree,
                actual: other.object_type(),
            }),
        }
    }

    /// Follow an annotated tag one level to the commit it wraps. Branch
    /// tips are normally commits already; deeper tag chains are rejected.
    fn peel_to_commit(&self, oid: ObjectId) -> Result<ObjectId, RepoError> {
        let raw = self.object(&oid)?;
        match raw.kind {
            ObjectType::Commit => Ok(oid),
            ObjectType::Tag => match raw.parse()? {
                Object::Tag(tag) if tag.target_type == ObjectType::Commit => Ok(tag.target),
                Object::Tag(tag) => Err(RepoError::UnexpectedType {
                    oid: tag.target,
                    expected: ObjectType::Commit,
                    actual: tag.target_type,
                }),
                _ => unreachable!("tag bytes parse as tag"),
            },
            actual => Err(RepoError::UnexpectedType {
                oid,
                expected: ObjectType::Commit,
                actual,
            }),
        }
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("git_dir", &self.git_dir)
            .field("branches", &self.branches.len())
            .finish_non_exhaustive()
    }
}
