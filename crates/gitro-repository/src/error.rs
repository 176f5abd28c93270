use std::path::PathBuf;

use gitro_hash::ObjectId;
use gitro_object::ObjectType;

/// Errors from repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("not a git directory: {0}")]
    NotADirectory(PathBuf),

    #[error("no branches discoverable in {0}")]
    NoBranches(PathBuf),

    #[error("unknown branch: {0}")]
    UnknownBranch(String),

    #[error("object not found: {0}")]
    NotFound(ObjectId),

    #[error("object {oid} is a {actual}, expected {expected}")]
    UnexpectedType {
        oid: ObjectId,
        expected: ObjectType,
        actual: ObjectType,
    },

    #[error(transparent)]
    Ref(#[from] gitro_ref::RefError),

    #[error(transparent)]
    Odb(#[from] gitro_odb::OdbError),

    #[error(transparent)]
    Object(#[from] gitro_object::ObjectError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
