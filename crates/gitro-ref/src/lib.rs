//! Read-only reference access: the HEAD pointer, loose branch refs under
//! `refs/heads/`, and the `packed-refs` file.

pub mod heads;
pub mod packed;

use std::fs;
use std::path::{Path, PathBuf};

use bstr::ByteSlice;
use gitro_hash::ObjectId;

pub use heads::discover_branches;
pub use packed::{PackedRef, PackedRefs};

/// Errors from ref reading.
#[derive(Debug, thiserror::Error)]
pub enum RefError {
    #[error("missing HEAD file at {0}")]
    MissingHead(PathBuf),

    #[error("cannot read {path}: {source}")]
    IoPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("ref parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Hash(#[from] gitro_hash::HashError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The parsed HEAD pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Head {
    /// `ref: refs/heads/<name>` — the usual attached state.
    Symbolic(String),
    /// A bare hash — detached HEAD.
    Detached(ObjectId),
}

impl Head {
    /// Read and parse `<git_dir>/HEAD`. A missing file is a layout error;
    /// open rejects such repositories.
    pub fn read(git_dir: &Path) -> Result<Self, RefError> {
        let path = git_dir.join("HEAD");
        let contents = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RefError::MissingHead(path));
            }
            Err(e) => return Err(RefError::IoPath { path, source: e }),
        };

        let trimmed = contents.trim();
        if let Some(target) = trimmed.strip_prefix(b"ref: ") {
            let target = std::str::from_utf8(target.trim())
                .map_err(|_| RefError::Parse("invalid UTF-8 in symbolic HEAD target".into()))?;
            Ok(Self::Symbolic(target.to_string()))
        } else {
            let hex = std::str::from_utf8(trimmed)
                .map_err(|_| RefError::Parse("invalid UTF-8 in detached HEAD".into()))?;
            Ok(Self::Detached(ObjectId::from_hex(hex)?))
        }
    }

    /// The short branch name, if HEAD points into `refs/heads/`.
    pub fn branch_name(&self) -> Option<&str> {
        match self {
            Self::Symbolic(target) => {
                Some(target.strip_prefix("refs/heads/").unwrap_or(target))
            }
            Self::Detached(_) => None,
        }
    }
}
