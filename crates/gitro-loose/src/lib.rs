//! Loose object reading: one zlib-compressed file per object.
//!
//! Each loose object lives at `objects/XX/YYYY...` where `XX` is the first
//! byte of the OID in hex and `YYYY...` is the rest. The file content is
//! zlib-compressed `"<type> <size>\0<content>"`.

mod read;

use std::path::{Path, PathBuf};

use gitro_hash::ObjectId;

/// Read-only interface to a loose object directory (`objects/`).
pub struct LooseStore {
    /// Path to the objects directory.
    objects_dir: PathBuf,
}

impl LooseStore {
    /// Open the loose object store at the given objects directory.
    pub fn open(objects_dir: impl AsRef<Path>) -> Self {
        Self {
            objects_dir: objects_dir.as_ref().to_path_buf(),
        }
    }

    /// The file path for a given OID.
    pub fn object_path(&self, oid: &ObjectId) -> PathBuf {
        self.objects_dir.join(oid.loose_path())
    }
}

/// Errors from loose object operations.
#[derive(Debug, thiserror::Error)]
pub enum LooseError {
    #[error("corrupt loose object {oid}: {reason}")]
    Corrupt { oid: String, reason: String },

    #[error("decompression error for {oid}: {source}")]
    Decompress {
        oid: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("object parse error: {0}")]
    Object(#[from] gitro_object::ObjectError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_path_fans_out_on_first_byte() {
        let store = LooseStore::open("/repo/objects");
        let oid = ObjectId::from_hex("da39a3ee5e6b4b0d3255bfef95601890afd80709").unwrap();
        assert_eq!(
            store.object_path(&oid),
            PathBuf::from("/repo/objects/da/39a3ee5e6b4b0d3255bfef95601890afd80709")
        );
    }
}
