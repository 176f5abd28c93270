//! Packfile and pack index reading.
//!
//! A pack stores many objects in one file, some as zlib-compressed bodies
//! and some as deltas against another object (referenced by same-pack
//! offset or by hash). The companion `.idx` file maps object ids to byte
//! offsets inside the pack. This crate reads both index versions, decodes
//! entry headers, and resolves delta chains back into full objects.

pub mod delta;
pub mod entry;
pub mod index;
pub mod pack;

use gitro_hash::ObjectId;
use gitro_object::ObjectType;

/// Errors that can occur while reading packs and indexes.
#[derive(Debug, thiserror::Error)]
pub enum PackError {
    #[error("invalid pack header: {0}")]
    InvalidHeader(String),

    #[error("corrupt index file {path}: {reason}")]
    CorruptIndex { path: String, reason: String },

    #[error("unsupported pack index version: {0}")]
    UnsupportedIndexVersion(u32),

    #[error("unknown object type {code} at offset {offset}")]
    UnknownObjectType { code: u8, offset: u64 },

    #[error("corrupt pack entry at offset {0}")]
    CorruptEntry(u64),

    #[error("invalid delta at offset {offset}: {reason}")]
    InvalidDelta { offset: u64, reason: String },

    #[error("no base object for delta: {0}")]
    MissingBase(ObjectId),

    #[error("delta chain at offset {offset} exceeds {max_depth} levels")]
    DeltaChainTooDeep { offset: u64, max_depth: usize },

    #[error(
        "size mismatch at offset {offset}: header declares {declared} bytes, inflated {actual}"
    )]
    SizeMismatch {
        offset: u64,
        declared: usize,
        actual: usize,
    },

    #[error("decompression failed at offset {offset}: {source}")]
    Decompress {
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Hash(#[from] gitro_hash::HashError),
}

/// Type of a raw pack entry, before delta resolution.
///
/// The four real object kinds plus the two wire-only delta kinds. Callers
/// of [`pack::PackFile`] never see the delta variants; they are resolved
/// away during reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackEntryType {
    Commit,
    Tree,
    Blob,
    Tag,
    /// Delta whose base lives at an earlier offset in the same pack.
    OfsDelta { base_offset: u64 },
    /// Delta whose base is referenced by hash (may live anywhere).
    RefDelta { base_oid: ObjectId },
}

impl PackEntryType {
    /// Convert a non-delta entry type to an ObjectType.
    pub fn to_object_type(self) -> Option<ObjectType> {
        match self {
            Self::Commit => Some(ObjectType::Commit),
            Self::Tree => Some(ObjectType::Tree),
            Self::Blob => Some(ObjectType::Blob),
            Self::Tag => Some(ObjectType::Tag),
            Self::OfsDelta { .. } | Self::RefDelta { .. } => None,
        }
    }
}

/// A fully resolved object read out of a pack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedObject {
    pub kind: ObjectType,
    pub data: Vec<u8>,
}

/// Pack format constants.
pub const PACK_SIGNATURE: &[u8; 4] = b"PACK";
pub const PACK_VERSION: u32 = 2;
pub const PACK_HEADER_SIZE: usize = 12;

/// Pack index constants. Version 1 has no signature; it starts directly
/// with the fan-out table.
pub const IDX_V2_SIGNATURE: [u8; 4] = [0xff, 0x74, 0x4f, 0x63]; // "\377tOc"
pub const IDX_V2_VERSION: u32 = 2;

/// Maximum delta chain depth before we bail out.
pub const MAX_DELTA_CHAIN_DEPTH: usize = 512;
