//! PackFile: reading `.pack` files.
//!
//! A pack file has a 12-byte header, a sequence of entries, and a trailing
//! checksum. Reads go through the companion index: offset lookup, header
//! decode, inflate, then delta resolution if needed.

use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::bufread::ZlibDecoder;
use gitro_hash::ObjectId;
use gitro_object::ObjectType;
use memmap2::Mmap;

use crate::entry::{parse_entry_header, PackEntry};
use crate::index::PackIndex;
use crate::{
    PackEntryType, PackError, PackedObject, MAX_DELTA_CHAIN_DEPTH, PACK_HEADER_SIZE,
    PACK_SIGNATURE, PACK_VERSION,
};

/// A memory-mapped packfile with its index.
pub struct PackFile {
    data: Mmap,
    index: PackIndex,
    pack_path: PathBuf,
    num_objects: u32,
}

impl PackFile {
    /// Open a pack file and its associated `.idx`.
    pub fn open(pack_path: impl AsRef<Path>) -> Result<Self, PackError> {
        let pack_path = pack_path.as_ref().to_path_buf();
        let idx_path = pack_path.with_extension("idx");

        let file = std::fs::File::open(&pack_path)?;
        let data = unsafe { Mmap::map(&file)? };

        if data.len() < PACK_HEADER_SIZE {
            return Err(PackError::InvalidHeader("file too small".into()));
        }
        if &data[0..4] != PACK_SIGNATURE {
            return Err(PackError::InvalidHeader("bad PACK signature".into()));
        }
        let version = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
        if version != PACK_VERSION {
            return Err(PackError::InvalidHeader(format!(
                "unsupported pack version {version}"
            )));
        }
        let num_objects = u32::from_be_bytes([data[8], data[9], data[10], data[11]]);

        let index = PackIndex::open(&idx_path)?;
        if index.num_objects() != num_objects {
            return Err(PackError::InvalidHeader(format!(
                "pack has {} objects but index has {}",
                num_objects,
                index.num_objects()
            )));
        }

        Ok(Self {
            data,
            index,
            pack_path,
            num_objects,
        })
    }

    /// Read an object by OID. Returns `None` if the OID is not in this pack.
    pub fn read_object(&self, oid: &ObjectId) -> Result<Option<PackedObject>, PackError> {
        self.read_object_with_resolver(oid, |_| None)
    }

    /// Read an object at a known pack offset.
    pub fn read_at_offset(&self, offset: u64) -> Result<PackedObject, PackError> {
        self.read_at_offset_with_resolver(offset, |_| None)
    }

    /// Read an object by OID, with an external resolver for ref-delta bases
    /// that live outside this pack (another pack, or loose storage).
    pub fn read_object_with_resolver(
        &self,
        oid: &ObjectId,
        resolver: impl Fn(&ObjectId) -> Option<(ObjectType, Vec<u8>)>,
    ) -> Result<Option<PackedObject>, PackError> {
        match self.index.lookup(oid) {
            Some(offset) => self.read_at_offset_with_resolver(offset, resolver).map(Some),
            None => Ok(None),
        }
    }

    /// Read an object at a known offset, resolving delta chains.
    ///
    /// The chain is walked with an explicit stack of decompressed delta
    /// streams rather than call recursion, so pathological chains are
    /// bounded by `MAX_DELTA_CHAIN_DEPTH` and not by the thread stack.
    fn read_at_offset_with_resolver(
        &self,
        offset: u64,
        resolver: impl Fn(&ObjectId) -> Option<(ObjectType, Vec<u8>)>,
    ) -> Result<PackedObject, PackError> {
        // Innermost delta first; the base object ends the chain.
        let mut chain: Vec<Vec<u8>> = Vec::new();
        let mut current_offset = offset;

        for _ in 0..MAX_DELTA_CHAIN_DEPTH {
            let entry = self.entry_at(current_offset)?;
            let body = self.inflate_body(&entry, current_offset)?;

            match entry.entry_type {
                PackEntryType::Commit
                | PackEntryType::Tree
                | PackEntryType::Blob
                | PackEntryType::Tag => {
                    let kind = entry.entry_type.to_object_type().expect("non-delta type");
                    return apply_chain(kind, body, &chain);
                }
                PackEntryType::OfsDelta { base_offset } => {
                    chain.push(body);
                    current_offset = base_offset;
                }
                PackEntryType::RefDelta { base_oid } => {
                    chain.push(body);
                    // Same pack first; otherwise ask the facade.
                    if let Some(base_offset) = self.index.lookup(&base_oid) {
                        current_offset = base_offset;
                    } else if let Some((kind, base_data)) = resolver(&base_oid) {
                        return apply_chain(kind, base_data, &chain);
                    } else {
                        return Err(PackError::MissingBase(base_oid));
                    }
                }
            }
        }

        Err(PackError::DeltaChainTooDeep {
            offset,
            max_depth: MAX_DELTA_CHAIN_DEPTH,
        })
    }

    /// Check if this pack contains the given OID (index lookup only).
    pub fn contains(&self, oid: &ObjectId) -> bool {
        self.index.contains(oid)
    }

    /// Number of objects in this pack.
    pub fn num_objects(&self) -> u32 {
        self.num_objects
    }

    /// The pack index.
    pub fn index(&self) -> &PackIndex {
        &self.index
    }

    /// Path to the `.pack` file.
    pub fn path(&self) -> &Path {
        &self.pack_path
    }

    /// Decode the entry header at an absolute pack offset.
    fn entry_at(&self, offset: u64) -> Result<PackEntry, PackError> {
        let start = offset as usize;
        if start >= self.data.len() {
            return Err(PackError::CorruptEntry(offset));
        }
        parse_entry_header(&self.data[start..], offset)
    }

    /// Inflate an entry body and check it against the declared size.
    fn inflate_body(&self, entry: &PackEntry, offset: u64) -> Result<Vec<u8>, PackError> {
        let compressed = &self.data[entry.data_offset as usize..];
        let mut decoder = ZlibDecoder::new(compressed);
        let mut body = Vec::with_capacity(entry.uncompressed_size);
        decoder
            .read_to_end(&mut body)
            .map_err(|e| PackError::Decompress { offset, source: e })?;

        if body.len() != entry.uncompressed_size {
            return Err(PackError::SizeMismatch {
                offset,
                declared: entry.uncompressed_size,
                actual: body.len(),
            });
        }
        Ok(body)
    }
}

impl std::fmt::Debug for PackFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackFile")
            .field("path", &self.pack_path)
            .field("num_objects", &self.num_objects)
            .finish_non_exhaustive()
    }
}

/// Apply a stack of delta streams (innermost first) to a base object.
fn apply_chain(
    kind: ObjectType,
    base: Vec<u8>,
    chain: &[Vec<u8>],
) -> Result<PackedObject, PackError> {
    let mut data = base;
    for delta in chain.iter().rev() {
        data = crate::delta::apply_delta(&data, delta)?;
    }
    Ok(PackedObject { kind, data })
}
