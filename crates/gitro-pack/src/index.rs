//! Pack index reading and lookup, versions 1 and 2.
//!
//! Both versions share the 256-entry fan-out table of cumulative counts
//! indexed by the first hash byte; `fanout[255]` is the object count N.
//!
//! ```text
//! v1:  Fanout:  256 × 4-byte big-endian cumulative counts
//!      Records: N × (4-byte offset | 20-byte OID), sorted by OID
//!
//! v2:  Header:  \xff tOc | version (= 2)
//!      Fanout:  as above
//!      OIDs:    N × 20 bytes, sorted
//!      CRC32:   N × 4 bytes (ignored by this reader)
//!      Offsets: N × 4 bytes (high bit set → index into 64-bit table)
//!      64-bit:  M × 8-byte offsets (packs > 2GB)
//! ```

use std::path::{Path, PathBuf};

use gitro_hash::ObjectId;
use memmap2::Mmap;

use crate::{PackError, IDX_V2_SIGNATURE, IDX_V2_VERSION};

const FANOUT_ENTRIES: usize = 256;
const FANOUT_SIZE: usize = FANOUT_ENTRIES * 4;
const V1_RECORD_SIZE: usize = 4 + ObjectId::RAW_LEN;

/// A memory-mapped pack index providing OID → pack offset lookup.
pub struct PackIndex {
    data: Mmap,
    version: u32,
    num_objects: u32,
    /// Byte offset of the fan-out table (0 for v1, 8 for v2).
    fanout_offset: usize,
    /// v1: start of the 24-byte records. v2: start of the OID array.
    entries_offset: usize,
    /// v2 only: start of the 32-bit offset array.
    offset32_offset: usize,
    /// v2 only: start of the 64-bit offset table.
    offset64_offset: usize,
    idx_path: PathBuf,
}

impl PackIndex {
    /// Open and validate a pack index file.
    ///
    /// The version is detected from the leading bytes: the `\xFFtOc` magic
    /// introduces v2, anything else is treated as a bare v1 fan-out. The
    /// fan-out table must be monotonic nondecreasing or the index is
    /// rejected as corrupt.
    pub fn open(idx_path: impl AsRef<Path>) -> Result<Self, PackError> {
        let idx_path = idx_path.as_ref().to_path_buf();
        let file = std::fs::File::open(&idx_path)?;
        let data = unsafe { Mmap::map(&file)? };

        let corrupt = |reason: &str| PackError::CorruptIndex {
            path: idx_path.display().to_string(),
            reason: reason.into(),
        };

        let (version, fanout_offset) = if data.len() >= 4 && data[0..4] == IDX_V2_SIGNATURE {
            if data.len() < 8 {
                return Err(corrupt("truncated version field"));
            }
            let version = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
            if version != IDX_V2_VERSION {
                return Err(PackError::UnsupportedIndexVersion(version));
            }
            (version, 8)
        } else {
            (1, 0)
        };

        if data.len() < fanout_offset + FANOUT_SIZE {
            return Err(corrupt("file too small for fan-out table"));
        }

        // The fan-out entries are cumulative counts; any decrease means
        // the table is lying about bucket boundaries.
        let mut prev = 0u32;
        for i in 0..FANOUT_ENTRIES {
            let pos = fanout_offset + i * 4;
            let count =
                u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]);
            if count < prev {
                return Err(corrupt(&format!(
                    "fan-out not monotonic at entry {i}: {count} < {prev}"
                )));
            }
            prev = count;
        }
        let num_objects = prev;

        let n = num_objects as usize;
        let entries_offset = fanout_offset + FANOUT_SIZE;
        let (offset32_offset, offset64_offset, min_size) = match version {
            1 => {
                let min_size = entries_offset + n * V1_RECORD_SIZE;
                (0, 0, min_size)
            }
            _ => {
                let crc_offset = entries_offset + n * ObjectId::RAW_LEN;
                let offset32_offset = crc_offset + n * 4;
                let offset64_offset = offset32_offset + n * 4;
                (offset32_offset, offset64_offset, offset64_offset)
            }
        };

        if data.len() < min_size {
            return Err(corrupt(&format!(
                "file too small: {} < {min_size}",
                data.len()
            )));
        }

        Ok(Self {
            data,
            version,
            num_objects,
            fanout_offset,
            entries_offset,
            offset32_offset,
            offset64_offset,
            idx_path,
        })
    }

    /// Look up an OID, returning its byte offset in the pack file.
    pub fn lookup(&self, oid: &ObjectId) -> Option<u64> {
        let (lo, hi) = self.fanout_range(oid.first_byte());
        let target: &[u8] = oid.as_bytes();

        let mut low = lo;
        let mut high = hi;
        while low < high {
            let mid = low + (high - low) / 2;
            match self.oid_bytes_at(mid).cmp(target) {
                std::cmp::Ordering::Less => low = mid + 1,
                std::cmp::Ordering::Greater => high = mid,
                std::cmp::Ordering::Equal => return Some(self.offset_at(mid)),
            }
        }
        None
    }

    /// Check membership without returning the offset.
    pub fn contains(&self, oid: &ObjectId) -> bool {
        self.lookup(oid).is_some()
    }

    /// The OID at the given sorted position.
    pub fn oid_at(&self, index: usize) -> ObjectId {
        ObjectId::from_bytes(self.oid_bytes_at(index)).expect("valid OID in index")
    }

    /// The pack file offset at the given sorted position.
    pub fn offset_at(&self, index: usize) -> u64 {
        match self.version {
            1 => {
                let pos = self.entries_offset + index * V1_RECORD_SIZE;
                u32::from_be_bytes([
                    self.data[pos],
                    self.data[pos + 1],
                    self.data[pos + 2],
                    self.data[pos + 3],
                ]) as u64
            }
            _ => {
                let pos = self.offset32_offset + index * 4;
                let val = u32::from_be_bytes([
                    self.data[pos],
                    self.data[pos + 1],
                    self.data[pos + 2],
                    self.data[pos + 3],
                ]);
                if val & 0x8000_0000 != 0 {
                    // High bit set: the low 31 bits index the 64-bit table.
                    let idx64 = (val & 0x7fff_ffff) as usize;
                    let pos64 = self.offset64_offset + idx64 * 8;
                    u64::from_be_bytes([
                        self.data[pos64],
                        self.data[pos64 + 1],
                        self.data[pos64 + 2],
                        self.data[pos64 + 3],
                        self.data[pos64 + 4],
                        self.data[pos64 + 5],
                        self.data[pos64 + 6],
                        self.data[pos64 + 7],
                    ])
                } else {
                    val as u64
                }
            }
        }
    }

    /// Total number of objects in this index.
    pub fn num_objects(&self) -> u32 {
        self.num_objects
    }

    /// Index format version (1 or 2).
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Path to the `.idx` file.
    pub fn path(&self) -> &Path {
        &self.idx_path
    }

    /// Iterate over all `(OID, offset)` pairs in sorted order.
    pub fn iter(&self) -> PackIndexIter<'_> {
        PackIndexIter {
            index: self,
            pos: 0,
        }
    }

    /// The sorted-position range for a given first hash byte.
    fn fanout_range(&self, first_byte: u8) -> (usize, usize) {
        let end = self.fanout_entry(first_byte) as usize;
        let start = if first_byte == 0 {
            0
        } else {
            self.fanout_entry(first_byte - 1) as usize
        };
        (start, end)
    }

    fn fanout_entry(&self, index: u8) -> u32 {
        let pos = self.fanout_offset + index as usize * 4;
        u32::from_be_bytes([
            self.data[pos],
            self.data[pos + 1],
            self.data[pos + 2],
            self.data[pos + 3],
        ])
    }

    fn oid_bytes_at(&self, index: usize) -> &[u8] {
        let start = match self.version {
            1 => self.entries_offset + index * V1_RECORD_SIZE + 4,
            _ => self.entries_offset + index * ObjectId::RAW_LEN,
        };
        &self.data[start..start + ObjectId::RAW_LEN]
    }
}

impl std::fmt::Debug for PackIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackIndex")
            .field("path", &self.idx_path)
            .field("version", &self.version)
            .field("num_objects", &self.num_objects)
            .finish_non_exhaustive()
    }
}

/// Iterator over `(OID, offset)` pairs in a pack index.
pub struct PackIndexIter<'a> {
    index: &'a PackIndex,
    pos: usize,
}

impl<'a> Iterator for PackIndexIter<'a> {
    type Item = (ObjectId, u64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.index.num_objects as usize {
            return None;
        }
        let oid = self.index.oid_at(self.pos);
        let offset = self.index.offset_at(self.pos);
        self.pos += 1;
        Some((oid, offset))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.index.num_objects as usize - self.pos;
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for PackIndexIter<'a> {}
