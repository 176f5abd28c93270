//! Shared fixture builders: repositories assembled byte-by-byte on disk.
//!
//! Object ids are synthetic. The reader never recomputes hashes, so a
//! fixture only has to be internally consistent: refs point at commit ids
//! that exist, commits point at parent ids that exist, and pack indexes
//! agree with their packs.

#![allow(dead_code)]

use std::io::Write;
use std::path::PathBuf;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use gitro_hash::ObjectId;
use gitro_pack::delta::{encode_copy, encode_insert, write_varint};
use gitro_pack::entry::{encode_entry_header, encode_ofs_delta_offset};
use gitro_pack::{IDX_V2_SIGNATURE, IDX_V2_VERSION, PACK_SIGNATURE, PACK_VERSION};

pub fn make_oid(n: u8) -> ObjectId {
    let mut bytes = [0u8; 20];
    bytes[0] = n;
    bytes[19] = n;
    ObjectId::from_bytes(&bytes).unwrap()
}

pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut enc = ZlibEncoder::new(&mut out, Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap();
    out
}

/// A repository fixture rooted at a temp directory.
pub struct RepoFixture {
    _dir: tempfile::TempDir,
    pub git_dir: PathBuf,
}

impl RepoFixture {
    /// An empty metadata directory with HEAD attached to `master`.
    pub fn new() -> Self {
        Self::with_head("ref: refs/heads/master\n")
    }

    pub fn with_head(head: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let git_dir = dir.path().to_path_buf();
        std::fs::write(git_dir.join("HEAD"), head).unwrap();
        Self { _dir: dir, git_dir }
    }

    /// A bare directory without even a HEAD file.
    pub fn without_head() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let git_dir = dir.path().to_path_buf();
        Self { _dir: dir, git_dir }
    }

    pub fn add_branch(&self, name: &str, oid: ObjectId) {
        let heads = self.git_dir.join("refs").join("heads");
        std::fs::create_dir_all(&heads).unwrap();
        std::fs::write(heads.join(name), format!("{}\n", oid.to_hex())).unwrap();
    }

    pub fn write_packed_refs(&self, content: &str) {
        std::fs::write(self.git_dir.join("packed-refs"), content).unwrap();
    }

    pub fn write_loose(&self, oid: ObjectId, kind: &str, content: &[u8]) {
        let mut raw = Vec::new();
        raw.extend_from_slice(format!("{} {}\0", kind, content.len()).as_bytes());
        raw.extend_from_slice(content);

        let path = self.git_dir.join("objects").join(oid.loose_path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, deflate(&raw)).unwrap();
    }

    pub fn pack_dir(&self) -> PathBuf {
        self.git_dir.join("objects").join("pack")
    }
}

/// Commit content with the given tree, parents, committer time, and message.
pub fn commit_content(
    tree: ObjectId,
    parents: &[ObjectId],
    time: i64,
    message: &str,
) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(format!("tree {}\n", tree.to_hex()).as_bytes());
    for parent in parents {
        out.extend_from_slice(format!("parent {}\n", parent.to_hex()).as_bytes());
    }
    out.extend_from_slice(
        format!("author A U Thor <author@example.com> {time} +0000\n").as_bytes(),
    );
    out.extend_from_slice(
        format!("committer C O Mitter <committer@example.com> {time} +0000\n").as_bytes(),
    );
    out.push(b'\n');
    out.extend_from_slice(message.as_bytes());
    out
}

/// Tree content from `(mode, name, oid)` entries.
pub fn tree_content(entries: &[(&str, &str, ObjectId)]) -> Vec<u8> {
    let mut out = Vec::new();
    for (mode, name, oid) in entries {
        out.extend_from_slice(mode.as_bytes());
        out.push(b' ');
        out.extend_from_slice(name.as_bytes());
        out.push(0);
        out.extend_from_slice(oid.as_bytes());
    }
    out
}

/// Annotated tag content wrapping a commit.
pub fn tag_content(target: ObjectId, name: &str, message: &str) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(format!("object {}\n", target.to_hex()).as_bytes());
    out.extend_from_slice(b"type commit\n");
    out.extend_from_slice(format!("tag {name}\n").as_bytes());
    out.extend_from_slice(b"tagger T Agger <tagger@example.com> 1700000000 +0000\n");
    out.push(b'\n');
    out.extend_from_slice(message.as_bytes());
    out
}

/// A delta that keeps the first `keep` base bytes and appends `suffix`.
pub fn delta_replacing_suffix(base: &[u8], keep: usize, suffix: &[u8]) -> Vec<u8> {
    let mut delta = Vec::new();
    delta.extend_from_slice(&write_varint(base.len()));
    delta.extend_from_slice(&write_varint(keep + suffix.len()));
    delta.extend_from_slice(&encode_copy(0, keep));
    delta.extend_from_slice(&encode_insert(suffix));
    delta
}

/// One object to place in a fixture pack.
pub enum PackObj {
    Base {
        oid: ObjectId,
        type_code: u8,
        data: Vec<u8>,
    },
    /// Delta against an earlier entry of the same pack, by entry index.
    OfsDelta {
        oid: ObjectId,
        base_entry: usize,
        delta: Vec<u8>,
    },
    /// Delta against an object referenced by hash.
    RefDelta {
        oid: ObjectId,
        base: ObjectId,
        delta: Vec<u8>,
    },
}

/// Write a `.pack`/`.idx` pair under `objects/pack/`.
/// `idx_version` selects the index format (1 or 2).
pub fn write_pack(fixture: &RepoFixture, name: &str, idx_version: u32, objects: &[PackObj]) {
    let pack_dir = fixture.pack_dir();
    std::fs::create_dir_all(&pack_dir).unwrap();

    let mut pack = Vec::new();
    pack.extend_from_slice(PACK_SIGNATURE);
    pack.extend_from_slice(&PACK_VERSION.to_be_bytes());
    pack.extend_from_slice(&(objects.len() as u32).to_be_bytes());

    let mut offsets: Vec<u64> = Vec::new();
    let mut entries: Vec<(ObjectId, u64)> = Vec::new();

    for obj in objects {
        let offset = pack.len() as u64;
        offsets.push(offset);
        match obj {
            PackObj::Base {
                oid,
                type_code,
                data,
            } => {
                pack.extend_from_slice(&encode_entry_header(*type_code, data.len() as u64));
                pack.extend_from_slice(&deflate(data));
                entries.push((*oid, offset));
            }
            PackObj::OfsDelta {
                oid,
                base_entry,
                delta,
            } => {
                let distance = offset - offsets[*base_entry];
                pack.extend_from_slice(&encode_entry_header(6, delta.len() as u64));
                pack.extend_from_slice(&encode_ofs_delta_offset(distance));
                pack.extend_from_slice(&deflate(delta));
                entries.push((*oid, offset));
            }
            PackObj::RefDelta { oid, base, delta } => {
                pack.extend_from_slice(&encode_entry_header(7, delta.len() as u64));
                pack.extend_from_slice(base.as_bytes());
                pack.extend_from_slice(&deflate(delta));
                entries.push((*oid, offset));
            }
        }
    }
    pack.extend_from_slice(&[0u8; 20]);

    entries.sort_by(|a, b| a.0.cmp(&b.0));
    let idx = match idx_version {
        1 => build_v1_index(&entries),
        _ => build_v2_index(&entries),
    };

    std::fs::write(pack_dir.join(format!("{name}.pack")), pack).unwrap();
    std::fs::write(pack_dir.join(format!("{name}.idx")), idx).unwrap();
}

fn fanout_table(entries: &[(ObjectId, u64)]) -> [u32; 256] {
    let mut fanout = [0u32; 256];
    for (oid, _) in entries {
        fanout[oid.first_byte() as usize] += 1;
    }
    for i in 1..256 {
        fanout[i] += fanout[i - 1];
    }
    fanout
}

fn build_v2_index(entries: &[(ObjectId, u64)]) -> Vec<u8> {
    let mut idx = Vec::new();
    idx.extend_from_slice(&IDX_V2_SIGNATURE);
    idx.extend_from_slice(&IDX_V2_VERSION.to_be_bytes());
    for count in fanout_table(entries) {
        idx.extend_from_slice(&count.to_be_bytes());
    }
    for (oid, _) in entries {
        idx.extend_from_slice(oid.as_bytes());
    }
    for _ in entries {
        idx.extend_from_slice(&0u32.to_be_bytes()); // crc, unread
    }
    for (_, offset) in entries {
        idx.extend_from_slice(&(*offset as u32).to_be_bytes());
    }
    idx.extend_from_slice(&[0u8; 40]);
    idx
}

fn build_v1_index(entries: &[(ObjectId, u64)]) -> Vec<u8> {
    let mut idx = Vec::new();
    for count in fanout_table(entries) {
        idx.extend_from_slice(&count.to_be_bytes());
    }
    for (oid, offset) in entries {
        idx.extend_from_slice(&(*offset as u32).to_be_bytes());
        idx.extend_from_slice(oid.as_bytes());
    }
    idx.extend_from_slice(&[0u8; 40]);
    idx
}
