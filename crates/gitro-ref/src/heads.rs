//! Branch discovery: loose files under `refs/heads/`, with `packed-refs`
//! as the fallback when no loose branch files exist.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use bstr::ByteSlice;
use gitro_hash::ObjectId;

use crate::packed::PackedRefs;
use crate::RefError;

/// Build the branch table for a repository: short branch name → commit id.
///
/// Loose files win: if `refs/heads/` contains at least one regular file,
/// each file's basename is a branch and its trimmed content is the target
/// hash, and `packed-refs` is not consulted. Only a repository with no
/// loose branch files at all falls back to the `refs/heads/` records in
/// `packed-refs`.
pub fn discover_branches(git_dir: &Path) -> Result<BTreeMap<String, ObjectId>, RefError> {
    let mut branches = loose_branches(git_dir)?;
    if branches.is_empty() {
        branches = packed_branches(git_dir)?;
    }
    Ok(branches)
}

fn loose_branches(git_dir: &Path) -> Result<BTreeMap<String, ObjectId>, RefError> {
    let heads_dir = git_dir.join("refs").join("heads");
    let mut branches = BTreeMap::new();

    let entries = match fs::read_dir(&heads_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(branches),
        Err(e) => {
            return Err(RefError::IoPath {
                path: heads_dir,
                source: e,
            })
        }
    };

    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            // Subdirectories hold namespaced refs; the branch table is
            // keyed by short name and covers the top-level files only.
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        let contents = fs::read(&path).map_err(|e| RefError::IoPath {
            path: path.clone(),
            source: e,
        })?;
        let hex = std::str::from_utf8(contents.trim()).map_err(|_| {
            RefError::Parse(format!("invalid UTF-8 in branch file {name}"))
        })?;
        branches.insert(name.to_string(), ObjectId::from_hex(hex)?);
    }

    Ok(branches)
}

fn packed_branches(git_dir: &Path) -> Result<BTreeMap<String, ObjectId>, RefError> {
    let packed = PackedRefs::load(git_dir)?;
    let mut branches = BTreeMap::new();

    for r in packed.refs() {
        if let Some(rest) = r.name.strip_prefix("refs/heads/") {
            let short = rest.rsplit('/').next().unwrap_or(rest);
            branches.insert(short.to_string(), r.oid);
        }
    }

    Ok(branches)
}
