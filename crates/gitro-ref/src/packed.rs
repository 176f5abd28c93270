//! Read-only parsing of the `packed-refs` file.
//!
//! Format:
//! ```text
//! # pack-refs with: peeled fully-peeled sorted
//! <hex-oid> <refname>
//! ^<hex-oid>   (peeled value of the annotated tag above)
//! ```

use std::fs;
use std::path::Path;

use bstr::ByteSlice;
use gitro_hash::ObjectId;

use crate::RefError;

/// A single entry in the packed-refs file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedRef {
    /// Full ref name, e.g. `refs/heads/master`.
    pub name: String,
    pub oid: ObjectId,
    /// Peeled target for annotated tags, from the `^` continuation line.
    pub peeled: Option<ObjectId>,
}

/// Parsed packed-refs content.
#[derive(Debug, Clone, Default)]
pub struct PackedRefs {
    refs: Vec<PackedRef>,
}

impl PackedRefs {
    /// Parse packed-refs bytes.
    pub fn parse(data: &[u8]) -> Result<Self, RefError> {
        let mut refs: Vec<PackedRef> = Vec::new();

        for line in data.lines() {
            if line.is_empty() || line.starts_with(b"#") {
                continue;
            }

            // Peeled line: ^<hex-oid>, annotating the preceding ref.
            if let Some(rest) = line.strip_prefix(b"^") {
                let hex = std::str::from_utf8(rest)
                    .map_err(|_| RefError::Parse("invalid UTF-8 in peeled OID".into()))?;
                let peeled = ObjectId::from_hex(hex.trim())?;
                if let Some(last) = refs.last_mut() {
                    last.peeled = Some(peeled);
                }
                continue;
            }

            // Normal record: <hex-oid> <refname>
            let space_pos = line
                .find_byte(b' ')
                .ok_or_else(|| RefError::Parse("invalid packed-refs line".into()))?;

            let hex = std::str::from_utf8(&line[..space_pos])
                .map_err(|_| RefError::Parse("invalid UTF-8 in packed-refs OID".into()))?;
            let oid = ObjectId::from_hex(hex)?;

            let name = std::str::from_utf8(&line[space_pos + 1..])
                .map_err(|_| RefError::Parse("invalid UTF-8 in packed-refs name".into()))?
                .trim()
                .to_string();

            refs.push(PackedRef {
                name,
                oid,
                peeled: None,
            });
        }

        Ok(Self { refs })
    }

    /// Load packed-refs from disk. A missing file parses as empty.
    pub fn load(git_dir: &Path) -> Result<Self, RefError> {
        let path = git_dir.join("packed-refs");
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => return Err(RefError::IoPath { path, source: e }),
        };
        Self::parse(&data)
    }

    /// Look up a ref by full name.
    pub fn find(&self, name: &str) -> Option<&PackedRef> {
        self.refs.iter().find(|r| r.name == name)
    }

    /// All refs in file order.
    pub fn refs(&self) -> &[PackedRef] {
        &self.refs
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty() {
        let packed = PackedRefs::parse(b"").unwrap();
        assert!(packed.is_empty());
    }

    #[test]
    fn parse_skips_header_comment() {
        let data = b"# pack-refs with: peeled fully-peeled sorted \n\
                     da39a3ee5e6b4b0d3255bfef95601890afd80709 refs/heads/main\n";
        let packed = PackedRefs::parse(data).unwrap();
        assert_eq!(packed.refs().len(), 1);
        assert_eq!(packed.refs()[0].name, "refs/heads/main");
    }

    #[test]
    fn parse_attaches_peeled_line_to_previous_ref() {
        let data = b"da39a3ee5e6b4b0d3255bfef95601890afd80709 refs/tags/v1.0\n\
                     ^aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\n\
                     bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb refs/heads/main\n";
        let packed = PackedRefs::parse(data).unwrap();
        assert_eq!(packed.refs().len(), 2);
        assert_eq!(
            packed.refs()[0].peeled.unwrap().to_hex(),
            "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"
        );
        assert_eq!(packed.refs()[1].peeled, None);
    }

    #[test]
    fn find_by_full_name() {
        let data = b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa refs/heads/alpha\n\
                     bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb refs/heads/beta\n";
        let packed = PackedRefs::parse(data).unwrap();

        let beta = packed.find("refs/heads/beta").unwrap();
        assert_eq!(beta.oid.to_hex(), "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb");
        assert!(packed.find("refs/heads/missing").is_none());
    }

    #[test]
    fn load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let packed = PackedRefs::load(dir.path()).unwrap();
        assert!(packed.is_empty());
    }

    #[test]
    fn line_without_space_is_error() {
        assert!(PackedRefs::parse(b"justonefield\n").is_err());
    }

    #[test]
    fn bad_oid_is_error() {
        assert!(PackedRefs::parse(b"nothex refs/heads/x\n").is_err());
    }
}
