use bstr::{BStr, BString, ByteSlice};
use gitro_hash::ObjectId;

use crate::ObjectError;

/// A parsed commit: the typed `tree`/`parent` headers the walker needs,
/// every other header preserved verbatim, and the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// OID of the root tree.
    pub tree: ObjectId,
    /// Parent commit OIDs (empty for a root commit, several for a merge).
    pub parents: Vec<ObjectId>,
    /// Remaining headers in file order, e.g. `author`, `committer`,
    /// `encoding`, `gpgsig`. Multi-line values (continuation lines starting
    /// with a space) are folded into the value with embedded newlines.
    pub headers: Vec<(BString, BString)>,
    /// Commit message (everything after the blank line separator).
    pub message: BString,
}

impl Commit {
    /// Parse commit content from raw bytes (no loose header).
    pub fn parse(content: &[u8]) -> Result<Self, ObjectError> {
        let mut tree: Option<ObjectId> = None;
        let mut parents = Vec::new();
        let mut headers: Vec<(BString, BString)> = Vec::new();

        let data = content;
        let mut pos = 0;

        loop {
            if pos >= data.len() {
                // No message; unusual but possible.
                break;
            }

            // A blank line separates headers from the message.
            if data[pos] == b'\n' {
                pos += 1;
                break;
            }

            let line_end = data[pos..]
                .iter()
                .position(|&b| b == b'\n')
                .map(|p| p + pos)
                .unwrap_or(data.len());
            let line = &data[pos..line_end];

            let space_pos = line.iter().position(|&b| b == b' ').ok_or_else(|| {
                ObjectError::InvalidHeader(format!(
                    "commit header line without space at offset {pos}"
                ))
            })?;
            let key = &line[..space_pos];
            let value = &line[space_pos + 1..];

            match key {
                b"tree" => {
                    let hex = std::str::from_utf8(value).map_err(|_| {
                        ObjectError::InvalidHeader("non-UTF8 tree OID".into())
                    })?;
                    tree = Some(ObjectId::from_hex(hex)?);
                    pos = line_end + 1;
                }
                b"parent" => {
                    let hex = std::str::from_utf8(value).map_err(|_| {
                        ObjectError::InvalidHeader("non-UTF8 parent OID".into())
                    })?;
                    parents.push(ObjectId::from_hex(hex)?);
                    pos = line_end + 1;
                }
                _ => {
                    // Fold continuation lines (leading space) into the value,
                    // so gpgsig and mergetag survive intact.
                    let mut val = Vec::from(value);
                    let mut next = line_end + 1;
                    while next < data.len() && data[next] == b' ' {
                        val.push(b'\n');
                        let cont_end = data[next..]
                            .iter()
                            .position(|&b| b == b'\n')
                            .map(|p| p + next)
                            .unwrap_or(data.len());
                        val.extend_from_slice(&data[next + 1..cont_end]);
                        next = cont_end + 1;
                    }
                    headers.push((BString::from(key), BString::from(val)));
                    pos = next;
                }
            }
        }

        let tree = tree.ok_or(ObjectError::MissingCommitField { field: "tree" })?;
        let message = BString::from(&data[pos.min(data.len())..]);

        Ok(Self {
            tree,
            parents,
            headers,
            message,
        })
    }

    /// Look up a header by key (first match).
    pub fn header(&self, key: &str) -> Option<&BStr> {
        self.headers
            .iter()
            .find(|(k, _)| k == key.as_bytes())
            .map(|(_, v)| v.as_bstr())
    }

    /// The committer timestamp in seconds since epoch, if present and
    /// well-formed. A committer header ends with `<timestamp> <tz>`.
    pub fn commit_time(&self) -> Option<i64> {
        let value = self.header("committer")?;
        let mut fields = value.rsplitn(3, |&b| b == b' ');
        let _tz = fields.next()?;
        let ts = fields.next()?;
        std::str::from_utf8(ts).ok()?.parse().ok()
    }

    /// Is this a root commit? (no parents)
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// Is this a merge commit? (more than one parent)
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    /// The first line of the message.
    pub fn summary(&self) -> &BStr {
        let msg: &[u8] = self.message.as_ref();
        match msg.find_byte(b'\n') {
            Some(pos) => BStr::new(&msg[..pos]),
            None => BStr::new(msg),
        }
    }
}
