use std::fs;
use std::io::Read;

use flate2::bufread::ZlibDecoder;
use gitro_hash::ObjectId;
use gitro_object::{header, RawObject};

use crate::{LooseError, LooseStore};

impl LooseStore {
    /// Check if a loose object exists.
    pub fn contains(&self, oid: &ObjectId) -> bool {
        self.object_path(oid).is_file()
    }

    /// Read a loose object by OID.
    ///
    /// Returns `Ok(None)` if the object does not exist, `Err` if it exists
    /// but is corrupt. The returned content has the `"<type> <size>\0"`
    /// header stripped; the declared size must match the remaining length.
    pub fn read(&self, oid: &ObjectId) -> Result<Option<RawObject>, LooseError> {
        let path = self.object_path(oid);
        let compressed = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(LooseError::Io(e)),
        };

        let decompressed = inflate_all(&compressed, oid)?;
        let (kind, content_size, header_len) = header::parse_header(&decompressed)?;

        let content = &decompressed[header_len..];
        if content.len() != content_size {
            return Err(LooseError::Corrupt {
                oid: oid.to_hex(),
                reason: format!(
                    "header declares {content_size} bytes, found {}",
                    content.len()
                ),
            });
        }

        Ok(Some(RawObject {
            kind,
            data: content.to_vec(),
        }))
    }

}

/// Zlib-decompress the full contents of a loose object file.
fn inflate_all(compressed: &[u8], oid: &ObjectId) -> Result<Vec<u8>, LooseError> {
    let mut decoder = ZlibDecoder::new(compressed);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| LooseError::Decompress {
            oid: oid.to_hex(),
            source: e,
        })?;
    Ok(decompressed)
}
