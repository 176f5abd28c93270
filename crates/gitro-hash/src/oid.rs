use std::fmt;
use std::str::FromStr;

use crate::hex::{hex_decode, hex_to_string};
use crate::HashError;

/// A git object identifier — the SHA-1 hash of an object's content.
///
/// Held as the 20 raw digest bytes. The canonical textual form is the
/// 40-character lowercase hex string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 20]);

impl ObjectId {
    /// The null OID (all zeros).
    pub const NULL: Self = Self([0u8; 20]);

    /// Length of the raw digest in bytes.
    pub const RAW_LEN: usize = 20;

    /// Length of the hex representation in characters.
    pub const HEX_LEN: usize = 40;

    /// Create an ObjectId from raw digest bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HashError> {
        if bytes.len() != Self::RAW_LEN {
            return Err(HashError::InvalidHashLength {
                expected: Self::RAW_LEN,
                actual: bytes.len(),
            });
        }
        let mut raw = [0u8; 20];
        raw.copy_from_slice(bytes);
        Ok(Self(raw))
    }

    /// Create an ObjectId from a 40-character hex string.
    pub fn from_hex(hex: &str) -> Result<Self, HashError> {
        if hex.len() != Self::HEX_LEN {
            return Err(HashError::InvalidHexLength {
                expected: Self::HEX_LEN,
                actual: hex.len(),
            });
        }
        let mut raw = [0u8; 20];
        hex_decode(hex, &mut raw)?;
        Ok(Self(raw))
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// The lowercase hex representation.
    pub fn to_hex(&self) -> String {
        hex_to_string(&self.0)
    }

    /// Check if this is the null (all-zeros) OID.
    pub fn is_null(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// The first byte of the digest (for fan-out table indexing).
    pub fn first_byte(&self) -> u8 {
        self.0[0]
    }

    /// The loose object path component: `"xx/yyyy..."`.
    pub fn loose_path(&self) -> String {
        let hex = self.to_hex();
        format!("{}/{}", &hex[..2], &hex[2..])
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", &self.to_hex()[..8])
    }
}

impl FromStr for ObjectId {
    type Err = HashError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SAMPLE_HEX: &str = "da39a3ee5e6b4b0d3255bfef95601890afd80709";

    #[test]
    fn from_hex_and_back() {
        let oid = ObjectId::from_hex(SAMPLE_HEX).unwrap();
        assert_eq!(oid.to_hex(), SAMPLE_HEX);
        assert_eq!(oid.as_bytes().len(), 20);
    }

    #[test]
    fn from_hex_uppercase_normalizes() {
        let upper = ObjectId::from_hex(&SAMPLE_HEX.to_ascii_uppercase()).unwrap();
        assert_eq!(upper.to_hex(), SAMPLE_HEX);
    }

    #[test]
    fn display_and_parse_roundtrip() {
        let oid = ObjectId::from_hex(SAMPLE_HEX).unwrap();
        let parsed: ObjectId = oid.to_string().parse().unwrap();
        assert_eq!(parsed, oid);
    }

    #[test]
    fn debug_shows_short_hash() {
        let oid = ObjectId::from_hex(SAMPLE_HEX).unwrap();
        assert_eq!(format!("{:?}", oid), "ObjectId(da39a3ee)");
    }

    #[test]
    fn from_bytes_roundtrip() {
        let oid = ObjectId::from_hex(SAMPLE_HEX).unwrap();
        let again = ObjectId::from_bytes(oid.as_bytes()).unwrap();
        assert_eq!(again, oid);
    }

    #[test]
    fn from_bytes_wrong_length() {
        let err = ObjectId::from_bytes(&[0; 19]).unwrap_err();
        assert!(matches!(
            err,
            HashError::InvalidHashLength {
                expected: 20,
                actual: 19,
            }
        ));
    }

    #[test]
    fn from_hex_wrong_length() {
        let err = ObjectId::from_hex("abcd").unwrap_err();
        assert!(matches!(err, HashError::InvalidHexLength { .. }));
    }

    #[test]
    fn from_hex_invalid_character() {
        let err =
            ObjectId::from_hex("zzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz").unwrap_err();
        assert!(matches!(err, HashError::InvalidHex { .. }));
    }

    #[test]
    fn null_oid() {
        assert!(ObjectId::NULL.is_null());
        assert!(!ObjectId::from_hex(SAMPLE_HEX).unwrap().is_null());
    }

    #[test]
    fn ordering_follows_bytes() {
        let a = ObjectId::from_hex("0000000000000000000000000000000000000001").unwrap();
        let b = ObjectId::from_hex("0000000000000000000000000000000000000002").unwrap();
        assert!(a < b);
    }

    #[test]
    fn usable_as_map_key() {
        let oid = ObjectId::from_hex(SAMPLE_HEX).unwrap();
        let mut map = HashMap::new();
        map.insert(oid, 1);
        assert_eq!(map.get(&oid), Some(&1));
    }

    #[test]
    fn first_byte_and_loose_path() {
        let oid = ObjectId::from_hex(SAMPLE_HEX).unwrap();
        assert_eq!(oid.first_byte(), 0xda);
        assert_eq!(oid.loose_path(), format!("da/{}", &SAMPLE_HEX[2..]));
    }
}
