//! Multi-source object search.
//!
//! Search order: loose storage first, then packs newest-first. Loose wins
//! because it may hold a newer copy of an object mid-repack; either copy
//! decodes to the same bytes.

use gitro_hash::ObjectId;
use gitro_object::{ObjectType, RawObject};

use crate::{ObjectDatabase, OdbError};

/// Find an object by OID across all storage.
pub(crate) fn find_object(
    odb: &ObjectDatabase,
    oid: &ObjectId,
) -> Result<Option<RawObject>, OdbError> {
    if let Some(obj) = odb.loose().read(oid)? {
        return Ok(Some(obj));
    }

    let packs = odb.packs().read().unwrap();
    for pack in packs.iter() {
        // Ref-delta bases may live loose or in a sibling pack; hand the
        // pack a resolver that searches everything except itself.
        let resolver = |base_oid: &ObjectId| -> Option<(ObjectType, Vec<u8>)> {
            if let Ok(Some(obj)) = odb.loose().read(base_oid) {
                return Some((obj.kind, obj.data));
            }
            for other in packs.iter() {
                if std::ptr::eq(other, pack) {
                    continue;
                }
                if let Ok(Some(packed)) = other.read_object(base_oid) {
                    return Some((packed.kind, packed.data));
                }
            }
            None
        };

        if let Some(packed) = pack.read_object_with_resolver(oid, resolver)? {
            return Ok(Some(RawObject {
                kind: packed.kind,
                data: packed.data,
            }));
        }
    }

    Ok(None)
}

/// Check existence without materializing: loose file stat or index hit.
pub(crate) fn object_exists(odb: &ObjectDatabase, oid: &ObjectId) -> bool {
    if odb.loose().contains(oid) {
        return true;
    }

    let packs = odb.packs().read().unwrap();
    packs.iter().any(|pack| pack.contains(oid))
}
