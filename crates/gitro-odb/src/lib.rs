//! Unified object lookup for gitro.
//!
//! A single read interface over both storage forms: loose files under
//! `objects/xx/` and packfiles under `objects/pack/`. Lookups check the
//! in-memory cache, then loose storage, then each pack in turn; ref-delta
//! bases that cross storage boundaries are resolved back through this
//! facade's search.

mod search;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use gitro_hash::ObjectId;
use gitro_loose::LooseStore;
use gitro_object::cache::ObjectCache;
use gitro_object::RawObject;
use gitro_pack::pack::PackFile;

/// Default capacity of the decoded-object cache.
const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Errors from unified object lookup.
#[derive(Debug, thiserror::Error)]
pub enum OdbError {
    #[error(transparent)]
    Loose(#[from] gitro_loose::LooseError),

    #[error(transparent)]
    Pack(#[from] gitro_pack::PackError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Unified read-only object database.
pub struct ObjectDatabase {
    /// Loose object store.
    loose: LooseStore,
    /// Pack files, discovered once at open.
    packs: RwLock<Vec<PackFile>>,
    /// Bounded cache of materialized objects.
    cache: Mutex<ObjectCache>,
    /// Path to the objects directory.
    objects_dir: PathBuf,
}

impl ObjectDatabase {
    /// Open the object database at the given objects directory.
    pub fn open(objects_dir: impl AsRef<Path>) -> Result<Self, OdbError> {
        let objects_dir = objects_dir.as_ref().to_path_buf();
        let loose = LooseStore::open(&objects_dir);
        let packs = discover_packs(&objects_dir)?;

        Ok(Self {
            loose,
            packs: RwLock::new(packs),
            cache: Mutex::new(ObjectCache::new(DEFAULT_CACHE_CAPACITY)),
            objects_dir,
        })
    }

    /// Read an object by OID, searching loose storage then packs.
    pub fn read(&self, oid: &ObjectId) -> Result<Option<RawObject>, OdbError> {
        search::find_object(self, oid)
    }

    /// Read an object with caching. Repeat lookups of the same OID return
    /// the cached bytes, so they are byte-identical by construction.
    pub fn read_cached(&self, oid: &ObjectId) -> Result<Option<RawObject>, OdbError> {
        {
            let mut cache = self.cache.lock().unwrap();
            if let Some(obj) = cache.get(oid) {
                return Ok(Some(obj.clone()));
            }
        }

        let obj = self.read(oid)?;

        if let Some(ref obj) = obj {
            let mut cache = self.cache.lock().unwrap();
            cache.insert(*oid, obj.clone());
        }

        Ok(obj)
    }

    /// Check if an object exists (no decompression for packed objects).
    pub fn contains(&self, oid: &ObjectId) -> bool {
        search::object_exists(self, oid)
    }

    /// Path to the objects directory.
    pub fn objects_dir(&self) -> &Path {
        &self.objects_dir
    }

    pub(crate) fn loose(&self) -> &LooseStore {
        &self.loose
    }

    pub(crate) fn packs(&self) -> &RwLock<Vec<PackFile>> {
        &self.packs
    }
}

/// Discover `objects/pack/*.pack` files with a readable index.
fn discover_packs(objects_dir: &Path) -> Result<Vec<PackFile>, OdbError> {
    let pack_dir = objects_dir.join("pack");
    if !pack_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut entries: Vec<_> = std::fs::read_dir(&pack_dir)?
        .filter_map(|e| e.ok())
        .collect();

    // Newest first, so a freshly written pack shadows older copies.
    entries.sort_by(|a, b| {
        let a_time = a.metadata().and_then(|m| m.modified()).ok();
        let b_time = b.metadata().and_then(|m| m.modified()).ok();
        b_time.cmp(&a_time)
    });

    let mut packs = Vec::new();
    for entry in entries {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "pack") {
            match PackFile::open(&path) {
                Ok(pack) => packs.push(pack),
                // A pack without a usable index is skipped; its objects
                // may still be reachable loose or in another pack.
                Err(_) => continue,
            }
        }
    }

    Ok(packs)
}
