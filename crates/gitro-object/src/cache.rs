//! Bounded LRU cache for materialized objects.

use std::num::NonZeroUsize;

use gitro_hash::ObjectId;
use lru::LruCache;

use crate::RawObject;

/// LRU cache mapping object id to materialized bytes.
///
/// Bounded so that long-lived handles over large repositories do not grow
/// without limit; intermediate delta bases are never inserted, only the
/// final objects a caller asked for.
pub struct ObjectCache {
    cache: LruCache<ObjectId, RawObject>,
}

impl ObjectCache {
    /// Create with the given capacity (number of objects).
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).unwrap()),
            ),
        }
    }

    /// Get a cached object (promotes it to most-recently-used).
    pub fn get(&mut self, oid: &ObjectId) -> Option<&RawObject> {
        self.cache.get(oid)
    }

    /// Look at a cached object without promoting it.
    pub fn peek(&self, oid: &ObjectId) -> Option<&RawObject> {
        self.cache.peek(oid)
    }

    /// Insert an object. Returns the evicted entry if the cache was full.
    pub fn insert(&mut self, oid: ObjectId, obj: RawObject) -> Option<(ObjectId, RawObject)> {
        self.cache.push(oid, obj)
    }

    /// Check membership without promoting.
    pub fn contains(&self, oid: &ObjectId) -> bool {
        self.cache.contains(oid)
    }

    /// Current number of cached objects.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Drop all cached objects.
    pub fn clear(&mut self) {
        self.cache.clear();
    }
}
