//! Process-wide cache of parsed dictionary indexes.
//!
//! Eviction is deliberately crude: when inserting a new index would push the
//! occupancy past the capacity, the whole table is cleared first. There is
//! no per-entry recency tracking.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ahash::AHashMap;
use lazy_static::lazy_static;
use log::{debug, warn};
use parking_lot::Mutex;

use crate::dictionary::index::DictionaryIndex;
use crate::error::Result;

/// Default number of indexes kept alive by the global cache.
pub const DEFAULT_INDEX_CACHE_CAPACITY: usize = 8;

lazy_static! {
    static ref GLOBAL_INDEX_CACHE: Arc<IndexCache> =
        Arc::new(IndexCache::new(DEFAULT_INDEX_CACHE_CAPACITY));
}

/// The cache shared by every store that was not given its own.
pub fn global_index_cache() -> Arc<IndexCache> {
    Arc::clone(&GLOBAL_INDEX_CACHE)
}

/// Bounded table from index file path to parsed [`DictionaryIndex`].
#[derive(Debug)]
pub struct IndexCache {
    capacity: usize,
    table: Mutex<AHashMap<PathBuf, Arc<DictionaryIndex>>>,
}

impl IndexCache {
    /// Create a cache holding at most `capacity` indexes (minimum 1).
    pub fn new(capacity: usize) -> Self {
        IndexCache {
            capacity: capacity.max(1),
            table: Mutex::new(AHashMap::new()),
        }
    }

    /// Maximum number of cached indexes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of cached indexes.
    pub fn len(&self) -> usize {
        self.table.lock().len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.table.lock().is_empty()
    }

    /// Whether an index for `path` is currently cached.
    pub fn contains(&self, path: &Path) -> bool {
        self.table.lock().contains_key(path)
    }

    /// Drop every cached index.
    pub fn clear(&self) {
        self.table.lock().clear();
    }

    /// Return the cached index for `path`, building it on a miss.
    ///
    /// The build runs without holding the lock. Two threads missing on the
    /// same path may both build; the first insert wins and both callers get
    /// that instance, which is identical in content to the other.
    pub fn get_or_build<F>(&self, path: &Path, build: F) -> Result<Arc<DictionaryIndex>>
    where
        F: FnOnce(&Path) -> Result<DictionaryIndex>,
    {
        if let Some(index) = self.table.lock().get(path) {
            return Ok(Arc::clone(index));
        }

        debug!("building dictionary index for {}", path.display());
        let built = Arc::new(build(path)?);

        let mut table = self.table.lock();
        if let Some(existing) = table.get(path) {
            return Ok(Arc::clone(existing));
        }
        if table.len() >= self.capacity {
            warn!(
                "dictionary index cache full ({} entries), clearing",
                table.len()
            );
            table.clear();
        }
        table.insert(path.to_path_buf(), Arc::clone(&built));
        Ok(built)
    }

    /// Cached index for `path`, or the index file parsed from disk.
    pub fn load(&self, path: &Path) -> Result<Arc<DictionaryIndex>> {
        self.get_or_build(path, DictionaryIndex::read_from)
    }
}

impl Default for IndexCache {
    fn default() -> Self {
        Self::new(DEFAULT_INDEX_CACHE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::index::DictionaryIndexEntry;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn tiny(key: &str) -> Result<DictionaryIndex> {
        Ok(DictionaryIndex::from_entries(vec![DictionaryIndexEntry::new(
            key, 0, 1,
        )]))
    }

    #[test]
    fn test_hit_does_not_rebuild() {
        let cache = IndexCache::new(4);
        let builds = AtomicUsize::new(0);
        let path = Path::new("/dicts/a.idx");

        for _ in 0..3 {
            let index = cache
                .get_or_build(path, |_| {
                    builds.fetch_add(1, Ordering::SeqCst);
                    tiny("a")
                })
                .unwrap();
            assert!(index.contains(b"a"));
        }

        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_overflow_clears_whole_table() {
        let cache = IndexCache::new(2);
        cache.get_or_build(Path::new("/a.idx"), |_| tiny("a")).unwrap();
        cache.get_or_build(Path::new("/b.idx"), |_| tiny("b")).unwrap();
        assert_eq!(cache.len(), 2);

        // Not LRU: touching "/a.idx" does not protect it.
        cache.get_or_build(Path::new("/a.idx"), |_| tiny("a")).unwrap();
        cache.get_or_build(Path::new("/c.idx"), |_| tiny("c")).unwrap();

        assert_eq!(cache.len(), 1);
        assert!(cache.contains(Path::new("/c.idx")));
        assert!(!cache.contains(Path::new("/a.idx")));
        assert!(!cache.contains(Path::new("/b.idx")));
    }

    #[test]
    fn test_build_error_is_not_cached() {
        let cache = IndexCache::new(2);
        let path = Path::new("/missing.idx");
        assert!(
            cache
                .get_or_build(path, |_| Err(crate::error::GlossaError::format("bad")))
                .is_err()
        );
        assert!(cache.is_empty());
        assert!(cache.get_or_build(path, |_| tiny("x")).is_ok());
    }

    #[test]
    fn test_concurrent_first_access_converges() {
        let cache = Arc::new(IndexCache::new(4));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    cache
                        .get_or_build(Path::new("/shared.idx"), |_| tiny("shared"))
                        .unwrap()
                })
            })
            .collect();

        let indexes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let cached = cache
            .get_or_build(Path::new("/shared.idx"), |_| tiny("other"))
            .unwrap();
        assert!(cached.contains(b"shared"));
        for index in indexes {
            assert_eq!(index.entries(), cached.entries());
        }
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        assert_eq!(IndexCache::new(0).capacity(), 1);
    }
}
