//! Replay-side LRU object cache (spec §4.4 "Supplemented"; grounded on
//! `original_source/util/object_cache.hpp`).
//!
//! Not part of the record/hash/serialize path. A caller driving the Parser
//! across multiple archives can use this to avoid re-invoking its creator
//! callback for an object it already replayed, bounded by entry count
//! rather than byte size (the original bounds it by a caller-supplied
//! `size_t` per object; this port keeps that parameter but most callers
//! will just pass `1` per entry and size the cache in object counts).

use fossilize_hash::FxHashMap;
use std::collections::VecDeque;

struct Entry<T> {
    hash: u64,
    object: T,
    size: usize,
}

/// An LRU cache from content hash to a caller-defined replayed object.
///
/// `T` is typically a lightweight handle (the replayed API object), so this
/// is `Clone`-friendly rather than owning heavyweight state directly.
pub struct ObjectCache<T> {
    target_size: usize,
    total_size: usize,
    hash_to_index: FxHashMap<u64, usize>,
    // Front = most recently used. A `VecDeque` plus an index map gives O(1)
    // lookup and amortized O(1) move-to-front via swap-remove + push_front,
    // matching the original's intrusive list without needing unsafe code.
    lru: VecDeque<Entry<T>>,
}

impl<T: Clone> Default for ObjectCache<T> {
    fn default() -> Self {
        ObjectCache::new()
    }
}

impl<T: Clone> ObjectCache<T> {
    pub fn new() -> Self {
        ObjectCache {
            target_size: 0,
            total_size: 0,
            hash_to_index: FxHashMap::default(),
            lru: VecDeque::new(),
        }
    }

    pub fn set_target_size(&mut self, size: usize) {
        self.target_size = size;
    }

    /// Looks up `hash`, and if found, promotes it to most-recently-used.
    pub fn find_object(&mut self, hash: u64) -> Option<T> {
        let index = *self.hash_to_index.get(&hash)?;
        let entry = self.lru.remove(index).expect("index map out of sync with lru");
        self.reindex_from(index);
        let object = entry.object.clone();
        self.lru.push_front(entry);
        self.hash_to_index.insert(hash, 0);
        self.reindex_from(0);
        Some(object)
    }

    pub fn insert_object(&mut self, hash: u64, object: T, object_size: usize) {
        self.lru.push_front(Entry {
            hash,
            object,
            size: object_size,
        });
        self.total_size += object_size;
        self.reindex_from(0);
    }

    /// Evicts least-recently-used entries, calling `deleter(hash, object)`
    /// for each, until the cache is at or under its target size.
    pub fn prune_cache(&mut self, mut deleter: impl FnMut(u64, T)) {
        while self.total_size > self.target_size {
            let entry = self.lru.pop_back().expect("total_size > 0 implies a back entry");
            self.total_size -= entry.size;
            self.hash_to_index.remove(&entry.hash);
            deleter(entry.hash, entry.object);
        }
        self.reindex_from(0);
    }

    /// Evicts every entry, calling `deleter(hash, object)` for each.
    pub fn delete_cache(&mut self, mut deleter: impl FnMut(u64, T)) {
        while let Some(entry) = self.lru.pop_back() {
            deleter(entry.hash, entry.object);
        }
        self.total_size = 0;
        self.hash_to_index.clear();
    }

    pub fn current_total_size(&self) -> usize {
        self.total_size
    }

    pub fn current_object_count(&self) -> usize {
        self.lru.len()
    }

    fn reindex_from(&mut self, start: usize) {
        for i in start..self.lru.len() {
            self.hash_to_index.insert(self.lru[i].hash, i);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_find() {
        let mut cache: ObjectCache<u32> = ObjectCache::new();
        cache.set_target_size(100);
        cache.insert_object(1, 111, 10);
        cache.insert_object(2, 222, 10);
        assert_eq!(cache.find_object(1), Some(111));
        assert_eq!(cache.find_object(3), None);
        assert_eq!(cache.current_object_count(), 2);
    }

    #[test]
    fn prune_evicts_least_recently_used() {
        let mut cache: ObjectCache<u32> = ObjectCache::new();
        cache.set_target_size(10);
        cache.insert_object(1, 111, 10);
        cache.insert_object(2, 222, 10);
        // Touch 1 so 2 becomes the least-recently-used entry.
        cache.find_object(1);
        let mut evicted = Vec::new();
        cache.prune_cache(|hash, obj| evicted.push((hash, obj)));
        assert_eq!(evicted, vec![(2, 222)]);
        assert_eq!(cache.current_total_size(), 10);
        assert_eq!(cache.find_object(1), Some(111));
    }

    #[test]
    fn delete_cache_clears_everything() {
        let mut cache: ObjectCache<u32> = ObjectCache::new();
        cache.insert_object(1, 111, 5);
        cache.insert_object(2, 222, 5);
        let mut evicted = Vec::new();
        cache.delete_cache(|hash, obj| evicted.push((hash, obj)));
        assert_eq!(evicted.len(), 2);
        assert_eq!(cache.current_total_size(), 0);
        assert_eq!(cache.current_object_count(), 0);
    }
}
