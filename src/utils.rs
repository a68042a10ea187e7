use std::hash::{Hash, BuildHasher};
use std::ops::Deref;
use std::collections::hash_map::RandomState;

use indexmap::{IndexMap, map::Entry};

/// An insertion ordered map that evicts its least recently used entries.
///
/// Entries are kept in order of use, with the most recently used entry last.
/// A capacity of zero means the cache is unbounded.
#[derive(Clone, Debug)]
pub struct LruCache<K: Eq + Hash, V, S: BuildHasher = RandomState> {
    capacity: usize,
    map: IndexMap<K, V, S>
}
impl<K: Eq + Hash, V> LruCache<K, V> {
    #[inline]
    pub fn new(capacity: usize) -> LruCache<K, V> {
        LruCache { capacity, map: IndexMap::with_capacity(capacity) }
    }
    #[inline]
    pub fn unbounded() -> LruCache<K, V> {
        LruCache::new(0)
    }
}
impl<K: Eq + Hash, V, S: BuildHasher> LruCache<K, V, S> {
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
    /// Evict the oldest entries until we're back within capacity.
    ///
    /// Pinned entries and the newest entry are never evicted,
    /// so the cache may stay over capacity until they're released.
    fn cleanup<F: Fn(&V) -> bool>(&mut self, pinned: F) -> Vec<(K, V)> {
        let mut evicted = Vec::new();
        if self.capacity == 0 {
            return evicted
        }
        let mut index = 0;
        while self.map.len() > self.capacity && index + 1 < self.map.len() {
            if pinned(&self.map[index]) {
                index += 1;
                continue
            }
            match self.map.shift_remove_index(index) {
                Some(entry) => evicted.push(entry),
                None => break
            }
        }
        evicted
    }
    /// Lookup the value and mark it as the most recently used
    pub fn get_refresh(&mut self, key: &K) -> Option<&V> {
        let index = self.map.get_index_of(key)?;
        let last = self.map.len() - 1;
        self.map.move_index(index, last);
        self.map.get_index(last).map(|(_, value)| value)
    }
    /// Insert the value as the most recently used,
    /// returning the old value for the key and whatever had to be evicted.
    #[inline]
    pub fn insert(&mut self, key: K, value: V) -> (Option<V>, Vec<(K, V)>) {
        self.insert_pinned(key, value, |_| false)
    }
    /// Insert the value, evicting only the entries that aren't pinned
    pub fn insert_pinned<F>(&mut self, key: K, value: V, pinned: F) -> (Option<V>, Vec<(K, V)>)
        where F: Fn(&V) -> bool {
        let (index, old) = match self.map.entry(key) {
            Entry::Occupied(mut entry) => (entry.index(), Some(entry.insert(value))),
            Entry::Vacant(entry) => {
                let index = entry.index();
                entry.insert(value);
                (index, None)
            }
        };
        let last = self.map.len() - 1;
        self.map.move_index(index, last);
        (old, self.cleanup(pinned))
    }
    #[inline]
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.map.shift_remove(key)
    }
    #[inline]
    pub fn clear(&mut self) {
        self.map.clear()
    }
}
impl<K: Eq + Hash, V, S: BuildHasher> Deref for LruCache<K, V, S> {
    type Target = IndexMap<K, V, S>;

    #[inline(always)]
    fn deref(&self) -> &IndexMap<K, V, S> {
        &self.map
    }
}
