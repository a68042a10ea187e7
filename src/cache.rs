use std::fmt::{self, Display, Formatter};
use std::sync::Arc;
use std::time::Instant;

use crossbeam::atomic::AtomicCell;
use failure::Error;
use log::{debug, info, warn};
use parking_lot::{Condvar, Mutex};
use serde_derive::Serialize;

use crate::error::{FetchError, LoadError};
use crate::table::MappingTable;
use crate::utils::LruCache;
use crate::{MinecraftVersion, Namespace};

/// Supplies the raw bytes of a mapping file, usually by downloading it.
///
/// Concurrent requests for the same key share a single call.
pub trait RawMappingSupplier: Send + Sync {
    fn fetch(&self, namespace: Namespace, version: &MinecraftVersion) -> Result<Vec<u8>, Error>;
}
impl<F> RawMappingSupplier for F
    where F: Fn(Namespace, &MinecraftVersion) -> Result<Vec<u8>, Error> + Send + Sync {
    #[inline]
    fn fetch(&self, namespace: Namespace, version: &MinecraftVersion) -> Result<Vec<u8>, Error> {
        self(namespace, version)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize)]
pub struct TableKey {
    pub namespace: Namespace,
    pub version: MinecraftVersion
}
impl TableKey {
    #[inline]
    pub fn new(namespace: Namespace, version: MinecraftVersion) -> TableKey {
        TableKey { namespace, version }
    }
}
impl Display for TableKey {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{} {}", self.namespace, self.version)
    }
}

enum SlotState {
    Building,
    Built(Arc<MappingTable>),
    /// Everyone who waited on the build gets this error.
    /// The slot is already gone from the cache, so later requests start over.
    Failed(LoadError),
}

/// Holds the table for a single key.
///
/// Only the caller that created the slot builds it,
/// everyone else asking for the same key waits on `finished`.
struct TableSlot {
    state: Mutex<SlotState>,
    finished: Condvar
}
impl TableSlot {
    #[inline]
    fn new(state: SlotState) -> TableSlot {
        TableSlot { state: Mutex::new(state), finished: Condvar::new() }
    }
    fn table(&self) -> Option<Arc<MappingTable>> {
        match *self.state.lock() {
            SlotState::Built(ref table) => Some(table.clone()),
            _ => None
        }
    }
    #[inline]
    fn is_building(&self) -> bool {
        matches!(*self.state.lock(), SlotState::Building)
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub builds: u64,
    pub failures: u64,
    pub resident: usize,
    /// The most tables kept at once, or zero if unbounded
    pub capacity: usize,
}

/// The parsed tables of every (namespace, version) loaded so far.
///
/// Tables are built lazily on first request and then shared until they're evicted.
/// Building a table only blocks other requests for the same key.
pub struct TableCache {
    slots: Mutex<LruCache<TableKey, Arc<TableSlot>>>,
    hits: AtomicCell<u64>,
    builds: AtomicCell<u64>,
    failures: AtomicCell<u64>,
}
impl TableCache {
    /// Create a cache that never evicts anything on its own
    #[inline]
    pub fn new() -> TableCache {
        TableCache::from_slots(LruCache::unbounded())
    }
    /// Create a cache that keeps at most `capacity` tables, or any number if zero.
    ///
    /// Keys that are still being built are never evicted,
    /// so the cache may briefly hold more tables than this.
    #[inline]
    pub fn with_capacity(capacity: usize) -> TableCache {
        TableCache::from_slots(LruCache::new(capacity))
    }
    fn from_slots(slots: LruCache<TableKey, Arc<TableSlot>>) -> TableCache {
        TableCache {
            slots: Mutex::new(slots),
            hits: AtomicCell::new(0),
            builds: AtomicCell::new(0),
            failures: AtomicCell::new(0),
        }
    }
    /// Lookup the slot for the key, returning whether we created it and must build it
    fn slot(&self, key: &TableKey) -> (Arc<TableSlot>, bool) {
        let mut slots = self.slots.lock();
        if let Some(slot) = slots.get_refresh(key) {
            return (slot.clone(), false)
        }
        let slot = Arc::new(TableSlot::new(SlotState::Building));
        let (_, evicted) = slots.insert_pinned(
            key.clone(),
            slot.clone(),
            |other| other.is_building()
        );
        for (key, _) in evicted {
            debug!("Evicted {} mappings from the cache", key);
        }
        (slot, true)
    }
    /// Return the cached table, parsing the supplier's mappings if it isn't present
    pub fn get_or_build<S>(
        &self,
        namespace: Namespace,
        version: &MinecraftVersion,
        supplier: &S
    ) -> Result<Arc<MappingTable>, LoadError> where S: RawMappingSupplier + ?Sized {
        let key = TableKey::new(namespace, version.clone());
        let (slot, created) = self.slot(&key);
        if !created {
            return self.wait_for(&slot)
        }
        let result = TableCache::build(&key, supplier).map(Arc::new);
        {
            let mut state = slot.state.lock();
            *state = match result {
                Ok(ref table) => {
                    self.builds.fetch_add(1);
                    SlotState::Built(table.clone())
                },
                Err(ref error) => {
                    self.failures.fetch_add(1);
                    warn!("Unable to load {} mappings: {}", key, error);
                    SlotState::Failed(error.clone())
                }
            };
        }
        slot.finished.notify_all();
        if result.is_err() {
            // Failures aren't remembered, so the next request tries again
            let mut slots = self.slots.lock();
            if slots.get(&key).map_or(false, |current| Arc::ptr_eq(current, &slot)) {
                slots.remove(&key);
            }
        }
        result
    }
    /// Wait for whoever is building the slot, sharing their outcome
    fn wait_for(&self, slot: &TableSlot) -> Result<Arc<MappingTable>, LoadError> {
        let mut state = slot.state.lock();
        loop {
            match *state {
                SlotState::Built(ref table) => {
                    self.hits.fetch_add(1);
                    return Ok(table.clone())
                },
                SlotState::Failed(ref error) => return Err(error.clone()),
                SlotState::Building => {}
            }
            slot.finished.wait(&mut state);
        }
    }
    fn build<S>(key: &TableKey, supplier: &S) -> Result<MappingTable, LoadError> where S: RawMappingSupplier + ?Sized {
        let start = Instant::now();
        let raw = supplier.fetch(key.namespace, &key.version)
            .map_err(|cause| FetchError {
                namespace: key.namespace,
                version: key.version.clone(),
                cause: Arc::new(cause)
            })?;
        let table = key.namespace.format().parse(&raw)?;
        info!(
            "Loaded {} mappings with {} entries in {}ms",
            key, table.len(), start.elapsed().as_millis()
        );
        Ok(table)
    }
    /// Return the table if it's already been built, without waiting on any builds in progress
    pub fn get(&self, namespace: Namespace, version: &MinecraftVersion) -> Option<Arc<MappingTable>> {
        let key = TableKey::new(namespace, version.clone());
        let slot = self.slots.lock().get(&key).cloned()?;
        slot.table()
    }
    #[inline]
    pub fn contains(&self, namespace: Namespace, version: &MinecraftVersion) -> bool {
        self.get(namespace, version).is_some()
    }
    /// Insert an already parsed table, replacing any existing one
    pub fn insert(&self, namespace: Namespace, version: &MinecraftVersion, table: MappingTable) -> Arc<MappingTable> {
        let key = TableKey::new(namespace, version.clone());
        let table = Arc::new(table);
        let slot = Arc::new(TableSlot::new(SlotState::Built(table.clone())));
        let (_, evicted) = self.slots.lock()
            .insert_pinned(key, slot, |other| other.is_building());
        for (key, _) in evicted {
            debug!("Evicted {} mappings from the cache", key);
        }
        table
    }
    /// Forget the table, returning whether anything was cached
    pub fn evict(&self, namespace: Namespace, version: &MinecraftVersion) -> bool {
        let key = TableKey::new(namespace, version.clone());
        let removed = self.slots.lock().remove(&key);
        removed.is_some()
    }
    pub fn clear(&self) {
        self.slots.lock().clear();
    }
    /// The number of tables that are fully built
    pub fn len(&self) -> usize {
        let slots = self.slots.lock();
        slots.values()
            .filter(|slot| slot.table().is_some())
            .count()
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(),
            builds: self.builds.load(),
            failures: self.failures.load(),
            resident: self.len(),
            capacity: self.slots.lock().capacity()
        }
    }
}
impl Default for TableCache {
    #[inline]
    fn default() -> Self {
        TableCache::new()
    }
}
