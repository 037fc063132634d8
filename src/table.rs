//! Index table
//!
//! In-memory key → value map plus the log end offset it reflects.
//!
//! ## Concurrency
//! - `map`: RwLock (many concurrent readers, exclusive writer)
//! - `end_offset`: atomic, published with `Release` after the entries it
//!   covers are inserted, read with `Acquire`
//!
//! Callers serialize mutation themselves (see `Index`); the table only
//! guarantees that a reader who sees an end offset also sees the entries
//! inserted before it was published.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::entry::{IndexEntry, IndexValue};
use crate::key::IndexKey;

pub struct IndexTable<K> {
    map: RwLock<HashMap<K, IndexValue>>,
    end_offset: AtomicU64,
}

impl<K: IndexKey> IndexTable<K> {
    pub fn new() -> Self {
        Self {
            map: RwLock::new(HashMap::new()),
            end_offset: AtomicU64::new(0),
        }
    }

    pub fn get(&self, key: &K) -> Option<IndexValue> {
        self.map.read().get(key).copied()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.map.read().contains_key(key)
    }

    /// Keys not present, in input order (one read lock for the whole scan)
    pub fn missing(&self, keys: &[K]) -> Vec<K> {
        let map = self.map.read();
        keys.iter()
            .filter(|k| !map.contains_key(*k))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn end_offset(&self) -> u64 {
        self.end_offset.load(Ordering::Acquire)
    }

    /// Insert or overwrite every entry under one write lock
    pub fn insert_all<'a, I>(&self, entries: I)
    where
        I: IntoIterator<Item = &'a IndexEntry<K>>,
    {
        let mut map = self.map.write();
        for entry in entries {
            map.insert(entry.key.clone(), entry.value);
        }
    }

    /// Make a new end offset visible to readers
    pub fn publish_end_offset(&self, offset: u64) {
        self.end_offset.store(offset, Ordering::Release);
    }

    /// Capture the end offset, then copy the map
    ///
    /// The offset is read first so it never overstates what the copy holds.
    pub fn snapshot(&self) -> (u64, Vec<(K, IndexValue)>) {
        let end_offset = self.end_offset();
        let entries = self
            .map
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        (end_offset, entries)
    }

    /// Copy of every entry whose value offset is at or after `offset`
    pub fn entries_from(&self, offset: u64) -> Vec<IndexEntry<K>> {
        let mut entries: Vec<_> = self
            .map
            .read()
            .iter()
            .filter(|(_, v)| v.offset >= offset)
            .map(|(k, v)| IndexEntry::new(k.clone(), *v))
            .collect();
        entries.sort_by_key(|e| e.value.offset);
        entries
    }

    /// Swap in recovered state
    pub fn replace(&self, map: HashMap<K, IndexValue>, end_offset: u64) {
        *self.map.write() = map;
        self.publish_end_offset(end_offset);
    }

    /// Empty table, end offset zero
    pub fn clear(&self) {
        self.replace(HashMap::new(), 0);
    }
}

impl<K: IndexKey> Default for IndexTable<K> {
    fn default() -> Self {
        Self::new()
    }
}
