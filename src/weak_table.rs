//! WeakTable: structural layer mapping weak identity keys to `i32` values
//! through stable, generational slots.
//!
//! Each entry stores its precomputed hash, so the index never needs a live
//! referent to rehash or to unlink an entry whose key was already released.

use crate::queue::ReferenceQueue;
use crate::tracked::Tracked;
use crate::weak_key::WeakKey;
use core::hash::BuildHasher;
use hashbrown::HashTable;
use slotmap::{DefaultKey, SlotMap};
use std::collections::hash_map::RandomState;

/// Stable handle to a table entry. Generational: a handle to a removed entry
/// never resolves to whatever later reuses the storage.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Slot(DefaultKey);

impl Slot {
    pub(crate) fn new(k: DefaultKey) -> Self {
        Slot(k)
    }
    pub(crate) fn raw(&self) -> DefaultKey {
        self.0
    }
}

#[derive(Debug)]
struct Entry<K> {
    key: WeakKey<K>,
    value: i32,
    hash: u64,
}

pub(crate) struct WeakTable<K, S = RandomState> {
    hasher: S,
    index: HashTable<DefaultKey>,
    slots: SlotMap<DefaultKey, Entry<K>>,
}

impl<K, S> WeakTable<K, S>
where
    S: BuildHasher,
{
    pub(crate) fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self {
            hasher,
            index: HashTable::with_capacity(capacity),
            slots: SlotMap::with_capacity_and_key(capacity),
        }
    }

    fn make_hash(&self, key: &Tracked<K>) -> u64 {
        self.hasher.hash_one(Tracked::identity_hash(key))
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub(crate) fn find(&self, key: &Tracked<K>) -> Option<Slot> {
        let hash = self.make_hash(key);
        self.index
            .find(hash, |&k| {
                self.slots
                    .get(k)
                    .map(|e| e.key.refers_to(key))
                    .unwrap_or(false)
            })
            .map(|&k| Slot::new(k))
    }

    pub(crate) fn get(&self, key: &Tracked<K>) -> Option<i32> {
        let slot = self.find(key)?;
        self.slots.get(slot.raw()).map(|e| e.value)
    }

    pub(crate) fn contains_value(&self, value: i32) -> bool {
        self.slots.values().any(|e| e.value == value)
    }

    /// Insert `key -> value`, or replace the value of the live entry with the
    /// same identity. Only a fresh entry registers with `queue`; a replaced
    /// entry keeps its slot and registration. Returns the previous value.
    pub(crate) fn put(&mut self, key: &Tracked<K>, value: i32, queue: &ReferenceQueue) -> Option<i32> {
        let hash = self.make_hash(key);
        match self.index.entry(
            hash,
            |&kk| {
                self.slots
                    .get(kk)
                    .map(|e| e.key.refers_to(key))
                    .unwrap_or(false)
            },
            |&kk| self.slots.get(kk).map(|e| e.hash).unwrap_or(0),
        ) {
            hashbrown::hash_table::Entry::Occupied(o) => {
                let k = *o.get();
                self.slots
                    .get_mut(k)
                    .map(|e| core::mem::replace(&mut e.value, value))
            }
            hashbrown::hash_table::Entry::Vacant(v) => {
                let k = self.slots.insert_with_key(|k| Entry {
                    key: WeakKey::registered(key, queue, Slot::new(k)),
                    value,
                    hash,
                });
                let _ = v.insert(k);
                None
            }
        }
    }

    /// Explicit removal by identity. The slot is unsubscribed from `key`, so
    /// its later release does not reach `queue`.
    pub(crate) fn remove(&mut self, key: &Tracked<K>, queue: &ReferenceQueue) -> Option<i32> {
        let slot = self.find(key)?;
        let value = self.remove_slot(slot)?;
        Tracked::unregister(key, queue, slot);
        Some(value)
    }

    /// Removal by slot, used when draining released keys. `None` if the slot
    /// no longer exists.
    pub(crate) fn remove_slot(&mut self, slot: Slot) -> Option<i32> {
        let k = slot.raw();
        let entry = self.slots.remove(k)?;
        if let Ok(occupied) = self.index.find_entry(entry.hash, |&kk| kk == k) {
            occupied.remove();
        }
        Some(entry.value)
    }

    /// Drop every entry, unsubscribing the ones whose key is still alive.
    pub(crate) fn clear(&mut self, queue: &ReferenceQueue) {
        self.unsubscribe_all(queue);
        self.index.clear();
        self.slots.clear();
    }

    pub(crate) fn iter(&self) -> Iter<'_, K> {
        Iter {
            it: self.slots.iter(),
        }
    }
}

impl<K, S> WeakTable<K, S> {
    /// Remove this table's registration from every live key. Entries stay.
    pub(crate) fn unsubscribe_all(&self, queue: &ReferenceQueue) {
        for (k, e) in self.slots.iter() {
            if let Some(key) = e.key.get() {
                Tracked::unregister(&key, queue, Slot::new(k));
            }
        }
    }
}

/// Iterator over `(slot, key, value)` of every entry, released or not.
pub(crate) struct Iter<'a, K> {
    it: slotmap::basic::Iter<'a, DefaultKey, Entry<K>>,
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = (Slot, &'a WeakKey<K>, i32);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(k, e)| (Slot::new(k), &e.key, e.value))
    }
}
