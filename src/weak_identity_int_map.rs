//! WeakIdentityIntMap: identity-keyed `i32` map that evicts released keys.

use crate::builder::WeakIdentityIntMapBuilder;
use crate::queue::ReferenceQueue;
use crate::traits::WeakIdentityMap;
use crate::tracked::Tracked;
use crate::views::{EntrySet, KeySet, Values};
use crate::weak_key::WeakKey;
use crate::weak_table::WeakTable;
use core::borrow::Borrow;
use core::cell::RefCell;
use core::fmt;
use core::hash::BuildHasher;
use parking_lot::ReentrantMutex;
use std::collections::hash_map::RandomState;

pub(crate) type OnRemove = Box<dyn FnMut(i32) + Send>;

struct State<K, S> {
    table: WeakTable<K, S>,
    on_remove: OnRemove,
    default_value: i32,
}

impl<K, S: BuildHasher> State<K, S> {
    /// Remove the entry of every released key and report its value.
    fn drain(&mut self, queue: &ReferenceQueue) {
        while let Some(slot) = queue.poll() {
            match self.table.remove_slot(slot) {
                Some(value) => {
                    log::trace!("evicting released key {:?} (value {})", slot, value);
                    (self.on_remove)(value);
                }
                // Removed explicitly or cleared before the release was seen.
                None => log::trace!("ignoring stale release of {:?}", slot),
            }
        }
    }
}

/// Maps key identity to an `i32`, holding keys weakly.
///
/// Keys are [`Tracked`] handles compared by identity, never by value. When
/// the last handle to a key is dropped, its entry is evicted at the start of
/// the next operation on the map and `on_remove` is called with its value.
/// Explicit removal (`remove_int`, `clear`) never calls `on_remove`.
///
/// Every operation runs under one reentrant lock, so the map can be shared
/// across threads. `on_remove` runs inside that lock and must not call back
/// into the same map; doing so panics.
///
/// Dropping the map unsubscribes it from every key it still holds.
pub struct WeakIdentityIntMap<K, S = RandomState> {
    inner: ReentrantMutex<RefCell<State<K, S>>>,
    queue: ReferenceQueue,
}

impl<K> WeakIdentityIntMap<K> {
    /// An empty map with default return value `0`.
    pub fn new<F>(on_remove: F) -> Self
    where
        F: FnMut(i32) + Send + 'static,
    {
        WeakIdentityIntMapBuilder::new().build(on_remove)
    }
}

impl<K, S> WeakIdentityIntMap<K, S>
where
    S: BuildHasher,
{
    pub(crate) fn from_parts(table: WeakTable<K, S>, on_remove: OnRemove, default_value: i32) -> Self {
        Self {
            inner: ReentrantMutex::new(RefCell::new(State {
                table,
                on_remove,
                default_value,
            })),
            queue: ReferenceQueue::new(),
        }
    }

    // Single entry point into the critical section: lock, borrow, drain, run.
    // The lock is reentrant, so the only way to find the state already
    // borrowed is a call from inside `on_remove`.
    fn access<R>(&self, f: impl FnOnce(&mut State<K, S>, &ReferenceQueue) -> R) -> R {
        let cell = self.inner.lock();
        let Ok(mut state) = cell.try_borrow_mut() else {
            panic!("reentrancy detected: map operation invoked from its own eviction callback");
        };
        state.drain(&self.queue);
        f(&mut *state, &self.queue)
    }

    /// Number of entries, after evicting released keys.
    pub fn len(&self) -> usize {
        self.access(|s, _| s.table.len())
    }

    pub fn is_empty(&self) -> bool {
        self.access(|s, _| s.table.is_empty())
    }

    pub fn contains_key(&self, key: &Tracked<K>) -> bool {
        self.access(|s, _| s.table.find(key).is_some())
    }

    pub fn contains_value(&self, value: i32) -> bool {
        self.access(|s, _| s.table.contains_value(value))
    }

    /// The value stored for `key`'s identity, or the default return value.
    pub fn get_int(&self, key: &Tracked<K>) -> i32 {
        self.access(|s, _| s.table.get(key).unwrap_or(s.default_value))
    }

    /// Associate `value` with `key`'s identity. Returns the previous value,
    /// or the default return value if there was none.
    pub fn put(&self, key: &Tracked<K>, value: i32) -> i32 {
        self.access(|s, q| s.table.put(key, value, q).unwrap_or(s.default_value))
    }

    /// Remove `key`'s entry without notifying `on_remove`. Returns the
    /// removed value, or the default return value if there was none.
    pub fn remove_int(&self, key: &Tracked<K>) -> i32 {
        self.access(|s, q| s.table.remove(key, q).unwrap_or(s.default_value))
    }

    /// `put` every pair in turn. Not atomic: evictions may be processed
    /// between pairs.
    pub fn put_all<I, Q>(&self, pairs: I)
    where
        I: IntoIterator<Item = (Q, i32)>,
        Q: Borrow<Tracked<K>>,
    {
        for (key, value) in pairs {
            self.put(key.borrow(), value);
        }
    }

    /// Copy every entry of `other` whose key is still alive.
    pub fn put_all_from<S2>(&self, other: &WeakIdentityIntMap<K, S2>)
    where
        S2: BuildHasher,
    {
        let pairs: Vec<(Tracked<K>, i32)> = other
            .entry_set()
            .iter()
            .filter_map(|e| e.key().map(|k| (k, e.int_value())))
            .collect();
        self.put_all(pairs.iter().map(|(k, v)| (k, *v)));
    }

    /// Drop every entry without notifying `on_remove`.
    pub fn clear(&self) {
        self.access(|s, q| {
            log::debug!("clearing weak identity map ({} entries)", s.table.len());
            s.table.clear(q);
        })
    }

    pub fn default_return_value(&self) -> i32 {
        self.access(|s, _| s.default_value)
    }

    /// Change what absent-key queries return. Stored values are untouched.
    pub fn set_default_return_value(&self, value: i32) {
        self.access(|s, _| s.default_value = value)
    }

    pub fn key_set(&self) -> KeySet<'_, K, S> {
        KeySet::new(self)
    }

    pub fn values(&self) -> Values<'_, K, S> {
        Values::new(self)
    }

    pub fn entry_set(&self) -> EntrySet<'_, K, S> {
        EntrySet::new(self)
    }

    /// Copy of every `(key, value)` pair. Keys are weak; they may be cleared
    /// by the time the caller looks at them.
    pub(crate) fn snapshot(&self) -> Vec<(WeakKey<K>, i32)> {
        self.access(|s, _| s.table.iter().map(|(_, k, v)| (k.clone(), v)).collect())
    }

    pub(crate) fn value_snapshot(&self) -> Vec<i32> {
        self.access(|s, _| s.table.iter().map(|(_, _, v)| v).collect())
    }
}

impl<K, S> WeakIdentityMap for WeakIdentityIntMap<K, S>
where
    S: BuildHasher,
{
    fn check_queue(&self) {
        if !self.queue.is_empty() {
            self.access(|_, _| ())
        }
    }
}

impl<K, S, Q> Extend<(Q, i32)> for WeakIdentityIntMap<K, S>
where
    S: BuildHasher,
    Q: Borrow<Tracked<K>>,
{
    fn extend<I: IntoIterator<Item = (Q, i32)>>(&mut self, iter: I) {
        self.put_all(iter);
    }
}

impl<'a, K, S, Q> Extend<(Q, i32)> for &'a WeakIdentityIntMap<K, S>
where
    S: BuildHasher,
    Q: Borrow<Tracked<K>>,
{
    fn extend<I: IntoIterator<Item = (Q, i32)>>(&mut self, iter: I) {
        self.put_all(iter);
    }
}

impl<K, S> Drop for WeakIdentityIntMap<K, S> {
    fn drop(&mut self) {
        // Pending releases are discarded with the queue.
        self.inner.get_mut().get_mut().table.unsubscribe_all(&self.queue);
    }
}

impl<K, S> fmt::Debug for WeakIdentityIntMap<K, S>
where
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (len, default_value) = self.access(|s, _| (s.table.len(), s.default_value));
        f.debug_struct("WeakIdentityIntMap")
            .field("len", &len)
            .field("default_return_value", &default_value)
            .field("pending_releases", &self.queue.len())
            .finish()
    }
}
