//! WeakKey: identity-comparing weak handle with a precomputed hash.

use crate::queue::ReferenceQueue;
use crate::tracked::{Shared, Tracked};
use crate::weak_table::Slot;
use core::fmt;
use core::hash::{Hash, Hasher};
use std::sync::Weak;

/// A weak reference to a key object that compares by identity.
///
/// The identity hash is captured at construction, so a key stays hashable
/// (and locatable in a table) after its referent is gone. Equality is not
/// reflexive: a cleared key equals nothing, itself included, which is why
/// only `PartialEq` is implemented.
pub struct WeakKey<K> {
    referent: Weak<Shared<K>>,
    hash: u64,
}

impl<K> WeakKey<K> {
    /// A disposable key for lookups; nothing is notified when `key` dies.
    pub fn new(key: &Tracked<K>) -> Self {
        Self {
            referent: Tracked::downgrade(key),
            hash: Tracked::identity_hash(key),
        }
    }

    /// A persistent key whose `slot` is pushed onto `queue` once `key` is
    /// released.
    pub(crate) fn registered(key: &Tracked<K>, queue: &ReferenceQueue, slot: Slot) -> Self {
        Tracked::register(key, queue, slot);
        Self::new(key)
    }

    /// The live referent, or `None` once it has been released.
    pub fn get(&self) -> Option<Tracked<K>> {
        self.referent.upgrade().map(Tracked::from_shared)
    }

    pub fn identity_hash(&self) -> u64 {
        self.hash
    }

    pub fn is_cleared(&self) -> bool {
        self.referent.strong_count() == 0
    }

    /// Identity comparison against a live handle without taking a new
    /// strong reference.
    pub(crate) fn refers_to(&self, key: &Tracked<K>) -> bool {
        !self.is_cleared() && core::ptr::eq(self.referent.as_ptr(), Tracked::as_ptr(key))
    }
}

impl<K> Clone for WeakKey<K> {
    fn clone(&self) -> Self {
        Self {
            referent: Weak::clone(&self.referent),
            hash: self.hash,
        }
    }
}

impl<K> PartialEq for WeakKey<K> {
    fn eq(&self, other: &Self) -> bool {
        !self.is_cleared() && !other.is_cleared() && Weak::ptr_eq(&self.referent, &other.referent)
    }
}

impl<K> Hash for WeakKey<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl<K> fmt::Debug for WeakKey<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakKey")
            .field("identity_hash", &format_args!("{:#x}", self.hash))
            .field("cleared", &self.is_cleared())
            .finish()
    }
}
