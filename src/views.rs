//! Read-only projections over a [`WeakIdentityIntMap`].
//!
//! Views borrow the map and hold nothing else. Every method goes back to the
//! map, so it first evicts released keys. Iterators work on a copy taken
//! when they are created and hold their keys weakly: a key seen by an
//! iterator can be released before it is resolved, which shows up as `None`
//! (entries) or as the key being skipped (key set).

use crate::error::MapError;
use crate::tracked::Tracked;
use crate::weak_identity_int_map::WeakIdentityIntMap;
use crate::weak_key::WeakKey;
use core::fmt;
use core::hash::BuildHasher;
use core::iter::FusedIterator;

/// The keys of a map.
pub struct KeySet<'a, K, S> {
    map: &'a WeakIdentityIntMap<K, S>,
}

impl<'a, K, S: BuildHasher> KeySet<'a, K, S> {
    pub(crate) fn new(map: &'a WeakIdentityIntMap<K, S>) -> Self {
        Self { map }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn contains(&self, key: &Tracked<K>) -> bool {
        self.map.contains_key(key)
    }

    /// Keys still alive when the iterator reaches them.
    pub fn iter(&self) -> Keys<K> {
        Keys {
            inner: self.map.snapshot().into_iter(),
        }
    }
}

impl<'a, K, S: BuildHasher> IntoIterator for KeySet<'a, K, S> {
    type Item = Tracked<K>;
    type IntoIter = Keys<K>;
    fn into_iter(self) -> Keys<K> {
        self.iter()
    }
}

impl<'a, 'b, K, S: BuildHasher> IntoIterator for &'b KeySet<'a, K, S> {
    type Item = Tracked<K>;
    type IntoIter = Keys<K>;
    fn into_iter(self) -> Keys<K> {
        self.iter()
    }
}

/// Iterator over the live keys of a [`KeySet`].
pub struct Keys<K> {
    inner: std::vec::IntoIter<(WeakKey<K>, i32)>,
}

impl<K> Iterator for Keys<K> {
    type Item = Tracked<K>;

    fn next(&mut self) -> Option<Tracked<K>> {
        self.inner.by_ref().find_map(|(k, _)| k.get())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.inner.len()))
    }
}

impl<K> FusedIterator for Keys<K> {}

/// The values of a map.
pub struct Values<'a, K, S> {
    map: &'a WeakIdentityIntMap<K, S>,
}

impl<'a, K, S: BuildHasher> Values<'a, K, S> {
    pub(crate) fn new(map: &'a WeakIdentityIntMap<K, S>) -> Self {
        Self { map }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn contains(&self, value: i32) -> bool {
        self.map.contains_value(value)
    }

    pub fn iter(&self) -> ValuesIter {
        ValuesIter {
            inner: self.map.value_snapshot().into_iter(),
        }
    }
}

impl<'a, K, S: BuildHasher> IntoIterator for Values<'a, K, S> {
    type Item = i32;
    type IntoIter = ValuesIter;
    fn into_iter(self) -> ValuesIter {
        self.iter()
    }
}

/// Iterator over the values of a [`Values`] view.
pub struct ValuesIter {
    inner: std::vec::IntoIter<i32>,
}

impl Iterator for ValuesIter {
    type Item = i32;

    fn next(&mut self) -> Option<i32> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for ValuesIter {}
impl FusedIterator for ValuesIter {}

/// The entries of a map.
pub struct EntrySet<'a, K, S> {
    map: &'a WeakIdentityIntMap<K, S>,
}

impl<'a, K, S: BuildHasher> EntrySet<'a, K, S> {
    pub(crate) fn new(map: &'a WeakIdentityIntMap<K, S>) -> Self {
        Self { map }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> Entries<K> {
        Entries {
            inner: self.map.snapshot().into_iter(),
        }
    }
}

impl<'a, K, S: BuildHasher> IntoIterator for EntrySet<'a, K, S> {
    type Item = Entry<K>;
    type IntoIter = Entries<K>;
    fn into_iter(self) -> Entries<K> {
        self.iter()
    }
}

/// Iterator over the entries of an [`EntrySet`].
pub struct Entries<K> {
    inner: std::vec::IntoIter<(WeakKey<K>, i32)>,
}

impl<K> Iterator for Entries<K> {
    type Item = Entry<K>;

    fn next(&mut self) -> Option<Entry<K>> {
        self.inner.next().map(|(key, value)| Entry { key, value })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K> ExactSizeIterator for Entries<K> {}
impl<K> FusedIterator for Entries<K> {}

/// A `(key, value)` pair produced by [`Entries`]. The key is resolved on
/// each call to [`Entry::key`].
pub struct Entry<K> {
    key: WeakKey<K>,
    value: i32,
}

impl<K> Entry<K> {
    /// The key, or `None` if it has been released since the entry was taken.
    pub fn key(&self) -> Option<Tracked<K>> {
        self.key.get()
    }

    pub fn int_value(&self) -> i32 {
        self.value
    }

    /// Entries are read-only; always fails.
    pub fn set_value(&mut self, _value: i32) -> Result<i32, MapError> {
        Err(MapError::UnsupportedOperation)
    }
}

impl<K> fmt::Debug for Entry<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("key", &self.key)
            .field("value", &self.value)
            .finish()
    }
}
