use crate::weak_identity_int_map::WeakIdentityIntMap;
use crate::weak_table::WeakTable;
use core::hash::BuildHasher;
use std::collections::hash_map::RandomState;

/// Builder for configuring a [`WeakIdentityIntMap`].
///
/// # Example
///
/// ```
/// use weak_identity_map::{Tracked, WeakIdentityIntMapBuilder};
///
/// let map = WeakIdentityIntMapBuilder::new()
///     .default_return_value(-1)
///     .capacity(64)
///     .build(|evicted| println!("released key held {evicted}"));
///
/// let key = Tracked::new("session");
/// assert_eq!(map.get_int(&key), -1);
/// ```
pub struct WeakIdentityIntMapBuilder<S = RandomState> {
    default_return_value: i32,
    capacity: usize,
    hasher: S,
}

impl WeakIdentityIntMapBuilder {
    /// A builder with default return value `0`, no preallocation and the
    /// standard random hasher.
    pub fn new() -> Self {
        Self {
            default_return_value: 0,
            capacity: 0,
            hasher: RandomState::new(),
        }
    }
}

impl<S> WeakIdentityIntMapBuilder<S>
where
    S: BuildHasher,
{
    /// What absent-key queries return until changed on the map.
    ///
    /// Default: 0
    pub fn default_return_value(mut self, value: i32) -> Self {
        self.default_return_value = value;
        self
    }

    /// Number of entries to allocate room for up front.
    ///
    /// Default: 0
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Hash builder used to spread identity hashes over the index.
    pub fn hasher<S2: BuildHasher>(self, hasher: S2) -> WeakIdentityIntMapBuilder<S2> {
        WeakIdentityIntMapBuilder {
            default_return_value: self.default_return_value,
            capacity: self.capacity,
            hasher,
        }
    }

    /// Build the map. `on_remove` receives the value of every entry evicted
    /// because its key was released.
    pub fn build<K, F>(self, on_remove: F) -> WeakIdentityIntMap<K, S>
    where
        F: FnMut(i32) + Send + 'static,
    {
        WeakIdentityIntMap::from_parts(
            WeakTable::with_capacity_and_hasher(self.capacity, self.hasher),
            Box::new(on_remove),
            self.default_return_value,
        )
    }
}

impl Default for WeakIdentityIntMapBuilder {
    fn default() -> Self {
        Self::new()
    }
}
