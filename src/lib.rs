//! weak-identity-map: a thread-safe map from key identity to `i32` that
//! holds its keys weakly and reports the value of every entry whose key was
//! released.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a side table keyed by object identity that cleans up after
//!   itself, with a callback telling the owner which value just lost its
//!   key.
//! - Layers:
//!   - Tracked<K> / ReferenceQueue: the reachability signal. A `Tracked` is
//!     an `Arc`-backed owning handle; releasing its last clone pushes every
//!     slot registered on it onto that slot's map queue.
//!   - WeakKey<K>: weak handle comparing by identity, with the identity hash
//!     captured up front so a released key stays hashable.
//!   - WeakTable<K, S>: structural layer with stable generational slots and
//!     a precomputed hash per entry; never needs a live referent to unlink
//!     an entry.
//!   - WeakIdentityIntMap<K, S>: public API; drains the queue before every
//!     operation and calls `on_remove` for each evicted entry.
//!   - KeySet / Values / EntrySet: read-only views borrowing the map.
//!
//! Reachability semantics
//! - "Unreachable" means "last `Tracked` handle dropped". This is
//!   deterministic and fires no later than a tracing collector would.
//! - The releasing thread only enqueues; eviction and the callback happen
//!   on whichever thread next touches the map. There is no background
//!   thread, and a map that is never touched again never reports.
//!
//! Callback contract
//! - `on_remove` fires only for entries lost to a release, exactly once per
//!   entry. `remove_int`, `clear` and replacing `put` never fire it.
//! - It runs inside the map's critical section. Calling back into the same
//!   map from it finds the state already borrowed and panics instead of
//!   deadlocking.
//!
//! Concurrency
//! - One `parking_lot::ReentrantMutex` per map covers the whole body of
//!   every operation, drain included. Lock order is map -> key
//!   registrations -> queue; nothing takes them in reverse.
//!
//! Notes and non-goals
//! - Values are plain `i32`; absent keys read as the configurable default
//!   return value.
//! - Dropping a map unsubscribes it from its live keys, and registering
//!   with a key sheds registrations of maps that are gone, so long-lived
//!   keys do not accumulate them.
//! - Views iterate over a copy taken at creation; keys in it are weak and
//!   may be released before they are resolved.

mod builder;
mod error;
mod queue;
mod traits;
mod tracked;
mod views;
mod weak_identity_int_map;
mod weak_identity_int_map_proptest;
mod weak_key;
mod weak_table;

// Public surface
pub use builder::WeakIdentityIntMapBuilder;
pub use error::MapError;
pub use traits::WeakIdentityMap;
pub use tracked::Tracked;
pub use views::{Entries, Entry, EntrySet, KeySet, Keys, Values, ValuesIter};
pub use weak_identity_int_map::WeakIdentityIntMap;
pub use weak_key::WeakKey;
