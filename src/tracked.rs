//! Shared owning key handles.
//!
//! `Tracked<K>` plays the part of a garbage-collected object: maps only ever
//! hold it weakly, and releasing its last clone is what "unreachable" means
//! here. At that point every map the key was registered with gets the slot
//! pushed onto its cleanup queue.

use crate::queue::{QueueShared, ReferenceQueue};
use crate::weak_table::Slot;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::ops::Deref;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

#[derive(Debug)]
struct Registration {
    queue: Weak<QueueShared>,
    slot: Slot,
}

pub(crate) struct Shared<K> {
    value: K,
    registrations: Mutex<Vec<Registration>>,
}

impl<K> Drop for Shared<K> {
    fn drop(&mut self) {
        // Runs exactly once, after the strong count reached zero.
        for reg in self.registrations.get_mut().drain(..) {
            if let Some(queue) = reg.queue.upgrade() {
                queue.push(reg.slot);
            }
        }
    }
}

/// A reference-counted handle to a key object.
///
/// Cloning shares the same identity. Comparison and hashing of the handle
/// itself go through the value, like `Arc`; maps in this crate ignore that
/// and key on identity instead (see [`Tracked::ptr_eq`]).
pub struct Tracked<K> {
    shared: Arc<Shared<K>>,
}

impl<K> Tracked<K> {
    pub fn new(value: K) -> Self {
        Self {
            shared: Arc::new(Shared {
                value,
                registrations: Mutex::new(Vec::new()),
            }),
        }
    }

    /// True if both handles refer to the same object.
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Arc::ptr_eq(&this.shared, &other.shared)
    }

    /// Identity hash of the object, stable for as long as any handle or
    /// weak key to it exists.
    pub fn identity_hash(this: &Self) -> u64 {
        Arc::as_ptr(&this.shared) as usize as u64
    }

    /// Number of live handles to this object.
    pub fn strong_count(this: &Self) -> usize {
        Arc::strong_count(&this.shared)
    }

    pub(crate) fn as_ptr(this: &Self) -> *const Shared<K> {
        Arc::as_ptr(&this.shared)
    }

    pub(crate) fn downgrade(this: &Self) -> Weak<Shared<K>> {
        Arc::downgrade(&this.shared)
    }

    pub(crate) fn from_shared(shared: Arc<Shared<K>>) -> Self {
        Self { shared }
    }

    /// Subscribe `slot` of `queue` to this object's release. Registrations of
    /// queues that no longer exist are shed first.
    pub(crate) fn register(this: &Self, queue: &ReferenceQueue, slot: Slot) {
        let mut regs = this.shared.registrations.lock();
        regs.retain(|reg| reg.queue.strong_count() > 0);
        regs.push(Registration {
            queue: queue.downgrade(),
            slot,
        });
    }

    /// Drop the subscription of `slot`; also sheds registrations whose queue
    /// is already gone.
    pub(crate) fn unregister(this: &Self, queue: &ReferenceQueue, slot: Slot) {
        this.shared.registrations.lock().retain(|reg| {
            reg.queue.strong_count() > 0 && !(reg.slot == slot && queue.is(&reg.queue))
        });
    }

    #[cfg(test)]
    pub(crate) fn registration_count(this: &Self) -> usize {
        this.shared.registrations.lock().len()
    }
}

impl<K> Clone for Tracked<K> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<K> Deref for Tracked<K> {
    type Target = K;

    fn deref(&self) -> &K {
        &self.shared.value
    }
}

impl<K> AsRef<K> for Tracked<K> {
    fn as_ref(&self) -> &K {
        &self.shared.value
    }
}

impl<K> From<K> for Tracked<K> {
    fn from(value: K) -> Self {
        Self::new(value)
    }
}

impl<K: PartialEq> PartialEq for Tracked<K> {
    fn eq(&self, other: &Self) -> bool {
        **self == **other
    }
}

impl<K: Eq> Eq for Tracked<K> {}

impl<K: Hash> Hash for Tracked<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (**self).hash(state);
    }
}

impl<K: fmt::Debug> fmt::Debug for Tracked<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

impl<K: fmt::Display> fmt::Display for Tracked<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&**self, f)
    }
}
