//! Per-map cleanup queue fed by released keys.

use crate::weak_table::Slot;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::{Arc, Weak};

#[derive(Debug, Default)]
pub(crate) struct QueueShared {
    pending: Mutex<VecDeque<Slot>>,
}

impl QueueShared {
    pub(crate) fn push(&self, slot: Slot) {
        self.pending.lock().push_back(slot);
    }
}

/// Receives the slots of registered keys whose referent was released.
///
/// Keys hold their registration weakly, so once the owning map (and with it
/// the queue) is dropped, later releases notify nobody.
#[derive(Debug, Default)]
pub(crate) struct ReferenceQueue {
    shared: Arc<QueueShared>,
}

impl ReferenceQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Take the oldest pending notification, if any. Never blocks on
    /// reclamation; an empty queue just means nothing was released yet.
    pub(crate) fn poll(&self) -> Option<Slot> {
        self.shared.pending.lock().pop_front()
    }

    pub(crate) fn len(&self) -> usize {
        self.shared.pending.lock().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn downgrade(&self) -> Weak<QueueShared> {
        Arc::downgrade(&self.shared)
    }

    /// Whether `weak` points at this queue.
    pub(crate) fn is(&self, weak: &Weak<QueueShared>) -> bool {
        core::ptr::eq(weak.as_ptr(), Arc::as_ptr(&self.shared))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::{DefaultKey, SlotMap};

    fn slots(n: usize) -> Vec<Slot> {
        let mut sm: SlotMap<DefaultKey, ()> = SlotMap::new();
        (0..n).map(|_| Slot::new(sm.insert(()))).collect()
    }

    #[test]
    fn poll_is_fifo() {
        let q = ReferenceQueue::new();
        let s = slots(3);
        let weak = q.downgrade();
        for &slot in &s {
            weak.upgrade().unwrap().push(slot);
        }
        assert_eq!(q.len(), 3);
        assert_eq!(q.poll(), Some(s[0]));
        assert_eq!(q.poll(), Some(s[1]));
        assert_eq!(q.poll(), Some(s[2]));
        assert_eq!(q.poll(), None);
        assert!(q.is_empty());
    }

    #[test]
    fn identity_check_distinguishes_queues() {
        let a = ReferenceQueue::new();
        let b = ReferenceQueue::new();
        assert!(a.is(&a.downgrade()));
        assert!(!a.is(&b.downgrade()));
    }

    #[test]
    fn dropped_queue_cannot_be_upgraded() {
        let q = ReferenceQueue::new();
        let weak = q.downgrade();
        drop(q);
        assert!(weak.upgrade().is_none());
    }
}
