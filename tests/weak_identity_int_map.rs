use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use weak_identity_map::{MapError, Tracked, WeakIdentityIntMap, WeakIdentityMap};

fn recording_map<K>() -> (WeakIdentityIntMap<K>, Arc<Mutex<Vec<i32>>>) {
    let evicted = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&evicted);
    (WeakIdentityIntMap::new(move |v| sink.lock().push(v)), evicted)
}

#[test]
fn identity_not_equality() {
    let (m, _) = recording_map();
    let a = Tracked::new("key".to_string());
    let b = Tracked::new("key".to_string());
    assert_eq!(a, b);
    assert!(!Tracked::ptr_eq(&a, &b));

    m.put(&a, 1);
    assert_eq!(m.get_int(&b), 0);
    assert!(!m.contains_key(&b));
    assert_eq!(m.get_int(&a.clone()), 1, "clones share the identity");
}

#[test]
fn put_replaces_and_returns_previous() {
    let (m, evicted) = recording_map();
    let k = Tracked::new(1u64);
    assert_eq!(m.put(&k, 1), 0);
    assert_eq!(m.put(&k, 2), 1);
    assert_eq!(m.get_int(&k), 2);
    assert_eq!(m.len(), 1);
    assert!(evicted.lock().is_empty(), "replacing never notifies");
}

#[test]
fn explicit_removal_does_not_notify() {
    let (m, evicted) = recording_map();
    let k = Tracked::new(1u64);
    let other = Tracked::new(2u64);
    m.put(&k, 7);
    m.put(&other, 8);
    assert_eq!(m.len(), 2);

    assert_eq!(m.remove_int(&k), 7);
    assert_eq!(m.len(), 1);
    assert_eq!(m.remove_int(&k), 0, "absent key removes nothing");

    // The removed key's later release must stay silent too.
    drop(k);
    assert_eq!(m.len(), 1);
    assert!(evicted.lock().is_empty());
}

#[test]
fn release_notifies_exactly_once() {
    let (m, evicted) = recording_map();
    let k = Tracked::new("short-lived".to_string());
    let keep = Tracked::new("kept".to_string());
    m.put(&k, 9);
    m.put(&keep, 1);

    drop(k);
    assert_eq!(m.len(), 1);
    assert_eq!(*evicted.lock(), vec![9]);

    // Idempotent drain: more reads, no more callbacks.
    for _ in 0..3 {
        assert_eq!(m.len(), 1);
        assert!(m.contains_value(1));
        assert!(!m.contains_value(9));
        assert_eq!(m.get_int(&keep), 1);
    }
    assert_eq!(*evicted.lock(), vec![9]);
}

#[test]
fn release_waits_for_last_clone() {
    let (m, evicted) = recording_map();
    let k = Tracked::new(0u8);
    let k2 = k.clone();
    m.put(&k, 5);
    drop(k);
    assert_eq!(m.len(), 1);
    assert!(evicted.lock().is_empty());
    drop(k2);
    assert_eq!(m.len(), 0);
    assert_eq!(*evicted.lock(), vec![5]);
}

#[test]
fn reput_after_eviction_uses_fresh_slot() {
    let (m, evicted) = recording_map();
    let k = Tracked::new(0u8);
    m.put(&k, 1);
    assert_eq!(m.remove_int(&k), 1);
    assert_eq!(m.put(&k, 2), 0, "removed slot is not resurrected");
    drop(k);
    assert!(m.is_empty());
    assert_eq!(*evicted.lock(), vec![2]);
}

#[test]
fn default_value_round_trip() {
    let (m, _) = recording_map();
    let stored = Tracked::new(1u8);
    let unknown = Tracked::new(2u8);
    m.put(&stored, 42);

    m.set_default_return_value(-1);
    assert_eq!(m.default_return_value(), -1);
    assert_eq!(m.get_int(&unknown), -1);
    assert_eq!(m.remove_int(&unknown), -1);
    assert_eq!(m.put(&unknown, 3), -1);
    assert_eq!(m.get_int(&stored), 42, "stored values are unaffected");
}

#[test]
fn put_all_preserves_per_pair_semantics() {
    let (m, _) = recording_map();
    let a = Tracked::new("a");
    let b = Tracked::new("b");
    m.put_all([(&a, 1), (&b, 2)]);
    assert_eq!(m.get_int(&a), 1);
    assert_eq!(m.get_int(&b), 2);
    assert_eq!(m.len(), 2);

    // Owned pairs and later duplicates: last write wins per identity.
    m.put_all(vec![(a.clone(), 10), (a.clone(), 11)]);
    assert_eq!(m.get_int(&a), 11);
    assert_eq!(m.len(), 2);
}

#[test]
fn put_all_with_last_handle_evicts_after_batch() {
    let (m, evicted) = recording_map();
    // The map never owns keys, so handing it the only handle is a release.
    m.put_all(vec![(Tracked::new("only"), 3)]);
    assert!(m.is_empty());
    assert_eq!(*evicted.lock(), vec![3]);
}

#[test]
fn extend_and_put_all_from() {
    let (mut src, _) = recording_map();
    let a = Tracked::new("a");
    let b = Tracked::new("b");
    src.extend([(&a, 1), (&b, 2)]);
    assert_eq!(src.len(), 2);

    let (dst, _) = recording_map();
    dst.put_all_from(&src);
    assert_eq!(dst.get_int(&a), 1);
    assert_eq!(dst.get_int(&b), 2);

    // Both maps hear about the release independently.
    drop(a);
    assert_eq!(src.len(), 1);
    assert_eq!(dst.len(), 1);
}

#[test]
fn clear_drops_everything_silently() {
    let (m, evicted) = recording_map();
    let keys: Vec<_> = (0..8).map(Tracked::new).collect();
    for (i, k) in keys.iter().enumerate() {
        m.put(k, i as i32);
    }
    assert_eq!(m.len(), 8);
    m.clear();
    assert!(m.is_empty());
    drop(keys);
    m.check_queue();
    assert!(evicted.lock().is_empty());
}

#[test]
fn views_track_the_map() {
    let (m, _) = recording_map();
    let a = Tracked::new(1u32);
    let b = Tracked::new(2u32);
    m.put(&a, 10);
    m.put(&b, 20);

    let keys = m.key_set();
    assert_eq!(keys.len(), 2);
    drop(b);
    assert_eq!(keys.len(), 1, "views re-drain on every access");
    let live: Vec<_> = keys.iter().collect();
    assert_eq!(live.len(), 1);
    assert!(Tracked::ptr_eq(&live[0], &a));

    let entries: HashMap<u32, i32> = m
        .entry_set()
        .iter()
        .filter_map(|e| e.key().map(|k| (*k, e.int_value())))
        .collect();
    assert_eq!(entries, HashMap::from([(1, 10)]));

    let mut e = m.entry_set().iter().next().unwrap();
    assert_eq!(e.set_value(0), Err(MapError::UnsupportedOperation));
}

#[test]
fn dropping_map_before_keys_is_fine() {
    let (m, evicted) = recording_map();
    let k = Tracked::new(());
    m.put(&k, 1);
    drop(m);
    drop(k);
    assert!(evicted.lock().is_empty());
}

#[test]
fn key_in_several_maps() {
    let (m1, e1) = recording_map();
    let (m2, e2) = recording_map();
    let k = Tracked::new("shared");
    m1.put(&k, 1);
    m2.put(&k, 2);
    m1.remove_int(&k);
    drop(k);
    assert!(m1.is_empty());
    assert!(m2.is_empty());
    assert!(e1.lock().is_empty());
    assert_eq!(*e2.lock(), vec![2]);
}
