#![cfg(test)]

// Property tests for WeakIdentityIntMap kept inside the crate so they can
// reach the internal table through the public map without feature gates.

use crate::{Tracked, WeakIdentityIntMap, WeakIdentityIntMapBuilder};
use parking_lot::Mutex;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hasher};
use std::sync::Arc;

const POOL: usize = 6;

// Pool-indexed operations: indices shrink towards earlier keys and op lists
// shrink in length.
#[derive(Clone, Debug)]
enum Op {
    Put(usize, i32),
    Remove(usize),
    Get(usize),
    Release(usize),
    Clear,
    SetDefault(i32),
    Iterate,
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    let op = prop_oneof![
        4 => (0..POOL, any::<i32>()).prop_map(|(i, v)| Op::Put(i, v)),
        2 => (0..POOL).prop_map(Op::Remove),
        2 => (0..POOL).prop_map(Op::Get),
        3 => (0..POOL).prop_map(Op::Release),
        1 => Just(Op::Clear),
        1 => (-3i32..3).prop_map(Op::SetDefault),
        1 => Just(Op::Iterate),
    ];
    proptest::collection::vec(op, 1..80)
}

// Drive `sut` and a plain HashMap model with the same ops. Evictions the
// model expects are compared against what the callback actually saw.
fn run<S: BuildHasher>(
    sut: WeakIdentityIntMap<usize, S>,
    evicted: Arc<Mutex<Vec<i32>>>,
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut handles: Vec<Option<Tracked<usize>>> = vec![None; POOL];
    let mut model: HashMap<usize, i32> = HashMap::new();
    let mut expected_evictions: Vec<i32> = Vec::new();
    let mut default_value = 0;

    for op in ops {
        match op {
            Op::Put(i, v) => {
                let k = handles[i].get_or_insert_with(|| Tracked::new(i)).clone();
                let expected = model.insert(i, v).unwrap_or(default_value);
                prop_assert_eq!(sut.put(&k, v), expected);
            }
            Op::Remove(i) => {
                if let Some(k) = &handles[i] {
                    let expected = model.remove(&i).unwrap_or(default_value);
                    prop_assert_eq!(sut.remove_int(k), expected);
                }
            }
            Op::Get(i) => {
                if let Some(k) = &handles[i] {
                    let expected = model.get(&i).copied().unwrap_or(default_value);
                    prop_assert_eq!(sut.get_int(k), expected);
                    prop_assert_eq!(sut.contains_key(k), model.contains_key(&i));
                }
            }
            Op::Release(i) => {
                if handles[i].take().is_some() {
                    if let Some(v) = model.remove(&i) {
                        expected_evictions.push(v);
                    }
                }
            }
            Op::Clear => {
                sut.clear();
                model.clear();
            }
            Op::SetDefault(v) => {
                sut.set_default_return_value(v);
                default_value = v;
            }
            Op::Iterate => {
                let mut keys: Vec<usize> = sut.key_set().iter().map(|k| *k).collect();
                keys.sort_unstable();
                let mut model_keys: Vec<usize> = model.keys().copied().collect();
                model_keys.sort_unstable();
                prop_assert_eq!(keys, model_keys);

                let mut values: Vec<i32> = sut.values().iter().collect();
                values.sort_unstable();
                let mut model_values: Vec<i32> = model.values().copied().collect();
                model_values.sort_unstable();
                prop_assert_eq!(values, model_values);
            }
        }

        // Post-conditions after each op
        // 1) Size parity (this also drains pending releases)
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        // 2) Every release of a stored key was reported exactly once
        let mut seen = evicted.lock().clone();
        seen.sort_unstable();
        let mut want = expected_evictions.clone();
        want.sort_unstable();
        prop_assert_eq!(seen, want);
    }
    Ok(())
}

fn recorder() -> (Arc<Mutex<Vec<i32>>>, impl FnMut(i32) + Send + 'static) {
    let evicted = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&evicted);
    (evicted, move |v| sink.lock().push(v))
}

// Property: State-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - put/get/remove return the model's value or the current default.
// - Releasing a key that has an entry fires the callback exactly once with
//   that entry's value; explicit removal and clear never fire it.
// - Key set and values views agree with the model.
// - len/is_empty parity with the model after each op.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine(ops in arb_ops()) {
        let (evicted, on_remove) = recorder();
        let sut = WeakIdentityIntMap::new(on_remove);
        run(sut, evicted, ops)?;
    }
}

// Collision variant using a constant hasher to stress identity resolution.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Property: Same state-machine invariants as above, under worst-case
// collision behavior (constant hasher), with released entries sharing the
// probe sequence until they are drained.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions(ops in arb_ops()) {
        let (evicted, on_remove) = recorder();
        let sut = WeakIdentityIntMapBuilder::new()
            .hasher(ConstBuildHasher)
            .build(on_remove);
        run(sut, evicted, ops)?;
    }
}
