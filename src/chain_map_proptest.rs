#![cfg(test)]

// Property tests for ChainMap kept inside the crate so they can inspect
// bucket geometry and tombstone counts.

use crate::chain_map::{ChainMap, Insert};
use crate::config::watermark;
use crate::dispose::FnDisposer;
use crate::iter::Cursor;
use crate::ops::{FnOps, KeyOps, StrOps};
use proptest::prelude::*;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::rc::Rc;

// Pool-indexed operations so that shrinking steers toward earlier keys and
// shorter op lists.
#[derive(Clone, Debug)]
enum Op {
    Put(usize, i32),
    Remove(usize),
    Steal(usize),
    Get(usize),
    Bump(usize, i32),
    Iterate,
}

fn arb_scenario(max_pool: usize) -> impl Strategy<Value = (Vec<u32>, Vec<Op>)> {
    proptest::collection::btree_set(any::<u32>(), 1..=max_pool).prop_flat_map(|pool| {
        let pool: Vec<u32> = pool.into_iter().collect();
        let idx = 0..pool.len();
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Put(i, v)),
            1 => idx.clone().prop_map(Op::Remove),
            1 => idx.clone().prop_map(Op::Steal),
            2 => idx.clone().prop_map(Op::Get),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| Op::Bump(i, d)),
            1 => Just(Op::Iterate),
        ];
        proptest::collection::vec(op, 1..300).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Drives one op against both the map and the model and checks the
// per-op contract.
fn step<O>(
    sut: &mut ChainMap<u32, i32, O>,
    model: &mut HashMap<u32, i32>,
    pool: &[u32],
    op: Op,
) -> Result<(), TestCaseError>
where
    O: KeyOps<u32>,
{
    match op {
        Op::Put(i, v) => {
            let k = pool[i];
            let before = sut.len();
            let fresh = !model.contains_key(&k);
            let res = sut.put(k, v).expect("unbounded map accepts every put");
            prop_assert_eq!(res == Insert::Inserted, fresh);
            prop_assert_eq!(sut.len(), before + usize::from(fresh));
            model.insert(k, v);
        }
        Op::Remove(i) => {
            let k = pool[i];
            prop_assert_eq!(sut.remove(&k), model.remove(&k).is_some());
            prop_assert!(sut.get(&k).is_none());
        }
        Op::Steal(i) => {
            let k = pool[i];
            let got = sut.steal(&k);
            prop_assert_eq!(got, model.remove(&k).map(|v| (k, v)));
            prop_assert!(!sut.contains(&k));
        }
        Op::Get(i) => {
            let k = pool[i];
            prop_assert_eq!(sut.get(&k), model.get(&k));
            prop_assert_eq!(sut.contains(&k), model.contains_key(&k));
        }
        Op::Bump(i, d) => {
            let k = pool[i];
            if let Some(v) = sut.get_mut(&k) {
                *v = v.wrapping_add(d);
            }
            if let Some(v) = model.get_mut(&k) {
                *v = v.wrapping_add(d);
            }
        }
        Op::Iterate => {
            let seen: BTreeMap<u32, i32> = sut.iter().map(|(k, v)| (*k, *v)).collect();
            let want: BTreeMap<u32, i32> = model.iter().map(|(k, v)| (*k, *v)).collect();
            prop_assert_eq!(seen, want);
        }
    }

    // Post-conditions after each op.
    prop_assert_eq!(sut.len(), model.len());
    prop_assert_eq!(sut.is_empty(), model.is_empty());
    prop_assert_eq!(sut.watermark(), watermark(sut.bucket_count()));
    prop_assert!(sut.len() <= sut.watermark());
    Ok(())
}

// Property: state-machine equivalence with std::collections::HashMap.
// Invariants exercised across random sequences:
// - put/get round-trip returns the last value written for a key.
// - put grows len by one for a new key and by zero on replacement.
// - remove/steal shrink len by one for a present key, are no-ops otherwise.
// - iteration yields exactly the model's pairs.
// - the watermark tracks the bucket count through every resize.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario(256)) {
        let mut sut: ChainMap<u32, i32> = ChainMap::new();
        let mut model: HashMap<u32, i32> = HashMap::new();
        for op in ops {
            step(&mut sut, &mut model, &pool, op)?;
        }
    }
}

// Property: the same invariants when every key collides into a single
// chain, which stresses tombstone reuse and equality resolution.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario(24)) {
        let ops_const = FnOps::new(|_: &u32| 0u64, |a: &u32, b: &u32| a == b);
        let mut sut = ChainMap::with_ops(ops_const);
        let mut model: HashMap<u32, i32> = HashMap::new();
        for op in ops {
            step(&mut sut, &mut model, &pool, op)?;
        }
        // Every vacant extension slot is part of the single chain; it never
        // exceeds the number of distinct keys ever stored.
        prop_assert!(sut.tombstones() <= pool.len());
    }
}

// Property: growth round-trip. Inserting N distinct keys across several
// watermarks keeps every key retrievable, and a cursor visits each once.
proptest! {
    #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]
    #[test]
    fn prop_growth_round_trip(keys in proptest::collection::btree_set(any::<u64>(), 0..3000)) {
        let mut m: ChainMap<u64, u64> = ChainMap::new();
        for &k in &keys {
            prop_assert_eq!(m.put(k, k ^ 0xA5A5).unwrap(), Insert::Inserted);
        }
        prop_assert_eq!(m.len(), keys.len());
        for &k in &keys {
            prop_assert_eq!(m.get(&k), Some(&(k ^ 0xA5A5)));
        }

        let mut cursor = Cursor::new();
        let mut seen = BTreeSet::new();
        while let Some((k, v)) = cursor.next(&m) {
            prop_assert_eq!(*v, *k ^ 0xA5A5);
            prop_assert!(seen.insert(*k), "key visited twice");
        }
        prop_assert_eq!(&seen, &keys);
    }
}

// Property: with an owning disposer, every key handed to the map is
// released exactly once across replacement, removal, and final drop, and
// stolen keys are never released by the map.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_each_owned_value_released_once(
        ops in proptest::collection::vec((0u8..3, "[a-e]{1,2}"), 1..200)
    ) {
        let released: Rc<RefCell<Vec<u64>>> = Rc::default();
        let r = released.clone();
        let mut next_id = 0u64;
        let mut stolen = Vec::new();
        {
            let mut m = ChainMap::new_full(
                StrOps,
                FnDisposer::values::<String>(move |id: u64| r.borrow_mut().push(id)),
            );
            for (op, key) in ops {
                match op {
                    0 => {
                        m.put(key, next_id).unwrap();
                        next_id += 1;
                    }
                    1 => {
                        let _ = m.remove(key.as_str());
                    }
                    _ => {
                        if let Some((_, id)) = m.steal(key.as_str()) {
                            stolen.push(id);
                        }
                    }
                }
            }
        }
        let mut all: Vec<u64> = released.borrow().clone();
        all.extend(&stolen);
        all.sort_unstable();
        prop_assert_eq!(all, (0..next_id).collect::<Vec<_>>());
    }
}
