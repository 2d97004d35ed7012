#![cfg(test)]

// Property tests for HashTbl kept inside the crate so they can check
// bucket-level invariants through internal accessors.

use crate::hash_tbl::HashTbl;
use crate::primes::is_prime;
use crate::strategy::StdHash;
use crate::TableError;
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::hash::{BuildHasher, Hasher};

// Pool-indexed operations: indices shrink to earlier keys, pool length
// shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    Erase(usize),
    Retrieve(usize),
    At(usize),
    Index(usize, i32),
    Count(usize),
    Clear,
    Iterate,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,4}", 1..=24).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            2 => idx.clone().prop_map(OpI::Erase),
            1 => idx.clone().prop_map(OpI::Retrieve),
            1 => idx.clone().prop_map(OpI::At),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Index(i, d)),
            1 => idx.clone().prop_map(OpI::Count),
            1 => Just(OpI::Clear),
            1 => Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn run_scenario<S>(
    mut sut: HashTbl<String, i32, StdHash<S>>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError>
where
    S: BuildHasher,
{
    let mut model: HashMap<String, i32> = HashMap::new();

    for op in ops {
        let cap_before = sut.capacity();
        match op {
            OpI::Insert(i, v) => {
                let k = pool[i].clone();
                let fresh = !model.contains_key(&k);
                prop_assert_eq!(sut.insert(k.clone(), v), fresh);
                model.insert(k, v);
            }
            OpI::Erase(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.erase(k.as_str()), model.remove(k).is_some());
            }
            OpI::Retrieve(i) => {
                let k = &pool[i];
                let mut out = i32::MIN;
                let hit = sut.retrieve(k.as_str(), &mut out);
                match model.get(k) {
                    Some(&mv) => {
                        prop_assert!(hit);
                        prop_assert_eq!(out, mv);
                    }
                    None => {
                        prop_assert!(!hit);
                        prop_assert_eq!(out, i32::MIN, "miss must not touch the output");
                    }
                }
            }
            OpI::At(i) => {
                let k = &pool[i];
                match (sut.at(k.as_str()), model.get(k)) {
                    (Ok(v), Some(mv)) => prop_assert_eq!(v, mv),
                    (Err(TableError::KeyNotFound), None) => {}
                    (other, mv) => prop_assert!(false, "at mismatch: {:?} vs {:?}", other, mv),
                }
            }
            OpI::Index(i, d) => {
                let k = pool[i].clone();
                let slot = sut.get_or_insert_default(k.clone());
                *slot = slot.wrapping_add(d);
                let mv = model.entry(k).or_default();
                *mv = mv.wrapping_add(d);
            }
            OpI::Count(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.count(k.as_str()), usize::from(model.contains_key(k)));
                prop_assert!(sut.bucket_len(k.as_str()) >= sut.count(k.as_str()));
            }
            OpI::Clear => {
                sut.clear();
                model.clear();
                prop_assert_eq!(sut.capacity(), cap_before, "clear keeps capacity");
            }
            OpI::Iterate => {
                let s_keys: BTreeSet<_> = sut.keys().cloned().collect();
                let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(s_keys, m_keys);
            }
        }

        // Post-conditions after each op
        // 1) Size parity
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        // 2) Capacity prime, never shrinks, load factor bounded
        prop_assert!(is_prime(sut.capacity()));
        prop_assert!(sut.capacity() >= cap_before);
        prop_assert!(sut.len() <= sut.capacity());
        // 3) Every model entry reachable with identical data
        for (k, v) in &model {
            prop_assert_eq!(sut.get(k.as_str()), Some(v));
        }
    }
    Ok(())
}

// Property: State-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - insert returns true exactly for fresh keys; overwrites keep len.
// - erase/retrieve/at/count agree with the model; misses leave outputs alone.
// - Indexed access inserts a default on a miss.
// - Capacity stays prime, never shrinks, and len <= capacity after each op.
// - Every model entry stays reachable across growth.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario(), requested in 0usize..8) {
        let sut: HashTbl<String, i32> = HashTbl::with_capacity(requested);
        run_scenario(sut, &pool, ops)?;
    }
}

// Collision variant using a constant hasher to stress equality resolution.
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

// Property: Same invariants as above with every key in bucket 0, so all
// lookups, overwrites and erasures happen inside one long chain.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario(), requested in 0usize..8) {
        let sut: HashTbl<String, i32, StdHash<ConstBuildHasher>> =
            HashTbl::with_build_hasher(requested, ConstBuildHasher);
        run_scenario(sut, &pool, ops)?;
    }
}
