use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::BTreeMap;

fn key_strategy() -> impl Strategy<Value = String> {
    // A small alphabet keeps duplicate inserts and successful removals frequent.
    "[a-d]{1,4}"
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 50)]
    Insert(#[proptest(strategy = "key_strategy()")] String, u32),
    #[proptest(weight = 25)]
    Remove(#[proptest(strategy = "key_strategy()")] String),
    #[proptest(weight = 24)]
    Get(#[proptest(strategy = "key_strategy()")] String),
    #[proptest(weight = 1)]
    Clear,
}

fn town(key: &str, population: u32) -> Town {
    Town::new("district", key, population, 0, "yes")
}

const CATALOG_CAPACITY: usize = 16;

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_ordered_index_matches_btreemap(ops in prop::collection::vec(any::<Op>(), 0..=1000)) {
        let mut t = OrderedIndex::new();
        let mut m: BTreeMap<String, u32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, population) => {
                    let res = t.insert(town(&key, population));
                    if m.contains_key(&key) {
                        prop_assert!(matches!(res, Err(CatalogError::DuplicateKey(_))));
                    } else {
                        prop_assert!(res.is_ok());
                        m.insert(key, population);
                    }
                }
                Op::Remove(key) => {
                    let got = t.remove(&key).ok().map(|t| t.population);
                    prop_assert_eq!(got, m.remove(&key));
                }
                Op::Get(key) => {
                    let got = t.find(&key).map(|t| t.population);
                    prop_assert_eq!(got, m.get(&key).copied());
                }
                Op::Clear => {
                    t.clear();
                    m.clear();
                }
            }

            prop_assert_eq!(t.len(), m.len());
        }

        t.check_invariants();
        let got: Vec<(String, u32)> = t.iter().map(|t| (t.town.clone(), t.population)).collect();
        let expected: Vec<(String, u32)> = m.into_iter().collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_catalog_indexes_agree(ops in prop::collection::vec(any::<Op>(), 0..=500)) {
        let config = Config { capacity: CATALOG_CAPACITY, ..Config::default() };
        let mut c = Catalog::with_config(&config).unwrap();
        let mut m: BTreeMap<String, u32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, population) => {
                    let res = c.insert(town(&key, population));
                    if m.contains_key(&key) {
                        prop_assert!(matches!(res, Err(CatalogError::DuplicateKey(_))));
                    } else if m.len() == CATALOG_CAPACITY {
                        prop_assert!(matches!(res, Err(CatalogError::TableFull { .. })), "expected TableFull error");
                    } else {
                        prop_assert!(res.is_ok());
                        m.insert(key, population);
                    }
                }
                Op::Remove(key) => {
                    let got = c.remove(&key).ok().map(|t| t.population);
                    prop_assert_eq!(got, m.remove(&key));
                }
                Op::Get(key) => {
                    let got = c.lookup(&key).ok().map(|l| l.town.population);
                    prop_assert_eq!(got, m.get(&key).copied());
                }
                Op::Clear => {
                    for key in std::mem::take(&mut m).into_keys() {
                        prop_assert!(c.remove(&key).is_ok());
                    }
                }
            }

            prop_assert_eq!(c.len(), m.len());
            prop_assert_eq!(c.hash_stats().occupied, m.len());
        }

        c.ordered().check_invariants();
        for (key, population) in &m {
            let via_tree = c.find(key).unwrap();
            let via_hash = c.lookup(key).unwrap();
            prop_assert!(std::ptr::eq(via_tree, via_hash.town));
            prop_assert_eq!(via_tree.population, *population);
            prop_assert!(via_hash.probe.collisions < CATALOG_CAPACITY);
        }
    }

    #[test]
    fn prop_serialize_round_trip(
        towns in prop::collection::btree_map(
            "[A-Za-z ]{1,12}",
            (any::<u32>(), any::<i32>(), prop_oneof![Just("yes"), Just("no"), Just("No")]),
            0..64,
        )
    ) {
        let mut t = OrderedIndex::new();
        for (name, (population, elevation, flag)) in &towns {
            t.insert(Town::new("District", name.as_str(), *population, *elevation, *flag)).unwrap();
        }

        let mut buf = Vec::new();
        t.serialize(&mut buf).unwrap();
        let report = persist::read_records(buf.as_slice()).unwrap();
        prop_assert!(report.skipped.is_empty());

        let mut reloaded = OrderedIndex::new();
        for town in report.records {
            reloaded.insert(town).unwrap();
        }
        let before: Vec<&Town> = t.iter().collect();
        let after: Vec<&Town> = reloaded.iter().collect();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn prop_accepted_towns_survive_save_and_load(
        towns in prop::collection::vec(("[A-Za-z:\n\r]{0,6}", "[A-Za-z:\n]{0,6}"), 0..32)
    ) {
        let config = Config { capacity: 64, ..Config::default() };
        let mut c = Catalog::with_config(&config).unwrap();
        for (district, name) in &towns {
            let _ = c.insert(Town::new(district.as_str(), name.as_str(), 1, 1, "yes"));
        }

        let mut buf = Vec::new();
        c.write_to(&mut buf).unwrap();
        let report = persist::read_records(buf.as_slice()).unwrap();
        prop_assert!(report.skipped.is_empty());
        prop_assert_eq!(report.records.len(), c.len());
        for (saved, live) in report.records.iter().zip(c.iter()) {
            prop_assert_eq!(saved, live);
        }
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

const SMALL_SET: [&str; 6] = ["a", "b", "c", "aa", "ab", "ba"];

#[test]
fn exhaustive_insert_order_small_set() {
    for_each_permutation(&SMALL_SET, |perm| {
        let mut t = OrderedIndex::new();
        for (i, k) in perm.into_iter().enumerate() {
            t.insert(town(k, i as u32)).unwrap();
        }

        t.check_invariants();
        let got: Vec<&str> = t.iter().map(|t| t.town.as_str()).collect();
        assert_eq!(got, ["a", "aa", "ab", "b", "ba", "c"]);
    });
}

#[test]
fn exhaustive_remove_order_small_set() {
    // Insert in a fixed order, then remove in all permutations.
    let mut base = Catalog::new();
    for (i, k) in SMALL_SET.iter().enumerate() {
        base.insert(town(k, i as u32)).unwrap();
    }

    for_each_permutation(&SMALL_SET, |perm| {
        let mut c = base.clone();
        for (removed, k) in perm.into_iter().enumerate() {
            assert_eq!(c.remove(k).unwrap().town, k);
            assert_eq!(c.len(), SMALL_SET.len() - removed - 1);
            c.ordered().check_invariants();
            for live in c.iter() {
                assert!(std::ptr::eq(c.lookup(&live.town).unwrap().town, live));
            }
        }
        assert!(c.is_empty());
        assert!(c.hashed().is_empty());
    });
}
