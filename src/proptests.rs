use super::*;

use proptest::prelude::*;
use std::collections::BTreeSet;

/// Checks the structural invariants of a flat trie against the tree it came
/// from.
fn validate_flat(flat: &FlatTrie, trie: &Trie) {
    let nodes = flat.nodes();

    let entries = nodes.iter().filter(|n| !n.is_sentinel()).count();
    assert_eq!(
        entries,
        trie.node_count() - 1,
        "one entry per non-root tree node"
    );

    // Runs start at 0 and right after every terminator except the last.
    let mut runs: BTreeSet<usize> = BTreeSet::new();
    if !nodes.is_empty() {
        runs.insert(0);
        assert!(nodes[nodes.len() - 1].is_sentinel(), "last entry must terminate a run");
    }
    for (i, n) in nodes.iter().enumerate() {
        if n.is_sentinel() && i + 1 < nodes.len() {
            runs.insert(i + 1);
        }
    }

    // Every run is non-empty and strictly ascending.
    for &start in &runs {
        let mut prev: Option<u8> = None;
        let mut i = start;
        while !nodes[i].is_sentinel() {
            let c = nodes[i].character();
            assert!(prev.map_or(true, |p| p < c), "run at {start} is not sorted");
            prev = Some(c);
            i += 1;
        }
        assert!(prev.is_some(), "empty run at {start}");
    }

    // Each run except the root's is the target of exactly one offset.
    let mut targets: BTreeSet<usize> = BTreeSet::new();
    if !nodes.is_empty() {
        targets.insert(0);
    }
    for (i, n) in nodes.iter().enumerate() {
        if n.is_sentinel() {
            assert!(!n.is_leaf() && !n.has_children(), "terminator at {i} carries data");
            continue;
        }
        if n.has_children() {
            assert!(n.children_offset() > 0, "offset at {i} must point forward");
            let target = i + n.children_offset() as usize;
            assert!(targets.insert(target), "run at {target} has two parents");
        }
    }
    assert_eq!(runs, targets, "offsets must address exactly the sibling runs");

    let leaves = nodes.iter().filter(|n| n.is_leaf()).count();
    assert_eq!(leaves, trie.len(), "one leaf entry per key");
    assert_eq!(flat.key_count(), trie.len());
}

fn key_strategy() -> impl Strategy<Value = Vec<u8>> + Clone {
    // A small alphabet produces deep shared prefixes; the full range covers
    // long sibling runs. Neither contains the sentinel.
    let small = prop::sample::select(vec![b'a', b'b', b'c', 0x00, 0xFF]);
    let full = prop_oneof![0u8..SENTINEL, (SENTINEL + 1)..=255u8];
    prop_oneof![
        3 => prop::collection::vec(small, 0..=8),
        1 => prop::collection::vec(full, 0..=16),
    ]
}

fn keys_strategy() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(key_strategy(), 0..=200)
}

fn probe_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=10)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_membership(keys in keys_strategy(), probes in prop::collection::vec(probe_strategy(), 0..=100)) {
        let trie = Trie::build(&keys).unwrap();
        let flat = FlatTrie::from_trie(&trie).unwrap();
        validate_flat(&flat, &trie);

        let set: BTreeSet<&[u8]> = keys.iter().map(|k| k.as_slice()).filter(|k| !k.is_empty()).collect();

        for key in &keys {
            prop_assert_eq!(flat.search(key), set.contains(key.as_slice()));
            for end in 0..key.len() {
                let prefix = &key[..end];
                prop_assert_eq!(flat.search(prefix), set.contains(prefix));
                prop_assert_eq!(flat.search(prefix), trie.search(prefix));
            }
        }
        for probe in &probes {
            prop_assert_eq!(flat.search(probe), set.contains(probe.as_slice()));
            prop_assert_eq!(flat.search(probe), trie.search(probe));
        }
    }

    #[test]
    fn prop_duplicates_are_idempotent(keys in keys_strategy()) {
        let once = FlatTrie::build(&keys).unwrap();

        let mut doubled: Vec<Vec<u8>> = keys.iter().rev().cloned().collect();
        doubled.extend(keys.iter().cloned());
        let twice = FlatTrie::build(&doubled).unwrap();

        prop_assert_eq!(once.len(), twice.len());
        prop_assert_eq!(once.key_count(), twice.key_count());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_iter_sorted(keys in keys_strategy()) {
        let trie = Trie::build(&keys).unwrap();
        let flat = FlatTrie::from_trie(&trie).unwrap();

        let expected: Vec<Vec<u8>> = keys
            .iter()
            .filter(|k| !k.is_empty())
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        prop_assert_eq!(flat.iter().collect::<Vec<_>>(), expected.clone());
        prop_assert_eq!(trie.iter().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn prop_reloaded_records_agree(keys in keys_strategy(), probes in prop::collection::vec(probe_strategy(), 0..=50)) {
        let flat = FlatTrie::build(&keys).unwrap();
        let loaded = FlatTrie::from_bytes(flat.as_bytes()).unwrap();
        prop_assert_eq!(loaded.key_count(), flat.key_count());
        for probe in probes.iter().chain(&keys) {
            prop_assert_eq!(loaded.search(probe), flat.search(probe));
        }
    }

    #[test]
    fn prop_sentinel_rejected(keys in keys_strategy(), at in any::<prop::sample::Index>(), pos in any::<prop::sample::Index>()) {
        prop_assume!(!keys.is_empty());
        let mut keys = keys;
        let index = at.index(keys.len());
        let position = pos.index(keys[index].len() + 1);
        keys[index].insert(position, SENTINEL);

        prop_assert_eq!(
            FlatTrie::build(&keys).unwrap_err(),
            Error::InvalidKey { index, position }
        );
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

#[test]
fn exhaustive_insert_order_small_set() {
    let keys: Vec<Vec<u8>> = vec![
        b"a".to_vec(),
        b"b".to_vec(),
        b"c".to_vec(),
        b"aa".to_vec(),
        b"ab".to_vec(),
        b"ba".to_vec(),
    ];
    let reference = FlatTrie::build(&keys).unwrap();
    let probes: Vec<&[u8]> = vec![b"", b"a", b"b", b"c", b"d", b"aa", b"ab", b"ac", b"ba", b"bb", b"aaa"];

    for_each_permutation(&keys, |perm| {
        let trie = Trie::build(&perm).unwrap();
        let flat = FlatTrie::from_trie(&trie).unwrap();
        validate_flat(&flat, &trie);
        assert_eq!(flat, reference);
        for &probe in &probes {
            assert_eq!(flat.search(probe), reference.search(probe));
            assert_eq!(flat.search(probe), keys.iter().any(|k| k.as_slice() == probe));
        }
    });
}

#[test]
fn exhaustive_short_keys() {
    // Every key of length 1..=3 over {a, b}, compared against every subset
    // member and non-member of the same shape.
    let mut all: Vec<Vec<u8>> = Vec::new();
    for len in 1..=3u32 {
        for bits in 0..(1u32 << len) {
            all.push((0..len).map(|i| if (bits >> i) & 1 == 1 { b'b' } else { b'a' }).collect());
        }
    }

    for mask in 0u32..(1 << all.len()) {
        let keys: Vec<&Vec<u8>> = all
            .iter()
            .enumerate()
            .filter(|(i, _)| (mask >> i) & 1 == 1)
            .map(|(_, k)| k)
            .collect();
        let trie = Trie::build(&keys).unwrap();
        let flat = FlatTrie::from_trie(&trie).unwrap();
        validate_flat(&flat, &trie);
        for (i, probe) in all.iter().enumerate() {
            assert_eq!(flat.search(probe), (mask >> i) & 1 == 1, "mask {mask:#x} probe {probe:?}");
        }
    }
}
