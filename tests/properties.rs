use std::collections::BTreeSet;

use avl_core::Tree;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Insert(i16),
    Remove(i16),
}

fn ops() -> impl Strategy<Value = Vec<Op>> {
    proptest::collection::vec(
        prop_oneof![
            3 => any::<i16>().prop_map(|key| Op::Insert(key % 512)),
            2 => any::<i16>().prop_map(|key| Op::Remove(key % 512)),
        ],
        0..400,
    )
}

fn height_bound(len: usize) -> usize {
    (1.44 * ((len + 2) as f64).log2()).ceil() as usize
}

proptest! {
    #[test]
    fn mutations_keep_tree_balanced_and_ordered(ops in ops()) {
        let mut tree = Tree::new();
        let mut control = BTreeSet::new();

        for op in ops {
            match op {
                Op::Insert(key) => {
                    prop_assert_eq!(tree.insert_unique(key), control.insert(key));
                }
                Op::Remove(key) => {
                    prop_assert_eq!(tree.remove(&key), control.remove(&key));
                }
            }
            prop_assert!(tree.is_balanced());
            prop_assert!(tree.validate().is_ok(), "{:?}", tree.validate());
            prop_assert!(tree.height() <= height_bound(tree.len()));
        }

        let keys = tree.inorder();
        prop_assert!(
            keys.windows(2).all(|pair| pair[0] < pair[1]),
            "in-order keys must be strictly increasing"
        );
        prop_assert!(keys.into_iter().eq(control.iter()));
        prop_assert_eq!(tree.count_nodes(), control.len());
    }

    #[test]
    fn removing_every_key_empties_the_tree(
        keys in proptest::collection::hash_set(any::<i32>(), 0..300),
        seed in any::<u64>(),
    ) {
        use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

        let mut tree: Tree<i32> = keys.iter().copied().collect();
        prop_assert_eq!(tree.len(), keys.len());

        let mut order: Vec<i32> = keys.into_iter().collect();
        order.shuffle(&mut StdRng::seed_from_u64(seed));
        for key in &order {
            prop_assert!(tree.remove(key));
            prop_assert!(tree.is_balanced());
        }

        prop_assert!(tree.is_empty());
        prop_assert_eq!(tree.count_nodes(), 0);
        for key in &order {
            prop_assert!(tree.find(key).is_none());
        }
    }

    #[test]
    fn duplicates_stay_balanced(
        keys in proptest::collection::vec(0u8..16, 0..200),
        removals in proptest::collection::vec(0u8..16, 0..100),
    ) {
        let mut tree = Tree::new();
        for key in &keys {
            tree.insert(*key);
            prop_assert!(tree.is_balanced());
        }
        prop_assert_eq!(tree.len(), keys.len());

        let mut expected = keys.clone();
        expected.sort_unstable();
        for key in &removals {
            let position = expected.iter().position(|k| k == key);
            prop_assert_eq!(tree.remove(key), position.is_some());
            if let Some(position) = position {
                expected.remove(position);
            }
            prop_assert!(tree.validate().is_ok(), "{:?}", tree.validate());
        }
        prop_assert!(tree.inorder().into_iter().eq(expected.iter()));
    }

    #[test]
    fn balance_check_is_idempotent(keys in proptest::collection::vec(any::<i32>(), 0..200)) {
        let tree: Tree<i32> = keys.into_iter().collect();
        let first = tree.is_balanced();
        prop_assert_eq!(first, tree.is_balanced());
        prop_assert_eq!(first, tree.is_balanced());
        prop_assert!(first);
    }
}
