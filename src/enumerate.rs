//! Enumeration of set partitions and of all phylogenetic trees on a leaf set.
//!
//! # Trees from partitions
//! Every tree with at least two leaves is determined by the partition of its
//! leaf set induced by the root's children, together with one tree per block.
//! Enumerating all non-trivial partitions and, per partition, the Cartesian
//! product of the trees on each block therefore yields every tree exactly
//! once; sorting the children makes the result canonical.
//!
//! The number of trees grows super-exponentially
//! (1, 1, 4, 26, 236, 2752, 39208 for 1..=7 leaves), so callers keep the
//! leaf set small.

use itertools::Itertools;

use crate::tree::{Leaf, Tree};

/// A set partition: a list of non-empty, pairwise disjoint blocks.
pub type Partition = Vec<Vec<Leaf>>;

/// All subsets of `items`, smallest first, each in the order of `items`.
///
/// ```
/// # use tree_semilattice::enumerate::powerset;
/// let subsets: Vec<_> = powerset(&[1, 2, 3]).collect();
/// assert_eq!(subsets.len(), 8);
/// assert_eq!(subsets[0], Vec::<u32>::new());
/// assert_eq!(subsets[7], vec![1, 2, 3]);
/// ```
pub fn powerset(items: &[Leaf]) -> impl Iterator<Item = Vec<Leaf>> + use<> {
    items.to_vec().into_iter().powerset()
}

/// Lazily generate every partition of `items` into non-empty blocks.
///
/// The first element is fixed; each subset of the remaining elements joins
/// it to form the first block, and the rest is partitioned recursively. Each
/// partition is produced exactly once, the single-block partition included.
/// An empty input produces nothing.
pub fn set_partitions(items: &[Leaf]) -> Box<dyn Iterator<Item = Partition>> {
    let Some((&first, rest)) = items.split_first() else {
        return Box::new(std::iter::empty());
    };
    if rest.is_empty() {
        return Box::new(std::iter::once(vec![vec![first]]));
    }

    let rest = rest.to_vec();
    Box::new(powerset(&rest).flat_map(move |mates| {
        let remaining: Vec<Leaf> = rest.iter().copied().filter(|x| !mates.contains(x)).collect();
        let mut block = Vec::with_capacity(mates.len() + 1);
        block.push(first);
        block.extend(mates);

        if remaining.is_empty() {
            Box::new(std::iter::once(vec![block])) as Box<dyn Iterator<Item = Partition>>
        } else {
            Box::new(set_partitions(&remaining).map(move |mut partition| {
                partition.insert(0, block.clone());
                partition
            }))
        }
    }))
}

/// Lazily generate every phylogenetic tree on `leaves`, each exactly once.
///
/// ```
/// # use tree_semilattice::enumerate::all_trees;
/// assert_eq!(all_trees(&[1, 2, 3]).count(), 4);
/// assert_eq!(all_trees(&[1, 2, 3, 4]).count(), 26);
/// ```
pub fn all_trees(leaves: &[Leaf]) -> Box<dyn Iterator<Item = Tree>> {
    match leaves {
        [] => Box::new(std::iter::empty()),
        [leaf] => Box::new(std::iter::once(Tree::Leaf(*leaf))),
        _ => Box::new(
            set_partitions(leaves)
                // the single-block partition would give a degree-1 root
                .filter(|partition| partition.len() > 1)
                .flat_map(|partition| {
                    partition
                        .into_iter()
                        .map(|block| all_trees(&block).collect::<Vec<_>>())
                        .multi_cartesian_product()
                        .filter_map(Tree::from_subtrees)
                }),
        ),
    }
}

/// Labels `1..=n`, the canonical leaf set of size `n`.
pub fn leaf_range(n: usize) -> Vec<Leaf> {
    (1..=n as Leaf).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeSet, HashSet};

    fn trees(specs: &[&str]) -> BTreeSet<Tree> {
        specs.iter().map(|s| s.parse().unwrap()).collect()
    }

    #[test]
    fn test_set_partitions_counts_are_bell_numbers() {
        let bell = [1, 2, 5, 15, 52, 203];
        for (k, expected) in bell.iter().enumerate() {
            let items = leaf_range(k + 1);
            assert_eq!(set_partitions(&items).count(), *expected, "n = {}", k + 1);
        }
    }

    #[test]
    fn test_set_partitions_are_distinct_and_cover() {
        let items = leaf_range(4);
        let mut seen = HashSet::new();
        for partition in set_partitions(&items) {
            let mut flat: Vec<Leaf> = partition.iter().flatten().copied().collect();
            flat.sort_unstable();
            assert_eq!(flat, items);
            assert!(partition.iter().all(|block| !block.is_empty()));

            let mut normalized: Vec<Vec<Leaf>> = partition
                .into_iter()
                .map(|mut b| {
                    b.sort_unstable();
                    b
                })
                .collect();
            normalized.sort();
            assert!(seen.insert(normalized), "partition produced twice");
        }
        assert!(seen.contains(&vec![items.clone()]));
    }

    #[test]
    fn test_set_partitions_empty() {
        assert_eq!(set_partitions(&[]).count(), 0);
    }

    #[test]
    fn test_all_trees_small() {
        assert_eq!(all_trees(&[1, 2]).collect::<BTreeSet<_>>(), trees(&["(1,2)"]));
        assert_eq!(
            all_trees(&[1, 3, 7]).collect::<BTreeSet<_>>(),
            trees(&["(1,3,7)", "(1,(3,7))", "(3,(1,7))", "(7,(1,3))"])
        );
        assert_eq!(all_trees(&[5]).collect::<Vec<_>>(), vec![Tree::Leaf(5)]);
        assert_eq!(all_trees(&[]).count(), 0);
    }

    #[test]
    fn test_all_trees_four_leaves() {
        let expected = trees(&[
            "(1,2,3,4)",
            "(1,2,(3,4))",
            "(1,3,(2,4))",
            "(1,4,(2,3))",
            "(2,3,(1,4))",
            "(2,4,(1,3))",
            "(3,4,(1,2))",
            "(1,(2,3,4))",
            "(2,(1,3,4))",
            "(3,(1,2,4))",
            "(4,(1,2,3))",
            "(1,(2,(3,4)))",
            "(1,(3,(2,4)))",
            "(1,(4,(2,3)))",
            "(2,(1,(3,4)))",
            "(2,(3,(1,4)))",
            "(2,(4,(1,3)))",
            "(3,(1,(2,4)))",
            "(3,(2,(1,4)))",
            "(3,(4,(1,2)))",
            "(4,(1,(2,3)))",
            "(4,(2,(1,3)))",
            "(4,(3,(1,2)))",
            "((1,2),(3,4))",
            "((1,3),(2,4))",
            "((1,4),(2,3))",
        ]);
        let produced: Vec<Tree> = all_trees(&[1, 2, 3, 4]).collect();
        assert_eq!(produced.len(), 26);
        assert_eq!(produced.into_iter().collect::<BTreeSet<_>>(), expected);
    }

    #[test]
    fn test_all_trees_counts_without_duplicates() {
        for (n, expected) in [(5, 236), (6, 2752)] {
            let produced: Vec<Tree> = all_trees(&leaf_range(n)).collect();
            let distinct: HashSet<&Tree> = produced.iter().collect();
            assert_eq!(produced.len(), expected);
            assert_eq!(distinct.len(), expected);
        }
    }

    #[test]
    fn test_powerset_order() {
        let subsets: Vec<Vec<Leaf>> = powerset(&[1, 2, 3]).collect();
        assert_eq!(
            subsets,
            vec![
                vec![],
                vec![1],
                vec![2],
                vec![3],
                vec![1, 2],
                vec![1, 3],
                vec![2, 3],
                vec![1, 2, 3],
            ]
        );
    }
}
