//! Clusters, the refinement order and restriction to leaf subsets.
//!
//! # Clusters
//! A cluster is the leaf set of some subtree, the whole tree and every single
//! leaf included. The cluster family determines the tree, so two trees are
//! compared through their families:
//!
//! ```text
//! (1,2,3)    clusters: {1} {2} {3} {1,2,3}
//! (1,(2,3))  clusters: {1} {2} {3} {2,3} {1,2,3}
//! ```
//!
//! `compare(t, s)` holds iff every cluster of `t` is a cluster of `s`; above,
//! the star `(1,2,3)` is below `(1,(2,3))`.
//!
//! # Restriction
//! Restricting a tree to a leaf subset prunes the other leaves and collapses
//! the nodes left with a single child:
//!
//! ```text
//! (1,(2,3,4)) restricted to {1,2,3}  →  (1,(2,3))
//! (1,2,3)     restricted to {1,4,5}  →  1
//! (1,2,3)     restricted to {4,5}    →  nothing
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::bitset::Bitset;
use crate::tree::{Leaf, Tree};

/// The clusters of one tree.
pub type ClusterSet = HashSet<Bitset>;

/// All clusters of `tree`.
pub fn clusters(tree: &Tree) -> ClusterSet {
    let mut out = HashSet::new();
    collect_clusters(tree, &mut out);
    out
}

/// DFS building cluster bitsets bottom-up: a leaf is its own singleton and an
/// internal node is the union of its children.
fn collect_clusters(tree: &Tree, out: &mut ClusterSet) -> Bitset {
    let bitset = match tree {
        Tree::Leaf(leaf) => Bitset::from_leaves([*leaf]),
        Tree::Node(children) => {
            let mut bitset = Bitset::default();
            for child in children {
                bitset.or_assign(&collect_clusters(child, out));
            }
            bitset
        }
    };
    out.insert(bitset.clone());
    bitset
}

/// Refinement order: `true` iff every cluster of `t` is a cluster of `s`.
pub fn compare(t: &Tree, s: &Tree) -> bool {
    clusters(t).is_subset(&clusters(s))
}

/// The tree induced by `t` on `keep ∩ leaves(t)`, or `None` if that is empty.
///
/// A node keeping a single child is replaced by that child, so a lone
/// surviving leaf is returned as a bare leaf.
pub fn restriction(t: &Tree, keep: &[Leaf]) -> Option<Tree> {
    match t {
        Tree::Leaf(leaf) => keep.contains(leaf).then(|| t.clone()),
        Tree::Node(children) => {
            let kept: Vec<Tree> = children.iter().filter_map(|c| restriction(c, keep)).collect();
            Tree::from_subtrees(kept)
        }
    }
}

/// `true` for a leaf, or for a node with exactly two binary children.
pub fn is_binary(t: &Tree) -> bool {
    match t {
        Tree::Leaf(_) => true,
        Tree::Node(children) => children.len() == 2 && children.iter().all(is_binary),
    }
}

/// Memoized cluster families, keyed by tree.
///
/// Entries are never invalidated; the cache only saves recomputation and
/// answers exactly like [`clusters`] and [`compare`].
#[derive(Debug, Default, Clone)]
pub struct ClusterCache {
    families: HashMap<Tree, Arc<ClusterSet>>,
}

impl ClusterCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clusters(&mut self, tree: &Tree) -> Arc<ClusterSet> {
        if let Some(family) = self.families.get(tree) {
            return Arc::clone(family);
        }
        let family = Arc::new(clusters(tree));
        self.families.insert(tree.clone(), Arc::clone(&family));
        family
    }

    pub fn compare(&mut self, t: &Tree, s: &Tree) -> bool {
        let ct = self.clusters(t);
        let cs = self.clusters(s);
        ct.is_subset(&cs)
    }

    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enumerate::{all_trees, leaf_range};

    fn t(s: &str) -> Tree {
        s.parse().unwrap()
    }

    fn family(sets: &[&[Leaf]]) -> ClusterSet {
        sets.iter().map(|s| Bitset::from_leaves(s.iter().copied())).collect()
    }

    #[test]
    fn test_clusters() {
        // the second pass goes through the warm cache
        let mut cache = ClusterCache::new();
        for _ in 0..2 {
            assert_eq!(*cache.clusters(&t("(1,2)")), family(&[&[1], &[2], &[1, 2]]));
            assert_eq!(
                *cache.clusters(&t("(1,(2,3))")),
                family(&[&[1], &[2], &[3], &[2, 3], &[1, 2, 3]])
            );
            assert_eq!(
                *cache.clusters(&t("(1,2,3,4)")),
                family(&[&[1], &[2], &[3], &[4], &[1, 2, 3, 4]])
            );
            assert_eq!(
                *cache.clusters(&t("(1,2,(3,4))")),
                family(&[&[1], &[2], &[3], &[4], &[3, 4], &[1, 2, 3, 4]])
            );
            assert_eq!(
                *cache.clusters(&t("(1,((2,3),(4,5)))")),
                family(&[
                    &[1],
                    &[2],
                    &[3],
                    &[4],
                    &[5],
                    &[2, 3],
                    &[4, 5],
                    &[2, 3, 4, 5],
                    &[1, 2, 3, 4, 5],
                ])
            );
        }
        assert_eq!(cache.len(), 5);
    }

    #[test]
    fn test_compare() {
        let mut cache = ClusterCache::new();
        for _ in 0..2 {
            assert!(cache.compare(&t("(1,2,3)"), &t("(1,(2,3))")));
            assert!(cache.compare(&t("(1,2,3)"), &t("(2,(1,3))")));
            assert!(cache.compare(&t("(1,2,3)"), &t("(3,(1,2))")));
            assert!(cache.compare(&t("(1,2,3)"), &t("(1,2,3)")));
            assert!(!cache.compare(&t("(1,(2,3))"), &t("(1,2,3)")));
            assert!(!cache.compare(&t("(2,(1,3))"), &t("(1,2,3)")));
            assert!(!cache.compare(&t("(3,(1,2))"), &t("(1,2,3)")));

            assert!(cache.compare(&t("(1,(2,3,(4,5)))"), &t("(1,((2,3),(4,5)))")));
            assert!(cache.compare(&t("(1,(2,3,(4,5)))"), &t("(1,(2,(3,(4,5))))")));
            assert!(!cache.compare(&t("(1,(2,3,(4,5)))"), &t("(1,(2,(3,4,5)))")));
        }
    }

    #[test]
    fn test_compare_is_reflexive_and_matches_clusters() {
        let trees: Vec<Tree> = all_trees(&leaf_range(4)).collect();
        for a in &trees {
            assert!(compare(a, a));
            for b in &trees {
                assert_eq!(compare(a, b), clusters(a).is_subset(&clusters(b)));
            }
        }
    }

    #[test]
    fn test_restriction() {
        assert_eq!(restriction(&t("(1,2,3)"), &[1, 4, 5]), Some(Tree::Leaf(1)));
        assert_eq!(restriction(&t("(1,2,3)"), &[4, 5]), None);
        assert_eq!(restriction(&t("(1,2,3,4)"), &[2, 3, 4]), Some(t("(2,3,4)")));
        assert_eq!(restriction(&t("(1,(2,3,4))"), &[2, 3, 4]), Some(t("(2,3,4)")));
        assert_eq!(restriction(&t("(1,(2,3,4))"), &[1, 2, 3]), Some(t("(1,(2,3))")));
        assert_eq!(restriction(&t("(1,(2,3,(4,5)))"), &[1, 2, 4, 5]), Some(t("(1,(2,(4,5)))")));
        assert_eq!(
            restriction(&t("(1,(2,3,(4,5)))"), &[1, 2, 3, 4, 5]),
            Some(t("(1,(2,3,(4,5)))"))
        );
    }

    #[test]
    fn test_restriction_to_own_leaf_set_is_identity() {
        for tree in all_trees(&leaf_range(5)) {
            assert_eq!(restriction(&tree, &tree.leaf_set()), Some(tree));
        }
    }

    #[test]
    fn test_is_binary() {
        assert!(is_binary(&Tree::Leaf(1)));
        assert!(is_binary(&t("(1,2)")));
        assert!(is_binary(&t("((1,2),(3,(4,5)))")));
        assert!(!is_binary(&t("(1,2,3)")));
        assert!(!is_binary(&t("(1,(2,3,4))")));
        let binary = all_trees(&leaf_range(4)).filter(is_binary).count();
        assert_eq!(binary, 15);
    }
}
