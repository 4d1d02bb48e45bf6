//! Leaf relabelings and their action on trees.
//!
//! A permutation maps a leaf set bijectively onto a leaf set of the same size
//! (usually itself). Applying it relabels every leaf and re-sorts siblings,
//! so the image is again in canonical form.

use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;

use crate::error::{Error, Result};
use crate::tree::{Leaf, Tree};

/// A bijection between two leaf sets of equal size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Permutation {
    images: BTreeMap<Leaf, Leaf>,
}

impl Permutation {
    /// Build the map `domain[i] → images[i]`.
    ///
    /// # Errors
    /// [`Error::InvalidPermutation`] if the lengths differ or either side
    /// repeats a label.
    pub fn new(domain: &[Leaf], images: &[Leaf]) -> Result<Self> {
        if domain.len() != images.len() {
            return Err(Error::InvalidPermutation(format!(
                "{} labels mapped onto {} images",
                domain.len(),
                images.len()
            )));
        }
        let distinct_images: BTreeSet<&Leaf> = images.iter().collect();
        if distinct_images.len() != images.len() {
            return Err(Error::InvalidPermutation(format!("repeated image in {images:?}")));
        }
        let permutation = Self::from_pairs(domain.iter().copied().zip(images.iter().copied()));
        if permutation.images.len() != domain.len() {
            return Err(Error::InvalidPermutation(format!("repeated label in {domain:?}")));
        }
        Ok(permutation)
    }

    fn from_pairs<I: IntoIterator<Item = (Leaf, Leaf)>>(pairs: I) -> Self {
        Permutation { images: pairs.into_iter().collect() }
    }

    pub fn identity(domain: &[Leaf]) -> Self {
        Self::from_pairs(domain.iter().map(|&x| (x, x)))
    }

    /// Relabel the sorted `domain` onto `1..=n`, preserving order.
    pub fn contiguous(domain: &[Leaf]) -> Self {
        Self::from_pairs(domain.iter().copied().zip(1..))
    }

    pub fn get(&self, leaf: Leaf) -> Option<Leaf> {
        self.images.get(&leaf).copied()
    }

    pub fn domain(&self) -> impl Iterator<Item = Leaf> + '_ {
        self.images.keys().copied()
    }

    /// Relabel every leaf of `tree` and restore canonical sibling order.
    ///
    /// # Errors
    /// [`Error::UncoveredLeaf`] if the tree has a leaf outside the domain.
    pub fn apply(&self, tree: &Tree) -> Result<Tree> {
        match tree {
            Tree::Leaf(leaf) => self
                .get(*leaf)
                .map(Tree::Leaf)
                .ok_or(Error::UncoveredLeaf { leaf: *leaf }),
            Tree::Node(children) => {
                let mut mapped = children.iter().map(|c| self.apply(c)).collect::<Result<Vec<_>>>()?;
                mapped.sort_unstable();
                Ok(Tree::Node(mapped))
            }
        }
    }
}

/// Apply `sigma` to `tree`. See [`Permutation::apply`].
pub fn apply_permutation(tree: &Tree, sigma: &Permutation) -> Result<Tree> {
    sigma.apply(tree)
}

/// Lazily enumerate the `n!` permutations of `domain`.
///
/// Permutations come in lexicographic order of their image sequences,
/// starting with the identity when `domain` is sorted.
pub fn all_permutations(domain: &[Leaf]) -> impl Iterator<Item = Permutation> + use<> {
    let domain = domain.to_vec();
    let n = domain.len();
    domain
        .clone()
        .into_iter()
        .permutations(n)
        .map(move |images| Permutation::from_pairs(domain.iter().copied().zip(images)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> Tree {
        s.parse().unwrap()
    }

    #[test]
    fn test_apply_relabels_and_resorts() {
        let sigma = Permutation::new(&[1, 2, 3, 4], &[2, 3, 4, 1]).unwrap();
        assert_eq!(sigma.apply(&t("(1,(2,3))")).unwrap(), t("(2,(3,4))"));
        assert_eq!(sigma.apply(&t("(4,(1,2))")).unwrap(), t("(1,(2,3))"));
        assert_eq!(apply_permutation(&t("((1,2),(3,4))"), &sigma).unwrap(), t("((1,4),(2,3))"));
    }

    #[test]
    fn test_apply_fails_on_uncovered_leaf() {
        let sigma = Permutation::identity(&[1, 2]);
        assert!(matches!(sigma.apply(&t("(1,(2,3))")), Err(Error::UncoveredLeaf { leaf: 3 })));
    }

    #[test]
    fn test_new_rejects_non_bijections() {
        assert!(matches!(Permutation::new(&[1, 2], &[1]), Err(Error::InvalidPermutation(_))));
        assert!(matches!(Permutation::new(&[1, 2], &[3, 3]), Err(Error::InvalidPermutation(_))));
        assert!(matches!(Permutation::new(&[1, 1], &[2, 3]), Err(Error::InvalidPermutation(_))));
        assert!(Permutation::new(&[1, 2], &[7, 9]).is_ok());
    }

    #[test]
    fn test_all_permutations() {
        let perms: Vec<Permutation> = all_permutations(&[1, 2, 3]).collect();
        assert_eq!(perms.len(), 6);
        assert_eq!(perms[0], Permutation::identity(&[1, 2, 3]));
        let distinct: BTreeSet<Vec<Leaf>> = perms
            .iter()
            .map(|p| p.domain().filter_map(|x| p.get(x)).collect())
            .collect();
        assert_eq!(distinct.len(), 6);
    }

    #[test]
    fn test_contiguous() {
        let sigma = Permutation::contiguous(&[2, 5, 9]);
        assert_eq!(sigma.apply(&t("(9,(2,5))")).unwrap(), t("(3,(1,2))"));
    }
}
