//! Normal forms of trees and tuples of trees under leaf relabeling.
//!
//! # Orbits
//! The symmetric group on a leaf set acts on trees by relabeling, and on
//! pairs and triples diagonally (the same relabeling on every component).
//! The normal form of an object is the smallest member of its orbit in the
//! canonical tree order:
//!
//! ```text
//! orbit of (3,(1,2)):  (1,(2,3))  (2,(1,3))  (3,(1,2))
//! normal form:         (1,(2,3))
//! ```
//!
//! Triples `(t, r, s)` stand for "t is the meet (or consensus) of r and s",
//! which does not depend on the order of r and s. Their orbit therefore
//! also contains every member with the last two components swapped.
//!
//! # Memoization
//! Computing an orbit costs `n!` relabelings. Once it is known, every member
//! is recorded with the normal form, so any later lookup of any member is a
//! single hash probe. Caches are plain values owned by a [`Canonicalizer`];
//! independent instances (one per worker, one per test) give identical
//! answers, and merging two caches is always sound because every entry is a
//! pure function of its key.
//!
//! # Tuple relabeling
//! Before the orbit lookup a tuple is relabeled onto `1..=n`, preserving the
//! order of its labels, so tuples over different but equally sized leaf sets
//! share cache entries. Tuple normal forms are therefore always over `1..=n`.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::enumerate::leaf_range;
use crate::error::{Error, Result};
use crate::permutation::{Permutation, all_permutations};
use crate::tree::Tree;

/// An ordered pair of trees on a common leaf set.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pair(pub Tree, pub Tree);

/// A triple `(t, r, s)`, read as "t combines r and s".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Triple(pub Tree, pub Tree, pub Tree);

/// Tuples of trees that can be brought into normal form.
pub trait TreeTuple: Sized {
    /// Number of components.
    const ARITY: usize;

    /// Whether the last two components may be swapped without changing the
    /// meaning of the tuple.
    const SWAP_LAST_TWO: bool;

    fn components(&self) -> Vec<Tree>;

    /// Rebuild a tuple from exactly [`Self::ARITY`] trees.
    fn from_components(components: Vec<Tree>) -> Result<Self>;
}

impl TreeTuple for Pair {
    const ARITY: usize = 2;
    const SWAP_LAST_TWO: bool = false;

    fn components(&self) -> Vec<Tree> {
        vec![self.0.clone(), self.1.clone()]
    }

    fn from_components(components: Vec<Tree>) -> Result<Self> {
        let found = components.len();
        let [t, r]: [Tree; 2] = components
            .try_into()
            .map_err(|_| Error::Arity { expected: Self::ARITY, found })?;
        Ok(Pair(t, r))
    }
}

impl TreeTuple for Triple {
    const ARITY: usize = 3;
    const SWAP_LAST_TWO: bool = true;

    fn components(&self) -> Vec<Tree> {
        vec![self.0.clone(), self.1.clone(), self.2.clone()]
    }

    fn from_components(components: Vec<Tree>) -> Result<Self> {
        let found = components.len();
        let [t, r, s]: [Tree; 3] = components
            .try_into()
            .map_err(|_| Error::Arity { expected: Self::ARITY, found })?;
        Ok(Triple(t, r, s))
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.0, self.1)
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.0, self.1, self.2)
    }
}

/// The orbit of `tree` under all relabelings of its own leaf set.
pub fn tree_orbit(tree: &Tree) -> Result<BTreeSet<Tree>> {
    all_permutations(&tree.leaf_set())
        .map(|sigma| sigma.apply(tree))
        .collect()
}

/// Memoizing normal-form engine for trees, pairs and triples.
#[derive(Debug, Default, Clone)]
pub struct Canonicalizer {
    trees: HashMap<Tree, Tree>,
    tuples: HashMap<Vec<Tree>, Vec<Tree>>,
}

impl Canonicalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Smallest member of the orbit of `tree` under relabelings of its leaf set.
    ///
    /// The whole orbit is cached on first use.
    pub fn normalize_tree(&mut self, tree: &Tree) -> Result<Tree> {
        if let Some(normal) = self.trees.get(tree) {
            return Ok(normal.clone());
        }

        let orbit = tree_orbit(tree)?;
        let Some(normal) = orbit.first().cloned() else {
            return Ok(tree.clone());
        };
        for member in orbit {
            self.trees.insert(member, normal.clone());
        }
        Ok(normal)
    }

    /// Normal form of a pair or triple.
    ///
    /// The tuple is relabeled onto `1..=n` first; the result is the smallest
    /// member of the diagonal orbit (closed under swapping the last two
    /// components for triples).
    ///
    /// # Errors
    /// [`Error::LeafSetMismatch`] if the components do not share a leaf set.
    pub fn normalize_tuple<T: TreeTuple>(&mut self, tuple: &T) -> Result<T> {
        let key = relabel_contiguous(tuple.components())?;
        if let Some(normal) = self.tuples.get(&key) {
            return T::from_components(normal.clone());
        }

        let domain = match key.first() {
            Some(first) => leaf_range(first.leaf_count()),
            None => Vec::new(),
        };
        let mut variants = vec![key.clone()];
        if T::SWAP_LAST_TWO && key.len() == 3 && key[1] != key[2] {
            let mut swapped = key.clone();
            swapped.swap(1, 2);
            variants.push(swapped);
        }

        let mut orbit: BTreeSet<Vec<Tree>> = BTreeSet::new();
        for sigma in all_permutations(&domain) {
            for variant in &variants {
                orbit.insert(apply_to_all(&sigma, variant)?);
            }
        }

        let normal = orbit.first().cloned().unwrap_or(key);
        for member in orbit {
            self.tuples.insert(member, normal.clone());
        }
        T::from_components(normal)
    }

    /// Take over the entries of another cache.
    ///
    /// Both caches map a key to the same normal form, so collisions are
    /// harmless.
    pub fn absorb(&mut self, other: Canonicalizer) {
        self.trees.extend(other.trees);
        self.tuples.extend(other.tuples);
    }

    /// Number of cached tree entries.
    pub fn cached_trees(&self) -> usize {
        self.trees.len()
    }

    /// Number of cached pair and triple entries.
    pub fn cached_tuples(&self) -> usize {
        self.tuples.len()
    }
}

fn apply_to_all(sigma: &Permutation, trees: &[Tree]) -> Result<Vec<Tree>> {
    trees.iter().map(|t| sigma.apply(t)).collect()
}

/// Check that all components share a leaf set and relabel them onto `1..=n`.
fn relabel_contiguous(components: Vec<Tree>) -> Result<Vec<Tree>> {
    let Some(first) = components.first() else {
        return Ok(components);
    };
    let leaves = first.leaf_set();
    for other in &components[1..] {
        let found = other.leaf_set();
        if found != leaves {
            return Err(Error::LeafSetMismatch { expected: leaves, found });
        }
    }

    let already_contiguous = leaves.iter().zip(1..).all(|(&leaf, k)| leaf == k);
    if already_contiguous {
        return Ok(components);
    }
    apply_to_all(&Permutation::contiguous(&leaves), &components)
}
