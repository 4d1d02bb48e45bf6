//! Compact bitset representation for clusters (leaf subsets).
//!
//! # Overview
//! Each bit position is a leaf label. A cluster of a tree is stored as the
//! bitset of the labels below some node, so cluster families can be compared
//! with plain set operations on `Bitset` values.
//!
//! # Example
//! For the tree `(1,(2,3))`:
//! - Cluster {2, 3} → bitset `0b1100` (bits 2 and 3 set)
//! - Cluster {1, 2, 3} → bitset `0b1110`
//!
//! # Invariant
//! A bitset never ends in an all-zero word. Equal leaf sets therefore have
//! equal word vectors regardless of how they were built, which keeps the
//! derived `Eq` and `Hash` meaningful.

use crate::tree::Leaf;

/// A compact bitset for representing which leaves belong to a cluster.
///
/// Internally stores bits in `Vec<u64>` words; each word holds 64 labels.
#[derive(Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Bitset(pub Vec<u64>);

impl Bitset {
    /// Bitset holding exactly the given labels.
    ///
    /// # Example
    /// ```
    /// # use tree_semilattice::bitset::Bitset;
    /// let bs = Bitset::from_leaves([2, 3]);
    /// assert_eq!(bs.0, vec![0b1100]);
    /// assert_eq!(Bitset::from_leaves([]), Bitset::default());
    /// ```
    pub fn from_leaves<I: IntoIterator<Item = Leaf>>(leaves: I) -> Self {
        let mut bitset = Bitset::default();
        for leaf in leaves {
            bitset.insert(leaf);
        }
        bitset
    }

    /// Sets the bit at the given index; the word must already exist.
    #[inline]
    fn set(&mut self, idx: usize) {
        let word = idx >> 6;     // Equivalent to idx / 64
        let bit = idx & 63;      // Equivalent to idx % 64
        self.0[word] |= 1u64 << bit;
    }

    /// Adds a label, growing the word vector when needed.
    #[inline]
    pub fn insert(&mut self, leaf: Leaf) {
        let idx = leaf as usize;
        let words = (idx >> 6) + 1;
        if self.0.len() < words {
            self.0.resize(words, 0);
        }
        self.set(idx);
    }

    #[inline]
    pub fn contains(&self, leaf: Leaf) -> bool {
        let idx = leaf as usize;
        self.0
            .get(idx >> 6)
            .is_some_and(|word| word & (1u64 << (idx & 63)) != 0)
    }

    /// Performs bitwise OR with another bitset (union operation).
    ///
    /// `self` becomes `self ∪ other`; the shorter operand is padded.
    ///
    /// # Example
    /// ```
    /// # use tree_semilattice::bitset::Bitset;
    /// let mut left = Bitset::from_leaves([0]);
    /// let right = Bitset::from_leaves([1, 70]);
    /// left.or_assign(&right);
    /// assert_eq!(left, Bitset::from_leaves([0, 1, 70]));
    /// ```
    #[inline]
    pub fn or_assign(&mut self, other: &Bitset) {
        if self.0.len() < other.0.len() {
            self.0.resize(other.0.len(), 0);
        }
        for (a, b) in self.0.iter_mut().zip(&other.0) {
            *a |= *b;
        }
    }

    /// `true` when every label of `self` is also in `other`.
    pub fn is_subset(&self, other: &Bitset) -> bool {
        self.0.iter().enumerate().all(|(k, word)| {
            let theirs = other.0.get(k).copied().unwrap_or(0);
            word & !theirs == 0
        })
    }

    /// Counts the number of set bits (population count).
    ///
    /// # Example
    /// ```
    /// # use tree_semilattice::bitset::Bitset;
    /// let bs = Bitset::from_leaves([0, 2, 5]);
    /// assert_eq!(bs.count_ones(), 3);
    /// ```
    #[inline]
    pub fn count_ones(&self) -> usize {
        self.0.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Labels in ascending order.
    pub fn leaves(&self) -> Vec<Leaf> {
        let mut out = Vec::with_capacity(self.count_ones());
        for (k, &word) in self.0.iter().enumerate() {
            let mut rest = word;
            while rest != 0 {
                let bit = rest.trailing_zeros() as usize;
                out.push(((k << 6) + bit) as Leaf);
                rest &= rest - 1;
            }
        }
        out
    }
}
