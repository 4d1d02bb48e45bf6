//! Parallel computation of all normal pairs and triples on a leaf set.
//!
//! # Work partitioning
//! Every orbit of pairs or triples contains a member whose first component
//! is a normal tree. One work unit per normal tree `t` therefore normalizes
//! `(t, r)` and `(t, r, s)` for all trees `r`, `s` on the leaf set, and the
//! union over all units covers every orbit.
//!
//! Units run on a dedicated `rayon` pool. Each worker folds its units into a
//! local [`Canonicalizer`] and local result sets; the partial results are
//! merged by set union, which is associative and commutative, so scheduling
//! order is unobservable. The first failing unit aborts the whole batch.

use std::collections::{BTreeSet, HashSet};

use rayon::prelude::*;

use crate::canonical::{Canonicalizer, Pair, Triple};
use crate::enumerate::all_trees;
use crate::error::{Error, Result};
use crate::tree::{Leaf, Tree};

/// Settings for a normal-form computation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SearchConfig {
    /// Size `n` of the leaf set `1..=n`.
    pub leaf_count: usize,

    /// Worker threads; 0 lets `rayon` pick one per core.
    pub threads: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { leaf_count: 3, threads: 1 }
    }
}

impl SearchConfig {
    /// Leaf counts above this make the triple enumeration impractical.
    pub const PRACTICAL_LEAF_LIMIT: usize = 7;

    pub fn validate(&self) -> Result<()> {
        if self.leaf_count == 0 {
            return Err(Error::InvalidConfig("the leaf set must not be empty".to_string()));
        }
        if self.leaf_count > Self::PRACTICAL_LEAF_LIMIT {
            log::warn!(
                "{} leaves requested; enumeration beyond {} leaves may not finish",
                self.leaf_count,
                Self::PRACTICAL_LEAF_LIMIT
            );
        }
        Ok(())
    }
}

/// Everything the candidate derivation needs about one leaf set.
#[derive(Clone, Debug, Default)]
pub struct NormalForms {
    /// All trees on the leaf set, in enumeration order.
    pub trees: Vec<Tree>,
    pub normal_trees: BTreeSet<Tree>,
    pub pairs: BTreeSet<Pair>,
    pub triples: BTreeSet<Triple>,
}

impl NormalForms {
    /// Union with the normal forms of another leaf set.
    pub fn extend(&mut self, other: NormalForms) {
        self.trees.extend(other.trees);
        self.normal_trees.extend(other.normal_trees);
        self.pairs.extend(other.pairs);
        self.triples.extend(other.triples);
    }
}

/// Per-worker partial result.
#[derive(Default)]
struct Partial {
    canon: Canonicalizer,
    pairs: HashSet<Pair>,
    triples: HashSet<Triple>,
}

impl Partial {
    fn process_unit(mut self, t: &Tree, trees: &[Tree]) -> Result<Self> {
        for r in trees {
            let pair = self.canon.normalize_tuple(&Pair(t.clone(), r.clone()))?;
            self.pairs.insert(pair);
            for s in trees {
                let triple = self.canon.normalize_tuple(&Triple(t.clone(), r.clone(), s.clone()))?;
                self.triples.insert(triple);
            }
        }
        log::debug!("normalized all tuples starting with {t} ({} cached)", self.canon.cached_tuples());
        Ok(self)
    }

    fn merge(mut self, other: Partial) -> Partial {
        self.canon.absorb(other.canon);
        self.pairs.extend(other.pairs);
        self.triples.extend(other.triples);
        self
    }
}

/// Compute all normal trees, pairs and triples on `leaves`.
///
/// Tree normal forms are computed up front with `canon`; the worker caches
/// are merged back into `canon` at the end, so later lookups are warm.
pub fn find_normal_forms(leaves: &[Leaf], threads: usize, canon: &mut Canonicalizer) -> Result<NormalForms> {
    let trees: Vec<Tree> = all_trees(leaves).collect();
    let normal_trees = trees
        .iter()
        .map(|tree| canon.normalize_tree(tree))
        .collect::<Result<BTreeSet<_>>>()?;
    log::info!(
        "{} leaves: {} trees, {} normal trees",
        leaves.len(),
        trees.len(),
        normal_trees.len()
    );

    let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
    let units: Vec<&Tree> = normal_trees.iter().collect();
    let merged = pool.install(|| {
        units
            .par_iter()
            .try_fold(Partial::default, |partial, t| partial.process_unit(t, &trees))
            .try_reduce(Partial::default, |a, b| Ok(a.merge(b)))
    })?;

    log::info!(
        "{} leaves: {} normal pairs, {} normal triples",
        leaves.len(),
        merged.pairs.len(),
        merged.triples.len()
    );
    canon.absorb(merged.canon);

    Ok(NormalForms {
        trees,
        normal_trees,
        pairs: merged.pairs.into_iter().collect(),
        triples: merged.triples.into_iter().collect(),
    })
}
