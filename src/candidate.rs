//! Admissible candidate triples for meets and consensus values.
//!
//! A triple `(t, r, s)` proposes that `t` is the meet (or consensus) of `r`
//! and `s`. Before a triple becomes a decision variable it has to pass the
//! filters below; everything it fails is known to be impossible in any
//! solution.
//!
//! # Pareto on rooted triples
//! For every 3-leaf subset `Y`, if `r` and `s` agree on a resolved rooted
//! triple on `Y`, then `t` must display that rooted triple as well:
//!
//! ```text
//! r|Y = (1,(2,3))   s|Y = (1,(2,3))   t|Y must be (1,(2,3))
//! r|Y = (1,2,3)     s|Y = (1,2,3)     no requirement
//! ```
//!
//! # Extension stability
//! For binary profiles, restricting a consensus to a leaf subset `Z` must
//! not contradict the consensus of the restricted profile. Triples that
//! would do so are reported as mutually exclusive pairs.

use std::collections::BTreeSet;

use itertools::Itertools;

use crate::canonical::{Canonicalizer, Triple};
use crate::cluster::{ClusterCache, is_binary, restriction};
use crate::enumerate::{all_trees, powerset};
use crate::error::Result;
use crate::tree::Tree;

/// Two candidate triples of which at most one may be selected.
pub type Exclusion = (Triple, Triple);

/// `(t, r, r)` is only possible when `t = r`.
pub fn respects_unanimity(triple: &Triple) -> bool {
    let Triple(t, r, s) = triple;
    r != s || t == r
}

/// A 3-leaf restriction other than the fully unresolved star.
fn is_resolved_rooted_triple(tree: &Tree) -> bool {
    tree.children().len() < 3
}

/// `true` unless some 3-leaf subset witnesses a Pareto violation.
pub fn is_pareto_on_rooted_triples(triple: &Triple) -> bool {
    let Triple(t, r, s) = triple;
    t.leaf_set().into_iter().combinations(3).all(|y| {
        let Some(u) = restriction(r, &y) else {
            return true;
        };
        if !is_resolved_rooted_triple(&u) {
            return true;
        }
        restriction(s, &y).as_ref() != Some(&u) || restriction(t, &y).as_ref() == Some(&u)
    })
}

/// Candidates for "t is the meet of r and s" in a meet-semilattice.
///
/// Besides unanimity and Pareto, `t` may not lie strictly below a different
/// member of its own orbit, so `t ≠ r` (resp. `t ≠ s`) requires different
/// tree shapes.
pub fn meet_candidates<'a, I>(triples: I, canon: &mut Canonicalizer) -> Result<BTreeSet<Triple>>
where
    I: IntoIterator<Item = &'a Triple>,
{
    let mut out = BTreeSet::new();
    for triple in triples {
        let Triple(t, r, s) = triple;
        if !respects_unanimity(triple) {
            continue;
        }
        let shape = canon.normalize_tree(t)?;
        if t != r && canon.normalize_tree(r)? == shape {
            continue;
        }
        if t != s && canon.normalize_tree(s)? == shape {
            continue;
        }
        if is_pareto_on_rooted_triples(triple) {
            out.insert(triple.clone());
        }
    }
    log::info!("{} meet candidates", out.len());
    Ok(out)
}

/// Candidates for "t is the consensus of the binary trees r and s".
pub fn consensus_candidates<'a, I>(triples: I) -> BTreeSet<Triple>
where
    I: IntoIterator<Item = &'a Triple>,
{
    let out: BTreeSet<Triple> = triples
        .into_iter()
        .filter(|triple| respects_unanimity(triple))
        .filter(|Triple(_, r, s)| is_binary(r) && is_binary(s))
        .filter(|triple| is_pareto_on_rooted_triples(triple))
        .cloned()
        .collect();
    log::info!("{} consensus candidates", out.len());
    out
}

/// Mutually exclusive candidate pairs enforcing extension stability.
///
/// For a candidate `(t, r, s)` on `Y`, every leaf subset `Z` with
/// `3 < |Z| < |Y|` and every binary tree `u` on `Z` that does not refine `t|Z`,
/// the normalized `(u, r|Z, s|Z)` excludes `(t, r, s)` if it is itself a
/// candidate.
pub fn extension_stability_exclusions(
    candidates: &BTreeSet<Triple>,
    canon: &mut Canonicalizer,
    clusters: &mut ClusterCache,
) -> Result<Vec<Exclusion>> {
    let mut out = Vec::new();
    for triple in candidates {
        let Triple(t, r, s) = triple;
        let leaves = t.leaf_set();
        for z in powerset(&leaves).filter(|z| z.len() > 3 && z.len() < leaves.len()) {
            let (Some(t_z), Some(r_z), Some(s_z)) = (restriction(t, &z), restriction(r, &z), restriction(s, &z))
            else {
                continue;
            };
            for u in all_trees(&z).filter(is_binary) {
                if clusters.compare(&u, &t_z) {
                    continue;
                }
                let second = canon.normalize_tuple(&Triple(u, r_z.clone(), s_z.clone()))?;
                if candidates.contains(&second) {
                    out.push((triple.clone(), second));
                }
            }
        }
    }
    log::info!("{} extension stability exclusions", out.len());
    Ok(out)
}
