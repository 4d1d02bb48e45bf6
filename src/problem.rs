//! Assembly of the two feasibility problems and decoding of their solutions.
//!
//! # Meet-semilattice
//! Is there a partial order on the trees over `X` that refines the cluster
//! structure (Pareto on rooted triples), is invariant under relabeling, and
//! in which every pair has a meet? Variables `m[t,r,s]` select "t = r ∧ s";
//! the order itself is read off the diagonal, `p[t,r] = m[t,t,r]`.
//!
//! | family | meaning |
//! |---|---|
//! | `refl` | `p[t,t] = 1` |
//! | `antisym` | `p[t,r] + p[r,t] <= 1` for `t ≠ r` |
//! | `trans` | `p[t,s] >= p[t,r] + p[r,s] - 1` |
//! | `meet1`, `meet2` | `r ∧ s <= r` and `r ∧ s <= s` |
//! | `meet3` | `u <= r`, `u <= s`, `t = r ∧ s` imply `u <= t` |
//! | `bottom` | the star tree is the meet of itself with everything |
//! | `meetexists` | every normal pair has exactly one meet |
//!
//! # Extension-stable consensus
//! Is there a consensus rule on pairs of binary trees, for all leaf sets up
//! to `X`, that is Pareto on rooted triples and extension stable? Variables
//! `m[t,r,s]` select "t = consensus(r, s)"; `extstab` forbids incompatible
//! selections and `meetexists` picks exactly one value per binary pair.

use std::collections::{BTreeMap, BTreeSet};

use crate::canonical::{Canonicalizer, Pair, Triple};
use crate::candidate::{Exclusion, consensus_candidates, extension_stability_exclusions, meet_candidates};
use crate::cluster::{ClusterCache, is_binary};
use crate::driver::{NormalForms, SearchConfig, find_normal_forms};
use crate::enumerate::leaf_range;
use crate::error::{Error, Result};
use crate::model::{Assignment, LinearExpr, LinearModel, Optimizer, Sense, SolveOutcome, SolveRequest, VarId};
use crate::tree::{Leaf, Tree};

/// Which question to pose to the optimizer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ProblemKind {
    /// Meet-semilattice structure (associative, Pareto consensus).
    Meet,
    /// Extension-stable consensus on binary profiles.
    Consensus,
}

/// Variables and constraints of the meet-semilattice problem on `1..=n`.
#[derive(Clone, Debug)]
pub struct MeetProblem {
    pub leaves: Vec<Leaf>,
    pub forms: NormalForms,
    pub candidates: BTreeSet<Triple>,
    /// `p[t,r]`: the variable meaning `t <= r`, keyed by normal pair.
    pub order: BTreeMap<Pair, VarId>,
    pub model: LinearModel,
}

impl MeetProblem {
    pub fn build(config: &SearchConfig) -> Result<Self> {
        config.validate()?;
        let leaves = leaf_range(config.leaf_count);
        let mut canon = Canonicalizer::new();
        let forms = find_normal_forms(&leaves, config.threads, &mut canon)?;
        let candidates = meet_candidates(&forms.triples, &mut canon)?;

        let mut model = LinearModel::new("phylogenetictrees");
        for triple in &candidates {
            model.add_variable(triple.clone());
        }

        let mut order = BTreeMap::new();
        for Pair(t, r) in &forms.pairs {
            let diagonal = canon.normalize_tuple(&Triple(t.clone(), t.clone(), r.clone()))?;
            if let Some(var) = model.variable(&diagonal) {
                order.insert(Pair(t.clone(), r.clone()), var);
            }
        }

        let mut builder = MeetBuilder { canon: &mut canon, order: &order, model: &mut model };
        builder.add_poset_constraints(&forms)?;
        builder.add_meet_constraints(&forms, &candidates)?;
        builder.add_bottom_constraints(&forms, &leaves)?;
        add_matching_constraints(builder.canon, builder.model, &forms.pairs, &candidates)?;

        log::info!(
            "meet model: {} variables, {} constraints",
            model.num_variables(),
            model.constraints().len()
        );
        Ok(MeetProblem { leaves, forms, candidates, order, model })
    }

    /// Normal pairs `(t, r)` with `t <= r` in the assignment.
    pub fn order_relation(&self, assignment: &Assignment) -> Vec<Pair> {
        self.order
            .iter()
            .filter(|(_, var)| assignment.value(**var))
            .map(|(pair, _)| pair.clone())
            .collect()
    }

    /// Selected triples `(t, r, s)` with `t = r ∧ s`.
    pub fn meet_table(&self, assignment: &Assignment) -> Vec<Triple> {
        selected_triples(&self.model, assignment)
    }
}

struct MeetBuilder<'a> {
    canon: &'a mut Canonicalizer,
    order: &'a BTreeMap<Pair, VarId>,
    model: &'a mut LinearModel,
}

impl MeetBuilder<'_> {
    /// `p[a,b]` after normalizing the pair, if the pair can be ordered at all.
    fn order_var(&mut self, a: &Tree, b: &Tree) -> Result<Option<VarId>> {
        let pair = self.canon.normalize_tuple(&Pair(a.clone(), b.clone()))?;
        Ok(self.order.get(&pair).copied())
    }

    fn require_order_var(&mut self, a: &Tree, b: &Tree) -> Result<VarId> {
        self.order_var(a, b)?
            .ok_or_else(|| Error::MissingVariable(format!("p[{a}, {b}]")))
    }

    fn add_poset_constraints(&mut self, forms: &NormalForms) -> Result<()> {
        for t in &forms.normal_trees {
            let var = self
                .order
                .get(&Pair(t.clone(), t.clone()))
                .copied()
                .ok_or_else(|| Error::MissingVariable(format!("p[{t}, {t}]")))?;
            self.model.add_constraint("refl", LinearExpr::new().plus(var, 1), Sense::Equal, 1);
        }

        for (Pair(t, r), &tr) in self.order {
            if t == r {
                continue;
            }
            if let Some(rt) = self.order_var(r, t)? {
                self.model
                    .add_constraint("antisym", LinearExpr::new().plus(tr, 1).plus(rt, 1), Sense::LessEq, 1);
            }
        }

        for (Pair(t, r), &tr) in self.order {
            for s in &forms.trees {
                let Some(rs) = self.order_var(r, s)? else {
                    continue;
                };
                let mut expr = LinearExpr::new().plus(tr, -1).plus(rs, -1);
                if let Some(ts) = self.order_var(t, s)? {
                    expr.add(ts, 1);
                }
                self.model.add_constraint("trans", expr, Sense::GreaterEq, -1);
            }
        }
        Ok(())
    }

    fn add_meet_constraints(&mut self, forms: &NormalForms, candidates: &BTreeSet<Triple>) -> Result<()> {
        for triple in candidates {
            let Triple(t, r, s) = triple;
            let m = self.model.require(triple)?;
            let tr = self.require_order_var(t, r)?;
            let ts = self.require_order_var(t, s)?;
            self.model
                .add_constraint("meet1", LinearExpr::new().plus(tr, 1).plus(m, -1), Sense::GreaterEq, 0);
            self.model
                .add_constraint("meet2", LinearExpr::new().plus(ts, 1).plus(m, -1), Sense::GreaterEq, 0);
        }

        for triple in candidates {
            let Triple(t, r, s) = triple;
            let m = self.model.require(triple)?;
            for u in &forms.trees {
                let (Some(ur), Some(us)) = (self.order_var(u, r)?, self.order_var(u, s)?) else {
                    continue;
                };
                let mut expr = LinearExpr::new().plus(m, 1).plus(ur, 1).plus(us, 1);
                if let Some(ut) = self.order_var(u, t)? {
                    expr.add(ut, -1);
                }
                self.model.add_constraint("meet3", expr, Sense::LessEq, 2);
            }
        }
        Ok(())
    }

    fn add_bottom_constraints(&mut self, forms: &NormalForms, leaves: &[Leaf]) -> Result<()> {
        let Some(bottom) = Tree::star(leaves) else {
            return Ok(());
        };
        log::info!("forcing bottom element {bottom}");
        for t in &forms.trees {
            let triple = self.canon.normalize_tuple(&Triple(bottom.clone(), bottom.clone(), t.clone()))?;
            if let Some(var) = self.model.variable(&triple) {
                self.model.add_constraint("bottom", LinearExpr::new().plus(var, 1), Sense::Equal, 1);
            }
        }
        Ok(())
    }
}

/// `meetexists`: every listed pair is matched by exactly one selected triple.
///
/// A triple `(t, r, s)` serves both `(r, s)` and `(s, r)`; a pair reached
/// twice by the same triple still counts it once.
fn add_matching_constraints<'a, I>(
    canon: &mut Canonicalizer,
    model: &mut LinearModel,
    pairs: I,
    candidates: &BTreeSet<Triple>,
) -> Result<()>
where
    I: IntoIterator<Item = &'a Pair>,
{
    let mut matching: BTreeMap<Pair, BTreeSet<VarId>> =
        pairs.into_iter().map(|pair| (pair.clone(), BTreeSet::new())).collect();

    for triple in candidates {
        let Triple(_, r, s) = triple;
        let var = model.require(triple)?;
        let mut keys = vec![canon.normalize_tuple(&Pair(r.clone(), s.clone()))?];
        if r != s {
            keys.push(canon.normalize_tuple(&Pair(s.clone(), r.clone()))?);
        }
        for key in keys {
            matching
                .get_mut(&key)
                .ok_or_else(|| Error::MissingVariable(format!("matching for pair {key}")))?
                .insert(var);
        }
    }

    for vars in matching.into_values() {
        let expr = vars.into_iter().fold(LinearExpr::new(), |expr, var| expr.plus(var, 1));
        model.add_constraint("meetexists", expr, Sense::Equal, 1);
    }
    Ok(())
}

fn selected_triples(model: &LinearModel, assignment: &Assignment) -> Vec<Triple> {
    assignment
        .selected()
        .filter_map(|var| model.triple(var).cloned())
        .collect()
}

/// Variables and constraints of the extension-stability problem.
#[derive(Clone, Debug)]
pub struct ConsensusProblem {
    pub leaves: Vec<Leaf>,
    /// Normal forms for every leaf set `1..=i`, `3 <= i <= n`.
    pub forms: NormalForms,
    pub candidates: BTreeSet<Triple>,
    pub exclusions: Vec<Exclusion>,
    pub model: LinearModel,
}

impl ConsensusProblem {
    pub fn build(config: &SearchConfig) -> Result<Self> {
        config.validate()?;
        let leaves = leaf_range(config.leaf_count);
        let mut canon = Canonicalizer::new();
        let mut forms = NormalForms::default();
        for i in 3..=config.leaf_count {
            forms.extend(find_normal_forms(&leaf_range(i), config.threads, &mut canon)?);
        }

        let candidates = consensus_candidates(&forms.triples);
        let mut model = LinearModel::new("phylogenetictrees");
        for triple in &candidates {
            model.add_variable(triple.clone());
        }

        let exclusions = extension_stability_exclusions(&candidates, &mut canon, &mut ClusterCache::new())?;
        for (first, second) in &exclusions {
            let a = model.require(first)?;
            let b = model.require(second)?;
            model.add_constraint("extstab", LinearExpr::new().plus(a, 1).plus(b, 1), Sense::LessEq, 1);
        }

        let binary_pairs = forms
            .pairs
            .iter()
            .filter(|Pair(r, s)| is_binary(r) && is_binary(s));
        add_matching_constraints(&mut canon, &mut model, binary_pairs, &candidates)?;

        log::info!(
            "consensus model: {} variables, {} constraints",
            model.num_variables(),
            model.constraints().len()
        );
        Ok(ConsensusProblem { leaves, forms, candidates, exclusions, model })
    }

    /// Selected triples `(t, r, s)` with `t = consensus(r, s)`.
    pub fn consensus_table(&self, assignment: &Assignment) -> Vec<Triple> {
        selected_triples(&self.model, assignment)
    }
}

/// Either problem, for callers that pick the kind at runtime.
#[derive(Clone, Debug)]
pub enum Problem {
    Meet(MeetProblem),
    Consensus(ConsensusProblem),
}

impl Problem {
    pub fn build(kind: ProblemKind, config: &SearchConfig) -> Result<Self> {
        match kind {
            ProblemKind::Meet => MeetProblem::build(config).map(Problem::Meet),
            ProblemKind::Consensus => ConsensusProblem::build(config).map(Problem::Consensus),
        }
    }

    pub fn model(&self) -> &LinearModel {
        match self {
            Problem::Meet(p) => &p.model,
            Problem::Consensus(p) => &p.model,
        }
    }

    pub fn forms(&self) -> &NormalForms {
        match self {
            Problem::Meet(p) => &p.forms,
            Problem::Consensus(p) => &p.forms,
        }
    }

    pub fn leaves(&self) -> &[Leaf] {
        match self {
            Problem::Meet(p) => &p.leaves,
            Problem::Consensus(p) => &p.leaves,
        }
    }

    pub fn solve(&self, optimizer: &dyn Optimizer, request: &SolveRequest) -> Result<SolveOutcome> {
        let outcome = optimizer.solve(self.model(), request)?;
        match &outcome {
            SolveOutcome::Infeasible => log::info!("optimizer reports infeasibility"),
            SolveOutcome::Feasible { solutions, unique } => {
                log::info!("optimizer returned {} solution(s), unique: {unique}", solutions.len())
            }
        }
        Ok(outcome)
    }

    /// Message for an infeasible model.
    pub fn infeasible_message(&self) -> String {
        match self {
            Problem::Meet(p) => format!("There is no meet-semilattice structure for X = {:?}", p.leaves),
            Problem::Consensus(p) => format!("There is no valid consensus method for X = {:?}", p.leaves),
        }
    }

    /// Human-readable lines describing a solution.
    pub fn describe(&self, assignment: &Assignment) -> Vec<String> {
        match self {
            Problem::Meet(p) => {
                let mut lines = vec![format!(
                    "Found meet-semilattice structure for X = {:?} (normal pairs only):",
                    p.leaves
                )];
                lines.extend(p.order_relation(assignment).iter().map(|Pair(t, r)| format!("{t} <= {r}")));
                lines
            }
            Problem::Consensus(p) => {
                let mut lines = vec![format!("Found consensus method for X = {:?}:", p.leaves)];
                lines.extend(
                    p.consensus_table(assignment)
                        .iter()
                        .map(|Triple(t, r, s)| format!("{r} ^ {s} = {t}")),
                );
                lines
            }
        }
    }
}
