//! Boundary to an external 0/1 optimizer.
//!
//! # Overview
//! A [`LinearModel`] is a feasibility problem over binary decision variables,
//! one per candidate triple, together with linear constraints. The crate
//! never solves it; an implementation of [`Optimizer`] (or an external solver
//! reading the LP export from [`crate::io`]) does, and reports back either
//! infeasibility or one or more assignments.
//!
//! Infeasibility is an ordinary answer ("no such structure exists") and is
//! returned as [`SolveOutcome::Infeasible`], not as an error.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::canonical::Triple;
use crate::error::{Error, Result};

/// Dense index of a decision variable.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(pub usize);

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m_{}", self.0)
    }
}

impl VarId {
    /// Inverse of the `m_<index>` rendering.
    pub fn parse(name: &str) -> Option<VarId> {
        name.strip_prefix("m_")?.parse().ok().map(VarId)
    }
}

/// A sum of integer multiples of decision variables.
///
/// Repeated variables are merged and zero coefficients dropped, so the
/// expression is kept as a sorted map.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinearExpr {
    terms: BTreeMap<VarId, i64>,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, var: VarId, coefficient: i64) -> &mut Self {
        let entry = self.terms.entry(var).or_insert(0);
        *entry += coefficient;
        if *entry == 0 {
            self.terms.remove(&var);
        }
        self
    }

    /// Builder form of [`LinearExpr::add`].
    pub fn plus(mut self, var: VarId, coefficient: i64) -> Self {
        self.add(var, coefficient);
        self
    }

    pub fn terms(&self) -> impl Iterator<Item = (VarId, i64)> + '_ {
        self.terms.iter().map(|(&v, &c)| (v, c))
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn evaluate(&self, assignment: &Assignment) -> i64 {
        self.terms()
            .map(|(var, c)| if assignment.value(var) { c } else { 0 })
            .sum()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Sense {
    LessEq,
    GreaterEq,
    Equal,
}

impl Sense {
    pub fn holds(self, lhs: i64, rhs: i64) -> bool {
        match self {
            Sense::LessEq => lhs <= rhs,
            Sense::GreaterEq => lhs >= rhs,
            Sense::Equal => lhs == rhs,
        }
    }

    /// LP-format operator.
    pub fn symbol(self) -> &'static str {
        match self {
            Sense::LessEq => "<=",
            Sense::GreaterEq => ">=",
            Sense::Equal => "=",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Constraint {
    /// Constraint family, e.g. `trans` or `meetexists`.
    pub family: &'static str,
    pub expr: LinearExpr,
    pub sense: Sense,
    pub rhs: i64,
}

impl Constraint {
    pub fn is_satisfied_by(&self, assignment: &Assignment) -> bool {
        self.sense.holds(self.expr.evaluate(assignment), self.rhs)
    }
}

/// A 0/1 value per decision variable, indexed by [`VarId`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Assignment(pub Vec<bool>);

impl Assignment {
    pub fn value(&self, var: VarId) -> bool {
        self.0.get(var.0).copied().unwrap_or(false)
    }

    /// Variables set to 1.
    pub fn selected(&self) -> impl Iterator<Item = VarId> + '_ {
        self.0.iter().enumerate().filter(|(_, v)| **v).map(|(k, _)| VarId(k))
    }
}

/// Binary feasibility model over candidate triples.
#[derive(Clone, Debug, Default)]
pub struct LinearModel {
    pub name: String,
    variables: Vec<Triple>,
    index: HashMap<Triple, VarId>,
    constraints: Vec<Constraint>,
}

impl LinearModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    /// Register a variable for `triple`, returning the existing one if any.
    pub fn add_variable(&mut self, triple: Triple) -> VarId {
        if let Some(&var) = self.index.get(&triple) {
            return var;
        }
        let var = VarId(self.variables.len());
        self.index.insert(triple.clone(), var);
        self.variables.push(triple);
        var
    }

    pub fn variable(&self, triple: &Triple) -> Option<VarId> {
        self.index.get(triple).copied()
    }

    /// Like [`LinearModel::variable`], but a missing variable is an error.
    pub fn require(&self, triple: &Triple) -> Result<VarId> {
        self.variable(triple).ok_or_else(|| Error::MissingVariable(triple.to_string()))
    }

    pub fn triple(&self, var: VarId) -> Option<&Triple> {
        self.variables.get(var.0)
    }

    pub fn add_constraint(&mut self, family: &'static str, expr: LinearExpr, sense: Sense, rhs: i64) {
        self.constraints.push(Constraint { family, expr, sense, rhs });
    }

    pub fn variables(&self) -> &[Triple] {
        &self.variables
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// Number of constraints per family, in family order.
    pub fn constraint_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for c in &self.constraints {
            *counts.entry(c.family).or_insert(0) += 1;
        }
        counts
    }

    /// Constraints the assignment violates.
    pub fn violations<'a>(&'a self, assignment: &'a Assignment) -> impl Iterator<Item = &'a Constraint> + 'a {
        self.constraints.iter().filter(move |c| !c.is_satisfied_by(assignment))
    }

    pub fn is_satisfied_by(&self, assignment: &Assignment) -> bool {
        assignment.0.len() == self.variables.len() && self.violations(assignment).next().is_none()
    }

    /// Build an assignment from named solver values; values above 0.5 count as 1.
    ///
    /// Variables the solution does not mention are 0.
    ///
    /// # Errors
    /// [`Error::UnknownVariable`] for names that are not `m_<index>` of this model.
    pub fn assignment_from_values<'a, I>(&self, values: I) -> Result<Assignment>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut bits = vec![false; self.variables.len()];
        for (name, value) in values {
            let var = VarId::parse(name)
                .filter(|v| v.0 < bits.len())
                .ok_or_else(|| Error::UnknownVariable(name.to_string()))?;
            bits[var.0] = value > 0.5;
        }
        Ok(Assignment(bits))
    }
}

/// What the caller asks of the optimizer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SolveRequest {
    pub threads: usize,

    /// Maximum number of distinct solutions to return.
    pub solution_limit: usize,
}

impl Default for SolveRequest {
    fn default() -> Self {
        Self { threads: 1, solution_limit: 1 }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SolveOutcome {
    /// No assignment satisfies the constraints.
    Infeasible,

    /// At least one assignment exists. `unique` is set when the optimizer
    /// proved there is no other.
    Feasible { solutions: Vec<Assignment>, unique: bool },
}

impl SolveOutcome {
    pub fn is_feasible(&self) -> bool {
        matches!(self, SolveOutcome::Feasible { .. })
    }
}

/// An external 0/1 solver.
pub trait Optimizer {
    fn solve(&self, model: &LinearModel, request: &SolveRequest) -> Result<SolveOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Tree;

    fn leaf_triple(k: u32) -> Triple {
        Triple(Tree::Leaf(k), Tree::Leaf(k), Tree::Leaf(k))
    }

    #[test]
    fn test_expression_merges_terms() {
        let expr = LinearExpr::new().plus(VarId(0), 1).plus(VarId(1), -1).plus(VarId(0), 1).plus(VarId(1), 1);
        assert_eq!(expr.terms().collect::<Vec<_>>(), vec![(VarId(0), 2)]);
    }

    #[test]
    fn test_variables_are_deduplicated() {
        let mut model = LinearModel::new("test");
        let a = model.add_variable(leaf_triple(1));
        let b = model.add_variable(leaf_triple(2));
        assert_eq!(model.add_variable(leaf_triple(1)), a);
        assert_eq!(model.num_variables(), 2);
        assert_eq!(model.triple(b), Some(&leaf_triple(2)));
        assert!(matches!(model.require(&leaf_triple(3)), Err(Error::MissingVariable(_))));
    }

    #[test]
    fn test_satisfaction() {
        let mut model = LinearModel::new("test");
        let a = model.add_variable(leaf_triple(1));
        let b = model.add_variable(leaf_triple(2));
        model.add_constraint("pick", LinearExpr::new().plus(a, 1).plus(b, 1), Sense::Equal, 1);
        model.add_constraint("order", LinearExpr::new().plus(a, 1).plus(b, -1), Sense::GreaterEq, 0);

        assert!(model.is_satisfied_by(&Assignment(vec![true, false])));
        assert!(!model.is_satisfied_by(&Assignment(vec![false, true])));
        assert!(!model.is_satisfied_by(&Assignment(vec![true, true])));
        assert!(!model.is_satisfied_by(&Assignment(vec![true])));
        assert_eq!(model.violations(&Assignment(vec![false, true])).count(), 2);
        assert_eq!(model.constraint_counts().get("pick"), Some(&1));
    }

    #[test]
    fn test_assignment_from_values() {
        let mut model = LinearModel::new("test");
        model.add_variable(leaf_triple(1));
        model.add_variable(leaf_triple(2));

        let assignment = model.assignment_from_values([("m_1", 1.0), ("m_0", -0.0)]).unwrap();
        assert_eq!(assignment, Assignment(vec![false, true]));
        assert_eq!(assignment.selected().collect::<Vec<_>>(), vec![VarId(1)]);

        assert!(matches!(
            model.assignment_from_values([("m_7", 1.0)]),
            Err(Error::UnknownVariable(_))
        ));
        assert!(matches!(
            model.assignment_from_values([("x", 1.0)]),
            Err(Error::UnknownVariable(_))
        ));
    }

    #[test]
    fn test_var_names() {
        assert_eq!(VarId(12).to_string(), "m_12");
        assert_eq!(VarId::parse("m_12"), Some(VarId(12)));
        assert_eq!(VarId::parse("p_12"), None);
    }
}
