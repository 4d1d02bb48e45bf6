//! Crate-wide error type.
//!
//! Malformed input (a permutation that misses a leaf, tuple components on
//! different leaf sets) is fatal to the call that detects it. Infeasibility of
//! a model is not an error; see [`crate::model::SolveOutcome`].

use crate::tree::Leaf;

/// Errors raised by enumeration, canonicalization and model assembly.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A permutation was applied to a tree containing a leaf it does not map.
    #[error("permutation is not defined on leaf {leaf}")]
    UncoveredLeaf { leaf: Leaf },

    /// Domain and image do not describe a bijection.
    #[error("invalid permutation: {0}")]
    InvalidPermutation(String),

    /// Components of a tuple do not share the same leaf set.
    #[error("tuple components have different leaf sets: expected {expected:?}, found {found:?}")]
    LeafSetMismatch { expected: Vec<Leaf>, found: Vec<Leaf> },

    /// A tuple was rebuilt from the wrong number of trees.
    #[error("expected a tuple of {expected} trees, found {found}")]
    Arity { expected: usize, found: usize },

    /// Tuple notation could not be parsed.
    #[error("cannot parse tree: {0}")]
    Parse(String),

    /// Newick input rejected by `phylotree` or carrying non-integer labels.
    #[error("cannot read newick tree: {0}")]
    Newick(String),

    /// A constraint refers to a tuple that has no decision variable.
    #[error("no decision variable for {0}")]
    MissingVariable(String),

    /// A solution names a variable the model does not know.
    #[error("solution refers to unknown variable {0}")]
    UnknownVariable(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("cannot start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the library.
pub type Result<T> = std::result::Result<T, Error>;
