//! Crate root: lightweight module orchestration and public re-exports.
//!
//! Modules:
//! - `tree`: rooted leaf-labelled trees, tuple notation and Newick interop.
//! - `bitset`: compact bitset representation for clusters.
//! - `enumerate`: set partitions and all trees on a leaf set.
//! - `cluster`: cluster sets, refinement and restriction.
//! - `permutation`: leaf relabelings.
//! - `canonical`: normal forms of trees, pairs and triples under relabeling.
//! - `driver`: parallel computation of all normal pairs and triples.
//! - `candidate`: Pareto / unanimity filters and extension-stability exclusions.
//! - `model`: linear 0/1 models and the optimizer boundary.
//! - `problem`: the meet-semilattice and consensus feasibility problems.
//! - `io`: LP export and solution import.
//! - `api`: Python bindings via `pyo3` (gated behind "python" feature).

pub mod tree;
pub mod bitset;
pub mod enumerate;
pub mod cluster;
pub mod permutation;
pub mod canonical;
pub mod driver;
pub mod candidate;
pub mod model;
pub mod problem;
pub mod io;
pub mod error;

#[cfg(feature = "python")]
pub mod api;

// Re-export frequently used types & functions
pub use bitset::Bitset;
pub use canonical::{Canonicalizer, Pair, Triple};
pub use driver::{NormalForms, SearchConfig, find_normal_forms};
pub use error::{Error, Result};
pub use io::{read_solution, write_lp_model};
pub use model::{Assignment, LinearModel, Optimizer, SolveOutcome, SolveRequest};
pub use problem::{ConsensusProblem, MeetProblem, Problem, ProblemKind};
pub use tree::{Leaf, Tree};
