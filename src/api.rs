//! Python binding layer for tree enumeration and model export.
//!
//! Provides Python functions for counting trees and normal forms and for
//! writing the symmetry-reduced LP models.

use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;

use crate::canonical::Canonicalizer;
use crate::driver::{SearchConfig, find_normal_forms};
use crate::enumerate::{all_trees, leaf_range};
use crate::error::Error;
use crate::io::write_lp_model;
use crate::problem::{Problem, ProblemKind};

fn to_py_err(e: Error) -> PyErr {
    match e {
        Error::Io(e) => PyIOError::new_err(e.to_string()),
        e => PyValueError::new_err(e.to_string()),
    }
}

/// Number of rooted phylogenetic trees on the leaves 1..=n.
#[pyfunction]
fn count_trees(n: usize) -> usize {
    all_trees(&leaf_range(n)).count()
}

/// Count normal forms on the leaves 1..=n.
///
/// Returns:
///     A tuple of (trees, normal_trees, normal_pairs, normal_triples)
///
/// Raises:
///     ValueError: If n is 0 or the worker pool cannot be started
#[pyfunction]
#[pyo3(signature = (n, threads=1))]
fn normal_form_counts(n: usize, threads: usize) -> PyResult<(usize, usize, usize, usize)> {
    SearchConfig { leaf_count: n, threads }.validate().map_err(to_py_err)?;
    let forms = find_normal_forms(&leaf_range(n), threads, &mut Canonicalizer::new()).map_err(to_py_err)?;
    Ok((forms.trees.len(), forms.normal_trees.len(), forms.pairs.len(), forms.triples.len()))
}

/// Build a model and write it as an LP file.
///
/// Args:
///     n: Number of leaves
///     kind: "meet" or "consensus"
///     path: Output path (.gz for gzip)
///     threads: Worker threads for the normal-form computation (default: 1)
///
/// Returns:
///     A tuple of (variables, constraints)
///
/// Raises:
///     ValueError: For an unknown kind or invalid n
///     IOError: If the file cannot be written
#[pyfunction]
#[pyo3(signature = (n, kind, path, threads=1))]
fn write_model(n: usize, kind: &str, path: String, threads: usize) -> PyResult<(usize, usize)> {
    let kind = match kind {
        "meet" => ProblemKind::Meet,
        "consensus" => ProblemKind::Consensus,
        other => {
            return Err(PyValueError::new_err(format!(
                "unknown kind '{other}', expected 'meet' or 'consensus'"
            )));
        }
    };
    let problem = Problem::build(kind, &SearchConfig { leaf_count: n, threads }).map_err(to_py_err)?;
    let model = problem.model();
    write_lp_model(&path, model).map_err(|e| PyIOError::new_err(format!("Failed to write {path}: {e}")))?;
    Ok((model.num_variables(), model.constraints().len()))
}

/// Python module definition
#[pymodule]
fn tree_semilattice(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(count_trees, m)?)?;
    m.add_function(wrap_pyfunction!(normal_form_counts, m)?)?;
    m.add_function(wrap_pyfunction!(write_model, m)?)?;
    Ok(())
}
