//! Python binding layer for tree reconstruction.
//!
//! Provides Python functions that build the character tree of a binary
//! matrix given either as a file or as a list of row strings.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::error::MatrixError;
use crate::io::{normalize, parse_matrix, read_matrix};
use crate::matrix::{CharacterMatrix, LabelScheme};
use crate::partition::partition;
use crate::tree::{build_newick, BuildOptions};

fn to_py_err(e: MatrixError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// Build the tree of a matrix file.
///
/// Args:
///     path: Path to the matrix file (plain or .gz)
///     persistent: Label characters as gain/loss pairs (default: False)
///     validate: Raise instead of returning a tree when no perfect phylogeny exists (default: False)
///     parallel: Build sibling subtrees in parallel (default: False)
///
/// Returns:
///     The tree as a single `;`-terminated string
///
/// Raises:
///     ValueError: If the file cannot be read, is malformed, or fails validation
#[pyfunction]
#[pyo3(signature = (path, persistent=false, validate=false, parallel=false))]
fn tree_from_file(path: String, persistent: bool, validate: bool, parallel: bool) -> PyResult<String> {
    let mut matrix = read_matrix(&path, LabelScheme::from_persistent(persistent)).map_err(to_py_err)?;
    normalize(&mut matrix);
    build_newick(&matrix, &BuildOptions { parallel, validate }).map_err(to_py_err)
}

/// Build the tree of a matrix given as text.
///
/// Args:
///     text: Matrix text, rows of 0/1 with an optional `#` header line
///     persistent: Label characters as gain/loss pairs (default: False)
///     validate: Raise instead of returning a tree when no perfect phylogeny exists (default: False)
#[pyfunction]
#[pyo3(signature = (text, persistent=false, validate=false))]
fn tree_from_text(text: String, persistent: bool, validate: bool) -> PyResult<String> {
    let mut matrix = parse_matrix(&text, LabelScheme::from_persistent(persistent)).map_err(to_py_err)?;
    normalize(&mut matrix);
    build_newick(&matrix, &BuildOptions { parallel: false, validate }).map_err(to_py_err)
}

/// Partition the characters of a matrix into connected classes.
///
/// Args:
///     rows: List of 0/1 row strings, the first optionally a `#` header
///     persistent: Label characters as gain/loss pairs (default: False)
///
/// Returns:
///     A list of classes, each a list of character labels headed by its maximal character
#[pyfunction]
#[pyo3(signature = (rows, persistent=false))]
fn partition_characters(rows: Vec<String>, persistent: bool) -> PyResult<Vec<Vec<String>>> {
    let mut matrix = CharacterMatrix::from_rows(&rows, persistent).map_err(to_py_err)?;
    normalize(&mut matrix);
    partition(matrix.character_labels(), &matrix).map_err(to_py_err)
}

/// Python module definition
#[pymodule]
fn perfect_phylogeny(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(tree_from_file, m)?)?;
    m.add_function(wrap_pyfunction!(tree_from_text, m)?)?;
    m.add_function(wrap_pyfunction!(partition_characters, m)?)?;
    Ok(())
}
