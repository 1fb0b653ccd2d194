//! Splitting a character subset into connected classes.
//!
//! # Overview
//! Two characters are connected when some species possesses both, i.e. their
//! columns intersect. For a matrix that admits a perfect phylogeny the classes
//! are the connected components of that relation restricted to the subset, and
//! each class is headed by a maximal character: one whose species set contains
//! the species set of every other class member.
//!
//! # Example
//! ```text
//!         C1 C2 C3 C4 C5
//! s0000    1  1  0  0  0
//! s0001    1  0  1  0  0
//! s0002    1  0  0  0  0
//! s0003    0  0  0  1  1
//! s0004    0  0  0  1  0
//!
//! maximals: [C1, C4]
//! classes:  [[C1, C2, C3], [C4, C5]]
//! ```
//!
//! The input order must be the matrix's sorted column order (or a subsequence
//! of it); the first remaining label is then never strictly contained in
//! another remaining label.

use std::collections::HashSet;

use itertools::Itertools;
use tracing::trace;

use crate::bitset::Bitset;
use crate::error::MatrixError;
use crate::matrix::CharacterMatrix;

/// Finds the maximal characters of `labels`, one per eventual class.
///
/// Takes the labels by value: the working set is consumed as each maximal
/// character's block is removed from it. The block of a character is the union
/// of the characters possessed by the species that have it, which is the set of
/// characters whose column intersects its column. The maximal itself is always
/// removed, so the loop runs at most `labels.len()` times.
///
/// # Errors
/// `UnknownCharacter` if a label is not a column of `matrix`.
pub fn find_maximal(labels: Vec<String>, matrix: &CharacterMatrix) -> Result<Vec<String>, MatrixError> {
    let mut working = resolve(labels, matrix)?;
    let mut maximals = Vec::new();

    while !working.is_empty() {
        let (first, bits) = working.remove(0);
        working.retain(|(_, other)| !other.intersects(bits));
        trace!(maximal = %first, remaining = working.len(), "found maximal character");
        maximals.push(first);
    }

    Ok(maximals)
}

/// Splits `labels` into one class per maximal character.
///
/// Each class holds the labels of `labels` whose column intersects the maximal
/// character's column, kept in the relative order of `labels`. Classes are
/// emitted in the order the maximals were found.
///
/// On a matrix without a perfect phylogeny the classes may overlap or miss
/// labels; that is not reported here (see [`check_partition`]).
///
/// # Example
/// ```
/// # use perfect_phylogeny::matrix::CharacterMatrix;
/// # use perfect_phylogeny::partition::partition;
/// let mut m = CharacterMatrix::from_rows(&["110", "100", "001"], false).unwrap();
/// m.sort_columns();
/// let classes = partition(m.character_labels(), &m).unwrap();
/// assert_eq!(classes, vec![vec!["C00001", "C00002"], vec!["C00003"]]);
/// ```
pub fn partition(labels: &[String], matrix: &CharacterMatrix) -> Result<Vec<Vec<String>>, MatrixError> {
    let maximals = find_maximal(labels.to_vec(), matrix)?;
    let resolved = resolve(labels.to_vec(), matrix)?;

    maximals
        .iter()
        .map(|m| -> Result<Vec<String>, MatrixError> {
            let bits = matrix.column_bits(m)?;
            Ok(resolved
                .iter()
                .filter(|(_, other)| other.intersects(bits))
                .map(|(label, _)| label.clone())
                .collect())
        })
        .collect()
}

/// Checks that `classes` cover `labels` and are pairwise disjoint.
///
/// # Errors
/// `Incompatible` naming the first label found in two classes or in none.
pub fn check_partition(labels: &[String], classes: &[Vec<String>]) -> Result<(), MatrixError> {
    if let Some(label) = classes.iter().flatten().duplicates().next() {
        return Err(MatrixError::incompatible(format!(
            "character {label:?} falls in more than one class"
        )));
    }

    let covered: HashSet<&String> = classes.iter().flatten().collect();
    if let Some(label) = labels.iter().find(|l| !covered.contains(l)) {
        return Err(MatrixError::incompatible(format!("character {label:?} falls in no class")));
    }

    Ok(())
}

fn resolve(labels: Vec<String>, matrix: &CharacterMatrix) -> Result<Vec<(String, &Bitset)>, MatrixError> {
    labels
        .into_iter()
        .map(|label| matrix.column_bits(&label).map(|bits| (label, bits)))
        .collect()
}
