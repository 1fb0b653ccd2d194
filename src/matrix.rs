//! Binary species × character matrix, stored column-major.
//!
//! # Overview
//! Every character (column) is kept as a [`Bitset`] over species (rows). The
//! matrix owns both label sequences and the label → column mapping. After
//! construction it is normalized once with [`CharacterMatrix::remove_null_columns`]
//! and [`CharacterMatrix::sort_columns`] and is read-only from then on.
//!
//! # Column order
//! Columns are sorted in decreasing lexicographic order of their '0'/'1'
//! strings. For a matrix that admits a perfect phylogeny the species sets form
//! a laminar family, and in that order a character always precedes every
//! character whose species set it strictly contains:
//!
//! ```text
//!         s0 s1 s2 s3
//! C00003   1  1  1  0   "1110"
//! C00001   1  1  0  0   "1100"   ⊂ C00003
//! C00002   0  0  0  1   "0001"   disjoint
//! ```

use std::collections::HashMap;

use itertools::Itertools;
use tracing::debug;

use crate::bitset::Bitset;
use crate::error::MatrixError;

/// Rule used to synthesize character labels when the input carries no header.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum LabelScheme {
    /// `C%05d` over the 1-based column index.
    #[default]
    Plain,
    /// Gain/loss pairs: column `i` belongs to root character `i/2 + 1`,
    /// even columns are the gain (`C%04d+`), odd columns the loss (`C%04d-`).
    Persistent,
    /// The persistent rule as historically observed: the sign is computed as
    /// `i % 1`, which is always 0, so every column is labelled `C%04d+` and
    /// consecutive columns collide.
    PersistentLiteral,
}

impl LabelScheme {
    /// Maps the boundary `persistent` flag to a scheme.
    ///
    /// `true` selects the alternating [`LabelScheme::Persistent`] labels. This
    /// is provisional until the owner of the format settles what the `i % 1`
    /// sign was meant to be; [`LabelScheme::PersistentLiteral`] keeps the
    /// labels as historically produced.
    pub fn from_persistent(persistent: bool) -> Self {
        if persistent { LabelScheme::Persistent } else { LabelScheme::Plain }
    }

    /// Label of the character in (0-based) column `index`.
    ///
    /// # Example
    /// ```
    /// # use perfect_phylogeny::matrix::LabelScheme;
    /// assert_eq!(LabelScheme::Plain.label(0), "C00001");
    /// assert_eq!(LabelScheme::Persistent.label(3), "C0002-");
    /// assert_eq!(LabelScheme::PersistentLiteral.label(3), "C0002+");
    /// ```
    pub fn label(self, index: usize) -> String {
        match self {
            LabelScheme::Plain => format!("C{:05}", index + 1),
            LabelScheme::Persistent => {
                let root = index / 2 + 1;
                if index % 2 == 0 { format!("C{root:04}+") } else { format!("C{root:04}-") }
            }
            // the sign term `index % 1` is always 0
            LabelScheme::PersistentLiteral => format!("C{:04}+", index / 2 + 1),
        }
    }
}

/// Labels for `count` columns under `scheme`.
pub fn synthesize_labels(count: usize, scheme: LabelScheme) -> Vec<String> {
    (0..count).map(|i| scheme.label(i)).collect()
}

/// Characters that delimit branches in the tree text.
const TREE_DELIMITERS: [char; 5] = ['(', ')', ',', ':', ';'];

/// A label must survive being written into, and read back from, the tree text.
fn is_valid_label(label: &str) -> bool {
    !label.is_empty() && !label.contains(TREE_DELIMITERS)
}

/// Label of the species in (0-based) row `index`.
pub fn species_label(index: usize) -> String {
    format!("s{index:04}")
}

/// A labelled binary matrix, one bitset column per character.
///
/// # Fields
/// - `species_labels`: `s0000`, `s0001`, ... one per row
/// - `character_labels`: current column order (changed by sorting and pruning)
/// - `columns`: label → species bitset; key set equals `character_labels`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterMatrix {
    species_labels: Vec<String>,
    character_labels: Vec<String>,
    columns: HashMap<String, Bitset>,
}

impl CharacterMatrix {
    /// Builds a matrix from structured, column-major input.
    ///
    /// Each entry of `columns` is a '0'/'1' string with one symbol per species.
    ///
    /// # Errors
    /// - `Empty` when `species_count` is 0, `NoCharacters` when there are no columns
    /// - `HeaderMismatch` when `labels` and `columns` differ in length
    /// - `RaggedColumn`, `InvalidSymbol` for bad column strings
    /// - `InvalidLabel` for an empty label or one holding `(`, `)`, `,`, `:` or `;`
    /// - `DuplicateLabel` when two columns share a label
    pub fn from_columns<S: AsRef<str>>(
        species_count: usize,
        labels: Vec<String>,
        columns: &[S],
    ) -> Result<Self, MatrixError> {
        if species_count == 0 {
            return Err(MatrixError::Empty);
        }
        if columns.is_empty() {
            return Err(MatrixError::NoCharacters);
        }
        if labels.len() != columns.len() {
            return Err(MatrixError::HeaderMismatch { declared: labels.len(), columns: columns.len() });
        }

        let mut bitsets = Vec::with_capacity(columns.len());
        for (col, (label, text)) in labels.iter().zip(columns).enumerate() {
            let text = text.as_ref();
            let found = text.chars().count();
            if found != species_count {
                return Err(MatrixError::RaggedColumn { label: label.clone(), expected: species_count, found });
            }
            if let Some((row, symbol)) = text.chars().enumerate().find(|(_, c)| !matches!(c, '0' | '1')) {
                return Err(MatrixError::InvalidSymbol { row, column: col, symbol });
            }
            bitsets.push(Bitset::from_bits(species_count, text.chars().map(|c| c == '1')));
        }

        Self::from_bitsets(species_count, labels, bitsets)
    }

    /// Builds a matrix from row strings, the first of which may be a `#` header
    /// of comma/semicolon separated character names.
    ///
    /// Without a header, labels follow [`LabelScheme::from_persistent`].
    pub fn from_rows<S: AsRef<str>>(rows: &[S], persistent: bool) -> Result<Self, MatrixError> {
        Self::from_rows_with_scheme(rows, LabelScheme::from_persistent(persistent))
    }

    /// Like [`CharacterMatrix::from_rows`], with an explicit labelling scheme.
    ///
    /// # Example
    /// ```
    /// # use perfect_phylogeny::matrix::{CharacterMatrix, LabelScheme};
    /// let m = CharacterMatrix::from_rows_with_scheme(&["10", "11"], LabelScheme::Plain).unwrap();
    /// assert_eq!(m.character_labels(), ["C00001", "C00002"]);
    /// assert_eq!(m.column("C00002").unwrap(), "01");
    /// ```
    pub fn from_rows_with_scheme<S: AsRef<str>>(
        rows: &[S],
        scheme: LabelScheme,
    ) -> Result<Self, MatrixError> {
        let (header, body) = match rows.split_first() {
            Some((first, rest)) if first.as_ref().starts_with('#') => (Some(first.as_ref()), rest),
            _ => (None, rows),
        };

        let first = body.first().ok_or(MatrixError::Empty)?.as_ref();
        let width = first.chars().count();
        if width == 0 {
            return Err(MatrixError::NoCharacters);
        }

        let species_count = body.len();
        let words = Bitset::words_for(species_count);
        let mut bitsets = vec![Bitset::zeros(words); width];
        for (row, line) in body.iter().enumerate() {
            let line = line.as_ref();
            let found = line.chars().count();
            if found != width {
                return Err(MatrixError::RaggedRow { row, expected: width, found });
            }
            for (column, symbol) in line.chars().enumerate() {
                match symbol {
                    '1' => bitsets[column].set(row),
                    '0' => {}
                    _ => return Err(MatrixError::InvalidSymbol { row, column, symbol }),
                }
            }
        }

        let labels = match header {
            Some(h) => {
                let names: Vec<String> = h[1..].split([',', ';']).map(|n| n.trim().to_string()).collect();
                if names.len() != width {
                    return Err(MatrixError::HeaderMismatch { declared: names.len(), columns: width });
                }
                names
            }
            None => synthesize_labels(width, scheme),
        };

        Self::from_bitsets(species_count, labels, bitsets)
    }

    fn from_bitsets(
        species_count: usize,
        labels: Vec<String>,
        bitsets: Vec<Bitset>,
    ) -> Result<Self, MatrixError> {
        if let Some(label) = labels.iter().find(|l| !is_valid_label(l)) {
            return Err(MatrixError::InvalidLabel(label.clone()));
        }

        let mut columns = HashMap::with_capacity(labels.len());
        for (label, bits) in labels.iter().zip(bitsets) {
            if columns.insert(label.clone(), bits).is_some() {
                return Err(MatrixError::DuplicateLabel(label.clone()));
            }
        }

        Ok(CharacterMatrix {
            species_labels: (0..species_count).map(species_label).collect(),
            character_labels: labels,
            columns,
        })
    }

    pub fn species_count(&self) -> usize {
        self.species_labels.len()
    }

    pub fn character_count(&self) -> usize {
        self.character_labels.len()
    }

    pub fn species_labels(&self) -> &[String] {
        &self.species_labels
    }

    /// Character labels in the current column order.
    pub fn character_labels(&self) -> &[String] {
        &self.character_labels
    }

    /// The species bitset of a character.
    pub fn column_bits(&self, label: &str) -> Result<&Bitset, MatrixError> {
        self.columns
            .get(label)
            .ok_or_else(|| MatrixError::UnknownCharacter(label.to_string()))
    }

    /// The '0'/'1' string of a character, species 0 first.
    pub fn column(&self, label: &str) -> Option<String> {
        self.columns
            .get(label)
            .map(|bits| bits.to_bit_string(self.species_count()))
    }

    /// Deletes every character that no species possesses.
    ///
    /// Surviving labels keep their relative order. Returns how many were removed.
    pub fn remove_null_columns(&mut self) -> usize {
        let before = self.character_labels.len();
        let columns = &mut self.columns;
        self.character_labels.retain(|label| {
            let keep = columns.get(label).is_some_and(|bits| !bits.is_empty());
            if !keep {
                columns.remove(label);
            }
            keep
        });
        let removed = before - self.character_labels.len();
        debug!(removed, remaining = self.character_labels.len(), "removed null columns");
        removed
    }

    /// Reorders characters into decreasing lexicographic order of their columns.
    ///
    /// The sort is stable: identical columns keep their relative order.
    pub fn sort_columns(&mut self) {
        let columns = &self.columns;
        self.character_labels
            .sort_by(|a, b| columns[b].lex_cmp(&columns[a]));
        debug!(characters = self.character_labels.len(), "sorted columns");
    }

    /// Indices of the species that possess `label`, ascending.
    pub fn species_with(&self, label: &str) -> Result<Vec<usize>, MatrixError> {
        Ok(self.column_bits(label)?.iter_ones().collect())
    }

    /// Labels of the characters that species `species` possesses, in column order.
    ///
    /// An index past the last species possesses nothing.
    pub fn characters_of(&self, species: usize) -> Vec<&str> {
        self.character_labels
            .iter()
            .filter(|label| self.columns[label.as_str()].get(species))
            .map(String::as_str)
            .collect()
    }

    /// First pair of characters, in column order, whose species sets overlap
    /// without one containing the other.
    ///
    /// Such a pair rules out a perfect phylogeny with an all-zero ancestor.
    /// Returns `None` when every pair is nested or disjoint.
    pub fn first_conflict(&self) -> Option<(&str, &str)> {
        self.first_conflict_in(&self.character_labels)
    }

    /// Like [`CharacterMatrix::first_conflict`], restricted to `labels` and
    /// taken in their order. Labels the matrix does not own are skipped.
    pub fn first_conflict_in<'a>(&self, labels: &'a [String]) -> Option<(&'a str, &'a str)> {
        labels
            .iter()
            .filter_map(|label| self.columns.get(label).map(|bits| (label, bits)))
            .tuple_combinations()
            .find(|((_, ca), (_, cb))| ca.intersects(cb) && !ca.is_subset_of(cb) && !cb.is_subset_of(ca))
            .map(|((a, _), (b, _))| (a.as_str(), b.as_str()))
    }
}
