//! Reconstructing a character tree from a normalized matrix.
//!
//! # Overview
//! The tree is built top-down: the characters are partitioned into classes,
//! the first (maximal) character of each class becomes a branch label, and the
//! rest of the class is realized recursively below that branch.
//!
//! ```text
//!              root
//!            /      \
//!        C00001    C00004
//!        /    \        \
//!    C00002  C00003   C00005
//!
//! ((:C00002,:C00003):C00001,(:C00005):C00004);
//! ```
//!
//! Each branch is written as `<subtree>:<label>`; an empty subtree is a leaf.
//! Every recursion level consumes at least one character, so the depth is at
//! most the number of characters.

use std::fmt;

use itertools::Itertools;
use rayon::prelude::*;
use tracing::debug;

use crate::error::{MatrixError, TreeParseError, TreeParseErrorKind};
use crate::matrix::CharacterMatrix;
use crate::partition::{check_partition, partition};

/// A reconstructed tree whose edges carry character labels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CharacterTree {
    /// No further structure.
    #[default]
    Leaf,
    /// Ordered branches, one per partition class.
    Internal(Vec<Branch>),
}

/// An edge into `subtree`, labelled with the character it realizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub subtree: CharacterTree,
    pub label: String,
}

/// Knobs for [`build_with`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    /// Build the subtrees of sibling classes on the rayon pool.
    pub parallel: bool,
    /// Reject matrices without a perfect phylogeny instead of returning a
    /// tree that does not represent one.
    pub validate: bool,
}

/// Builds the tree realizing `characters`, permissively.
///
/// `characters` should follow the matrix's sorted column order and name only
/// characters that some species possesses.
///
/// # Example
/// ```
/// # use perfect_phylogeny::matrix::CharacterMatrix;
/// # use perfect_phylogeny::tree::build;
/// let mut m = CharacterMatrix::from_rows(&["11", "10", "00"], false).unwrap();
/// m.remove_null_columns();
/// m.sort_columns();
/// let tree = build(&m, m.character_labels()).unwrap();
/// assert_eq!(tree.to_newick(), "((:C00002):C00001);");
/// ```
pub fn build(matrix: &CharacterMatrix, characters: &[String]) -> Result<CharacterTree, MatrixError> {
    build_with(matrix, characters, &BuildOptions::default())
}

/// Builds the tree realizing `characters` under `options`.
///
/// The result does not depend on `options.parallel`.
///
/// # Errors
/// - `UnknownCharacter` for a label the matrix does not own
/// - `NullCharacter` for a character no species possesses
/// - `Incompatible` when `options.validate` is set and no perfect phylogeny exists
pub fn build_with(
    matrix: &CharacterMatrix,
    characters: &[String],
    options: &BuildOptions,
) -> Result<CharacterTree, MatrixError> {
    for label in characters {
        if matrix.column_bits(label)?.is_empty() {
            return Err(MatrixError::NullCharacter(label.clone()));
        }
    }

    if options.validate {
        if let Some((a, b)) = matrix.first_conflict_in(characters) {
            return Err(MatrixError::incompatible(format!(
                "characters {a:?} and {b:?} share species but neither contains the other"
            )));
        }
    }

    build_node(matrix, characters.to_vec(), options, 0)
}

/// Builds over all of the matrix's characters and renders the terminated tree text.
pub fn build_newick(matrix: &CharacterMatrix, options: &BuildOptions) -> Result<String, MatrixError> {
    build_with(matrix, matrix.character_labels(), options).map(|tree| tree.to_newick())
}

// Takes the characters by value and drops them once partitioned, so a deep
// chain only keeps the classes still waiting to be built.
fn build_node(
    matrix: &CharacterMatrix,
    characters: Vec<String>,
    options: &BuildOptions,
    depth: usize,
) -> Result<CharacterTree, MatrixError> {
    if characters.is_empty() {
        return Ok(CharacterTree::Leaf);
    }

    let classes = partition(&characters, matrix)?;
    if options.validate {
        check_partition(&characters, &classes)?;
    }
    debug!(depth, characters = characters.len(), classes = classes.len(), "partitioned characters");
    drop(characters);

    let branches = if options.parallel {
        classes
            .into_par_iter()
            .map(|class| build_branch(matrix, class, options, depth))
            .collect::<Result<Vec<_>, _>>()?
    } else {
        classes
            .into_iter()
            .map(|class| build_branch(matrix, class, options, depth))
            .collect::<Result<Vec<_>, _>>()?
    };

    Ok(CharacterTree::Internal(branches))
}

fn build_branch(
    matrix: &CharacterMatrix,
    mut class: Vec<String>,
    options: &BuildOptions,
    depth: usize,
) -> Result<Branch, MatrixError> {
    if class.is_empty() {
        return Err(MatrixError::incompatible("empty character class"));
    }
    let label = class.remove(0);
    let subtree = build_node(matrix, class, options, depth + 1)?;
    Ok(Branch { subtree, label })
}

impl CharacterTree {
    /// Parses tree text in the format produced by [`CharacterTree::to_newick`].
    ///
    /// A trailing line break is accepted. Parsing then rendering reproduces the
    /// input byte for byte.
    ///
    /// # Example
    /// ```
    /// # use perfect_phylogeny::tree::CharacterTree;
    /// let text = "((:b,:c):a,:d);";
    /// let tree = CharacterTree::parse(text).unwrap();
    /// assert_eq!(tree.labels(), ["a", "b", "c", "d"]);
    /// assert_eq!(tree.to_newick(), text);
    /// ```
    pub fn parse(text: &str) -> Result<Self, TreeParseError> {
        let text = text.trim_end_matches(['\n', '\r']);
        let mut parser = TreeParser { text, pos: 0 };
        let tree = parser.subtree()?;
        match parser.peek() {
            Some(';') => parser.pos += 1,
            Some(c) => return Err(parser.error(TreeParseErrorKind::UnexpectedChar(c))),
            None => return Err(parser.error(TreeParseErrorKind::MissingTerminator)),
        }
        if parser.pos != text.len() {
            return Err(parser.error(TreeParseErrorKind::TrailingInput));
        }
        Ok(tree)
    }

    /// Renders the tree followed by the `;` terminator.
    pub fn to_newick(&self) -> String {
        format!("{self};")
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, CharacterTree::Leaf)
    }

    /// Branches below the root, empty for a leaf.
    pub fn branches(&self) -> &[Branch] {
        match self {
            CharacterTree::Leaf => &[],
            CharacterTree::Internal(branches) => branches,
        }
    }

    /// All branch labels in pre-order (a branch before its subtree).
    pub fn labels(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_labels(&mut out);
        out
    }

    fn collect_labels<'a>(&'a self, out: &mut Vec<&'a str>) {
        for branch in self.branches() {
            out.push(&branch.label);
            branch.subtree.collect_labels(out);
        }
    }

    /// Number of labelled branches.
    pub fn label_count(&self) -> usize {
        self.branches().iter().map(|b| 1 + b.subtree.label_count()).sum()
    }

    /// Number of nested branch levels; 0 for a leaf.
    pub fn depth(&self) -> usize {
        self.branches()
            .iter()
            .map(|b| 1 + b.subtree.depth())
            .max()
            .unwrap_or(0)
    }
}

impl fmt::Display for CharacterTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CharacterTree::Leaf => Ok(()),
            CharacterTree::Internal(branches) => write!(f, "({})", branches.iter().format(",")),
        }
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.subtree, self.label)
    }
}

struct TreeParser<'a> {
    text: &'a str,
    pos: usize,
}

impl TreeParser<'_> {
    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn error(&self, kind: TreeParseErrorKind) -> TreeParseError {
        TreeParseError { position: self.pos, kind }
    }

    fn subtree(&mut self) -> Result<CharacterTree, TreeParseError> {
        if self.peek() != Some('(') {
            return Ok(CharacterTree::Leaf);
        }
        self.pos += 1;

        let mut branches = Vec::new();
        loop {
            branches.push(self.branch()?);
            match self.peek() {
                Some(',') => self.pos += 1,
                Some(')') => {
                    self.pos += 1;
                    return Ok(CharacterTree::Internal(branches));
                }
                Some(c) => return Err(self.error(TreeParseErrorKind::UnexpectedChar(c))),
                None => return Err(self.error(TreeParseErrorKind::UnexpectedEnd)),
            }
        }
    }

    fn branch(&mut self) -> Result<Branch, TreeParseError> {
        let subtree = self.subtree()?;
        match self.peek() {
            Some(':') => self.pos += 1,
            Some(c) => return Err(self.error(TreeParseErrorKind::UnexpectedChar(c))),
            None => return Err(self.error(TreeParseErrorKind::UnexpectedEnd)),
        }

        let start = self.pos;
        let len = self.text[start..]
            .find(['(', ')', ',', ':', ';'])
            .unwrap_or(self.text.len() - start);
        if len == 0 {
            return Err(self.error(TreeParseErrorKind::EmptyLabel));
        }
        self.pos += len;
        Ok(Branch { subtree, label: self.text[start..self.pos].to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalized(rows: &[&str]) -> CharacterMatrix {
        let mut m = CharacterMatrix::from_rows(rows, false).unwrap();
        m.remove_null_columns();
        m.sort_columns();
        m
    }

    /// ```text
    ///         C1 C2 C3 C4 C5
    /// s0000    1  1  0  0  0
    /// s0001    1  0  1  0  0
    /// s0002    1  0  0  0  0
    /// s0003    0  0  0  1  1
    /// s0004    0  0  0  1  0
    /// ```
    #[test]
    fn test_build_two_components() {
        let m = normalized(&["11000", "10100", "10000", "00011", "00010"]);
        let tree = build(&m, m.character_labels()).unwrap();
        assert_eq!(tree.to_newick(), "((:C00002,:C00003):C00001,(:C00005):C00004);");
        assert_eq!(tree.label_count(), 5);
        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.labels(), ["C00001", "C00002", "C00003", "C00004", "C00005"]);
    }

    #[test]
    fn test_build_empty_characters_is_leaf() {
        let m = normalized(&["10"]);
        let tree = build(&m, &[]).unwrap();
        assert!(tree.is_leaf());
        assert_eq!(tree.to_newick(), ";");
    }

    #[test]
    fn test_chain_of_nested_characters() {
        // "1110" ⊃ "1100" ⊃ "1000"
        let m = normalized(&["111", "110", "100", "000"]);
        let tree = build(&m, m.character_labels()).unwrap();
        assert_eq!(tree.to_newick(), "(((:C00003):C00002):C00001);");
        assert_eq!(tree.depth(), 3);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let m = normalized(&["11000", "10100", "10000", "00011", "00010"]);
        let options = BuildOptions { parallel: true, validate: true };
        let parallel = build_with(&m, m.character_labels(), &options).unwrap();
        assert_eq!(parallel, build(&m, m.character_labels()).unwrap());
    }

    #[test]
    fn test_null_character_rejected() {
        let mut m = CharacterMatrix::from_rows(&["10", "10"], false).unwrap();
        m.sort_columns();
        let err = build(&m, m.character_labels()).unwrap_err();
        assert!(matches!(err, MatrixError::NullCharacter(ref l) if l == "C00002"));
    }

    /// Overlapping columns build permissively but fail validation.
    #[test]
    fn test_incompatible_matrix() {
        let m = normalized(&["110", "100", "011"]);
        let tree = build(&m, m.character_labels()).unwrap();
        assert_eq!(tree.to_newick(), "((:C00002):C00001,(:C00003):C00002);");

        let options = BuildOptions { validate: true, ..Default::default() };
        let err = build_with(&m, m.character_labels(), &options).unwrap_err();
        assert!(matches!(err, MatrixError::Incompatible { .. }));
    }

    /// Conflicting columns outside the requested characters do not matter.
    ///
    /// ```text
    ///         C1 C2 C3
    /// s0000    1  1  0
    /// s0001    0  1  0
    /// s0002    1  0  0
    /// s0003    0  0  1
    /// ```
    #[test]
    fn test_validation_only_looks_at_requested_characters() {
        let m = normalized(&["110", "010", "100", "001"]);
        let options = BuildOptions { validate: true, ..Default::default() };

        let subset = vec!["C00003".to_string()];
        let tree = build_with(&m, &subset, &options).unwrap();
        assert_eq!(tree.to_newick(), "(:C00003);");

        let err = build_with(&m, m.character_labels(), &options).unwrap_err();
        assert!(matches!(err, MatrixError::Incompatible { .. }));
    }

    /// Every species has every character: one nested chain, as deep as the
    /// number of characters.
    #[test]
    fn test_deep_chain() {
        let n = 500;
        let row = "1".repeat(n);
        let m = normalized(&[row.as_str()]);
        let tree = build(&m, m.character_labels()).unwrap();
        assert_eq!(tree.depth(), n);
        assert_eq!(tree.label_count(), n);
        assert_eq!(tree.labels().first(), Some(&"C00001"));
    }

    #[test]
    fn test_parse_roundtrip() {
        for text in [";", "(:a);", "((:b,:c):a,(:e):d);", "(((:z):y):x,:w);"] {
            let tree = CharacterTree::parse(text).unwrap();
            assert_eq!(tree.to_newick(), text);
        }
        let tree = CharacterTree::parse("(:C0001+,:C0001-);\n").unwrap();
        assert_eq!(tree.labels(), ["C0001+", "C0001-"]);
    }

    #[test]
    fn test_parse_errors() {
        let cases = [
            ("(:a", TreeParseErrorKind::UnexpectedEnd),
            ("(:a)", TreeParseErrorKind::MissingTerminator),
            ("();", TreeParseErrorKind::UnexpectedChar(')')),
            ("(:);", TreeParseErrorKind::EmptyLabel),
            ("(:a));", TreeParseErrorKind::UnexpectedChar(')')),
            ("(:a);x", TreeParseErrorKind::TrailingInput),
            ("(a);", TreeParseErrorKind::UnexpectedChar('a')),
        ];
        for (text, kind) in cases {
            let err = CharacterTree::parse(text).unwrap_err();
            assert_eq!(err.kind, kind, "{text}");
        }
    }
}
