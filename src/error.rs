//! Error types for matrix construction, tree building and tree-text parsing.

use thiserror::Error;

/// Errors raised while building or querying a [`CharacterMatrix`](crate::matrix::CharacterMatrix)
/// and while reconstructing a tree from it.
#[derive(Debug, Error)]
pub enum MatrixError {
    /// No species rows were supplied.
    #[error("matrix has no species rows")]
    Empty,

    /// Rows are present but hold zero characters.
    #[error("matrix rows contain no characters")]
    NoCharacters,

    /// A row's length differs from the first row's.
    #[error("row {row} has {found} characters, expected {expected}")]
    RaggedRow { row: usize, expected: usize, found: usize },

    /// A row holds something other than '0' or '1'.
    #[error("row {row}, column {column}: invalid symbol {symbol:?}")]
    InvalidSymbol { row: usize, column: usize, symbol: char },

    /// The `#` header names a different number of characters than the rows hold.
    #[error("header declares {declared} character names but rows have {columns} columns")]
    HeaderMismatch { declared: usize, columns: usize },

    /// A `<species> <characters>` line disagrees with the rows that follow.
    #[error("declared {declared_species}x{declared_characters} matrix but found {species}x{characters}")]
    DimensionMismatch {
        declared_species: usize,
        declared_characters: usize,
        species: usize,
        characters: usize,
    },

    /// A column bit-string's length differs from the species count.
    #[error("column {label:?} has {found} species, expected {expected}")]
    RaggedColumn { label: String, expected: usize, found: usize },

    /// Two columns ended up with the same label.
    #[error("duplicate character label {0:?}")]
    DuplicateLabel(String),

    /// A character name that is empty or holds a tree delimiter (`(`, `)`, `,`, `:`, `;`).
    #[error("invalid character label {0:?}")]
    InvalidLabel(String),

    /// A label that is not a column of the matrix.
    #[error("unknown character {0:?}")]
    UnknownCharacter(String),

    /// Tree construction met a character that no species possesses.
    #[error("character {0:?} is possessed by no species; remove null columns first")]
    NullCharacter(String),

    /// The character classes do not form a partition, so no perfect phylogeny exists.
    #[error("matrix admits no perfect phylogeny: {reason}")]
    Incompatible { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MatrixError {
    /// Whether the error stems from malformed input text or structure.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            MatrixError::Empty
                | MatrixError::NoCharacters
                | MatrixError::RaggedRow { .. }
                | MatrixError::InvalidSymbol { .. }
                | MatrixError::HeaderMismatch { .. }
                | MatrixError::DimensionMismatch { .. }
                | MatrixError::RaggedColumn { .. }
                | MatrixError::DuplicateLabel(_)
                | MatrixError::InvalidLabel(_)
        )
    }

    /// Creates an incompatibility error.
    pub fn incompatible(reason: impl Into<String>) -> Self {
        Self::Incompatible { reason: reason.into() }
    }
}

/// What went wrong while reading tree text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeParseErrorKind {
    UnexpectedEnd,
    UnexpectedChar(char),
    MissingTerminator,
    TrailingInput,
    EmptyLabel,
}

impl std::fmt::Display for TreeParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TreeParseErrorKind::UnexpectedEnd => write!(f, "unexpected end of input"),
            TreeParseErrorKind::UnexpectedChar(c) => write!(f, "unexpected character {c:?}"),
            TreeParseErrorKind::MissingTerminator => write!(f, "missing ';' terminator"),
            TreeParseErrorKind::TrailingInput => write!(f, "input continues after ';'"),
            TreeParseErrorKind::EmptyLabel => write!(f, "empty character label"),
        }
    }
}

/// Error raised by [`CharacterTree::parse`](crate::tree::CharacterTree::parse).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("tree text, byte {position}: {kind}")]
pub struct TreeParseError {
    pub position: usize,
    pub kind: TreeParseErrorKind,
}
