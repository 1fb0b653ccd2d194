//! Crate root: lightweight module orchestration and public re-exports.
//!
//! Modules:
//! - `bitset`: compact bitset representation for matrix columns.
//! - `matrix`: labelled binary character matrix, normalization and queries.
//! - `partition`: maximal characters and connected character classes.
//! - `tree`: recursive tree reconstruction and its Newick-like text form.
//! - `io`: reading matrix files and writing tree text.
//! - `error`: error types shared by the modules above.
//! - `api`: Python bindings via `pyo3` (gated behind "python" feature).
//!
//! Typical use: parse, normalize, build.
//!
//! ```
//! use perfect_phylogeny::{io, tree};
//! use perfect_phylogeny::matrix::LabelScheme;
//!
//! let mut m = io::parse_matrix("110\n100\n001\n", LabelScheme::Plain).unwrap();
//! io::normalize(&mut m);
//! let text = tree::build_newick(&m, &tree::BuildOptions::default()).unwrap();
//! assert_eq!(text, "((:C00002):C00001,:C00003);");
//! ```

pub mod bitset;
pub mod error;
pub mod io;
pub mod matrix;
pub mod partition;
pub mod tree;

#[cfg(feature = "python")]
pub mod api;

// Re-export frequently used types & functions
pub use bitset::Bitset;
pub use error::{MatrixError, TreeParseError};
pub use io::{normalize, parse_matrix, read_matrix, write_tree};
pub use matrix::{CharacterMatrix, LabelScheme};
pub use partition::{find_maximal, partition};
pub use tree::{build, build_with, BuildOptions, CharacterTree};
