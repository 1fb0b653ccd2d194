//! Text boundary: reading matrix files and writing tree text.
//!
//! `-` stands for stdin or stdout, and paths ending in `.gz` are read and
//! written through gzip.

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::debug;

use crate::error::MatrixError;
use crate::matrix::{CharacterMatrix, LabelScheme};

/// Parse matrix text into a [`CharacterMatrix`].
///
/// Two layouts are accepted:
/// - rows of '0'/'1', optionally preceded by a `#name,name;name` header line;
/// - a `<species> <characters>` line followed by the rows, whose symbols may be
///   separated by spaces (the layout used by the external solver).
///
/// Blank lines and trailing whitespace are ignored.
pub fn parse_matrix(text: &str, scheme: LabelScheme) -> Result<CharacterMatrix, MatrixError> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect();

    match lines.first().and_then(|first| parse_dimensions(first)) {
        Some((species, characters)) => {
            let rows: Vec<String> = lines[1..]
                .iter()
                .map(|line| line.split_whitespace().collect())
                .collect();
            let found = rows.first().map_or(0, |r| r.chars().count());
            if rows.len() != species || found != characters {
                return Err(MatrixError::DimensionMismatch {
                    declared_species: species,
                    declared_characters: characters,
                    species: rows.len(),
                    characters: found,
                });
            }
            debug!(species, characters, "parsing dimensioned matrix");
            CharacterMatrix::from_rows_with_scheme(&rows, scheme)
        }
        None => CharacterMatrix::from_rows_with_scheme(&lines, scheme),
    }
}

/// `Some((n, m))` when the line is exactly two unsigned integers.
fn parse_dimensions(line: &str) -> Option<(usize, usize)> {
    let mut parts = line.split_whitespace();
    let species = parts.next()?.parse().ok()?;
    let characters = parts.next()?.parse().ok()?;
    parts.next().is_none().then_some((species, characters))
}

/// Read and parse a matrix file.
/// If `path` ends with `.gz`, the input is gzip-decompressed.
/// If `path` equals `-`, the matrix is read from stdin.
pub fn read_matrix<P: AsRef<Path>>(path: P, scheme: LabelScheme) -> Result<CharacterMatrix, MatrixError> {
    let p = path.as_ref();
    let mut text = String::new();

    if p.as_os_str() == "-" {
        io::stdin().read_to_string(&mut text)?;
    } else if p.to_string_lossy().ends_with(".gz") {
        GzDecoder::new(File::open(p)?).read_to_string(&mut text)?;
    } else {
        File::open(p)?.read_to_string(&mut text)?;
    }

    parse_matrix(&text, scheme)
}

/// Drop the null columns, then sort the rest into decreasing column order.
pub fn normalize(matrix: &mut CharacterMatrix) {
    matrix.remove_null_columns();
    matrix.sort_columns();
}

/// Write tree text as a single line to a file or stdout.
/// If `path` ends with `.gz`, the output is gzip-compressed.
/// If `path` equals `-`, the tree is written to stdout (uncompressed).
pub fn write_tree<P: AsRef<Path>>(path: P, newick: &str) -> io::Result<()> {
    let p = path.as_ref();

    let mut out: Box<dyn Write> = if p.as_os_str() == "-" {
        Box::new(BufWriter::new(io::stdout().lock()))
    } else if p.to_string_lossy().ends_with(".gz") {
        let f = File::create(p)?;
        let enc = GzEncoder::new(f, Compression::default());
        Box::new(BufWriter::new(enc))
    } else {
        Box::new(BufWriter::new(File::create(p)?))
    };

    writeln!(&mut out, "{newick}")?;
    out.flush()?;
    Ok(())
}
