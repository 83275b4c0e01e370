//! Immutable 2D feature matrices and the padding applied before n-gram hashing.
//!
//! A [`FeatureMatrix`] stacks one [`FeatureVector`] per phoneme. It is a value
//! type: its structural digest is computed once at construction, so matrices
//! can be used directly as cache keys.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use xxhash_rust::xxh3::xxh3_64;

use crate::error::FeatureError;
use crate::resolver::{FeatureResolver, FeatureVector};
use crate::token::Token;

/// Fill value of rows prepended before the first phoneme.
pub const PAD_START: &str = "^";
/// Fill value of rows appended after the last phoneme.
pub const PAD_END: &str = "$";
/// Fill value of columns prepended before the first feature.
pub const PAD_LEADING: &str = "&";
/// Fill value of columns appended after the last feature.
pub const PAD_TRAILING: &str = "%";

/// Separator written after every cell when a window is serialized to bytes.
const CELL_SEPARATOR: u8 = 0x1F;

/// Row-major matrix of categorical feature values.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    rows: usize,
    cols: usize,
    cells: Arc<[String]>,
    digest: u64,
}

impl FeatureMatrix {
    /// Stack feature vectors into a matrix. All vectors must have equal width.
    pub fn from_rows<I>(rows: I) -> Result<Self, FeatureError>
    where
        I: IntoIterator<Item = FeatureVector>,
    {
        let mut cells = Vec::new();
        let mut width = None;
        let mut count = 0usize;
        for row in rows {
            match width {
                None => width = Some(row.len()),
                Some(expected) if expected != row.len() => {
                    return Err(FeatureError::RaggedRows {
                        expected,
                        found: row.len(),
                    });
                }
                Some(_) => {}
            }
            cells.extend(row.values().iter().cloned());
            count += 1;
        }
        Ok(Self::from_cells(count, width.unwrap_or(0), cells))
    }

    fn from_cells(rows: usize, cols: usize, cells: Vec<String>) -> Self {
        debug_assert_eq!(rows * cols, cells.len());
        let mut buf = Vec::with_capacity(16 + cells.len() * 4);
        buf.extend_from_slice(&(rows as u64).to_le_bytes());
        buf.extend_from_slice(&(cols as u64).to_le_bytes());
        for cell in &cells {
            push_cell(&mut buf, cell);
        }
        Self {
            rows,
            cols,
            cells: cells.into(),
            digest: xxh3_64(&buf),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    /// Structural digest over shape and contents.
    pub fn digest(&self) -> u64 {
        self.digest
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        if row < self.rows && col < self.cols {
            Some(&self.cells[row * self.cols + col])
        } else {
            None
        }
    }

    pub fn row(&self, row: usize) -> Option<&[String]> {
        (row < self.rows).then(|| &self.cells[row * self.cols..(row + 1) * self.cols])
    }

    /// Swap rows and columns.
    pub fn transpose(&self) -> Self {
        let mut cells = Vec::with_capacity(self.cells.len());
        for c in 0..self.cols {
            for r in 0..self.rows {
                cells.push(self.cells[r * self.cols + c].clone());
            }
        }
        Self::from_cells(self.cols, self.rows, cells)
    }

    /// Pad for n-gram size `n`.
    ///
    /// `n / 2` rows of [`PAD_START`] go before the first row and `n / 2` rows
    /// of [`PAD_END`] after the last; then `n / 2` columns of [`PAD_LEADING`]
    /// and [`PAD_TRAILING`] wrap every (including padded) row. For `n < 2`
    /// the matrix is returned unchanged.
    pub fn pad(&self, n: usize) -> Self {
        let depth = n / 2;
        if depth == 0 {
            return self.clone();
        }
        let rows = self.rows + 2 * depth;
        let cols = self.cols + 2 * depth;
        let mut cells = Vec::with_capacity(rows * cols);

        let mut push_row = |inner: &mut dyn Iterator<Item = String>| {
            cells.extend(std::iter::repeat(PAD_LEADING.to_string()).take(depth));
            cells.extend(inner);
            cells.extend(std::iter::repeat(PAD_TRAILING.to_string()).take(depth));
        };
        for _ in 0..depth {
            push_row(&mut std::iter::repeat(PAD_START.to_string()).take(self.cols));
        }
        for r in 0..self.rows {
            push_row(&mut self.cells[r * self.cols..(r + 1) * self.cols].iter().cloned());
        }
        for _ in 0..depth {
            push_row(&mut std::iter::repeat(PAD_END.to_string()).take(self.cols));
        }

        Self::from_cells(rows, cols, cells)
    }

    /// Serialize rows `start..start + len` into `out`, row-major.
    pub fn write_rows(&self, start: usize, len: usize, out: &mut Vec<u8>) {
        for cell in &self.cells[start * self.cols..(start + len) * self.cols] {
            push_cell(out, cell);
        }
    }

    /// Serialize the `size x size` block whose top-left corner is
    /// `(row, col)` into `out`, row-major.
    pub fn write_block(&self, row: usize, col: usize, size: usize, out: &mut Vec<u8>) {
        for r in row..row + size {
            let base = r * self.cols;
            for cell in &self.cells[base + col..base + col + size] {
                push_cell(out, cell);
            }
        }
    }
}

fn push_cell(out: &mut Vec<u8>, cell: &str) {
    out.extend_from_slice(cell.as_bytes());
    out.push(CELL_SEPARATOR);
}

impl PartialEq for FeatureMatrix {
    fn eq(&self, other: &Self) -> bool {
        self.digest == other.digest
            && self.rows == other.rows
            && self.cols == other.cols
            && self.cells == other.cells
    }
}

impl Eq for FeatureMatrix {}

impl Hash for FeatureMatrix {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.digest);
    }
}

/// Resolve every phoneme of `token` and stack the vectors, one row per phoneme.
///
/// The first unresolved phoneme aborts the build; no default vector is ever
/// substituted.
pub fn build_matrix<R>(token: &Token, resolver: &R) -> Result<FeatureMatrix, FeatureError>
where
    R: FeatureResolver + ?Sized,
{
    if token.phonemes.is_empty() {
        return Err(FeatureError::EmptyToken {
            language: token.language.clone(),
            graphemes: token.graphemes.clone(),
        });
    }
    let rows = token
        .phonemes
        .iter()
        .map(|p| resolver.resolve(&token.language, p))
        .collect::<Result<Vec<_>, _>>()?;
    FeatureMatrix::from_rows(rows)
}

/// Feature-by-phoneme view of a token for inspection: one entry per feature
/// name holding that feature's value at every phoneme position.
pub fn feature_profile<R>(
    token: &Token,
    resolver: &R,
    feature_names: &[String],
) -> Result<Vec<(String, Vec<String>)>, FeatureError>
where
    R: FeatureResolver + ?Sized,
{
    let matrix = build_matrix(token, resolver)?;
    let columns = matrix.transpose();
    Ok((0..columns.rows())
        .map(|c| {
            let name = feature_names
                .get(c)
                .cloned()
                .unwrap_or_else(|| format!("feature_{c}"));
            let values = columns.row(c).map(<[String]>::to_vec).unwrap_or_default();
            (name, values)
        })
        .collect())
}
