//! # Phoneme features (`features`)
//!
//! This crate turns tokens (a spelling plus a phoneme transcription) into 2D
//! feature matrices for the fingerprinting layer. It owns three things:
//!
//! - [`Token`]: the immutable input record, ordered and hashed by
//!   `(language, graphemes, phonemes)`.
//! - [`FeatureResolver`]: the seam through which `(language, phoneme)` is
//!   mapped to a [`FeatureVector`]. [`FeatureTable`] is the in-memory
//!   implementation, loadable from PHOIBLE-style delimited files.
//! - [`FeatureMatrix`]: one row per phoneme, with the boundary padding
//!   applied before n-gram hashing.
//!
//! ## Contract
//!
//! - A resolver is built once, before fingerprinting, and shared read-only.
//! - A phoneme missing from the table is a hard error
//!   ([`FeatureError::FeatureNotFound`]); no default vector is substituted.
//! - The reserved [`BOUNDARY_PHONEME`] resolves to a fixed sentinel vector for
//!   every language.
//!
//! ## Example
//!
//! ```
//! use features::{build_matrix, FeatureTable, FeatureVector, Token};
//!
//! let mut table = FeatureTable::new(["voice", "labial"]);
//! table.insert("eng", "b", FeatureVector::new(["+", "+"])).unwrap();
//! table.insert("eng", "a", FeatureVector::new(["+", "-"])).unwrap();
//!
//! let token = Token::new("eng", "Ba", ["b", "a"]);
//! let matrix = build_matrix(&token, &table).unwrap();
//! assert_eq!(matrix.shape(), (2, 2));
//! assert_eq!(matrix.pad(3).shape(), (4, 4));
//! ```

mod error;
pub mod matrix;
mod resolver;
mod table;
mod token;

pub use crate::error::FeatureError;
pub use crate::matrix::{
    build_matrix, feature_profile, FeatureMatrix, PAD_END, PAD_LEADING, PAD_START, PAD_TRAILING,
};
pub use crate::resolver::{FeatureResolver, FeatureVector, BOUNDARY_PHONEME, BOUNDARY_VALUE};
pub use crate::table::{FeatureTable, TableLayout};
pub use crate::token::Token;
