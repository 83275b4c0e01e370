//! # Phonetic candidate matching (`matcher`)
//!
//! ## Purpose
//!
//! `matcher` finds pairs of tokens whose fingerprints are close in Hamming
//! distance without scoring every pair. It runs a rotation-banding LSH sweep:
//! for each band the fingerprints are rotated by a common amount and sorted,
//! and only entries that land within a small window of each other are
//! compared.
//!
//! Fingerprints are produced upstream by `simhash`; this crate never looks at
//! feature matrices.
//!
//! ## Core Types
//!
//! - [`CandidateConfig`]: window size, band count and parallelism.
//! - [`Entry`]: a token with its fingerprint.
//! - [`CandidateGenerator`]: the sweep, in full or query mode.
//! - [`ComparisonRecord`]: a scored pair with its similarity score.
//! - [`write_tsv`]: the tab-separated report.
//!
//! ## Guarantees
//!
//! - Each unordered pair of distinct tokens is scored at most once, with the
//!   distance of the unrotated fingerprints.
//! - Output is sorted ascending by difference, then by token order, and is
//!   identical whether bands run sequentially or in parallel.
//! - With `window >= entries` and all bands, every pair is found.
//! - Results are approximate otherwise: a close pair that never lands in a
//!   shared window is missed. A difference of 0 can also arise from a hash
//!   collision between distinct inputs at small widths.
//!
//! ## Example
//!
//! ```
//! use features::Token;
//! use matcher::{compare, CandidateConfig, Entry};
//! use simhash::Fingerprint;
//!
//! let entries = vec![
//!     Entry::new(Token::new("eng", "Bat", ["b", "a", "t"]), Fingerprint::from_u128(0b1010, 8)),
//!     Entry::new(Token::new("eng", "Pat", ["p", "a", "t"]), Fingerprint::from_u128(0b1011, 8)),
//! ];
//! let records = compare(&entries, &CandidateConfig::default()).unwrap();
//! assert_eq!(records.len(), 1);
//! assert_eq!(records[0].difference, 1);
//! assert_eq!(records[0].similarity_score(3), "0.875");
//! ```

mod candidates;
mod report;
mod types;

pub use crate::candidates::{compare, search, CandidateGenerator};
pub use crate::report::{format_score, write_tsv, REPORT_HEADERS};
pub use crate::types::{
    CancelFlag, CandidateConfig, CandidatePair, ComparisonRecord, Entry, MatchError,
};
