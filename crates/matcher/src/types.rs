use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use features::Token;
use serde::{Deserialize, Serialize};
use simhash::{Fingerprint, SimHashError};
use thiserror::Error;

use crate::report::format_score;

/// Configuration for rotation-banded candidate generation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CandidateConfig {
    /// Number of consecutive sorted entries compared pairwise per band.
    /// Clamped to the corpus size when larger.
    #[serde(default = "CandidateConfig::default_window")]
    pub window: usize,
    /// Rotation bands to sweep. `None` sweeps one band per fingerprint bit;
    /// values above the fingerprint width are clamped to it.
    #[serde(default)]
    pub bands: Option<usize>,
    /// Scan bands on the rayon pool.
    #[serde(default)]
    pub use_parallel: bool,
}

impl CandidateConfig {
    pub(crate) fn default_window() -> usize {
        10
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    pub fn with_bands(mut self, bands: Option<usize>) -> Self {
        self.bands = bands;
        self
    }

    pub fn with_parallel(mut self, use_parallel: bool) -> Self {
        self.use_parallel = use_parallel;
        self
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        if self.window < 2 {
            return Err(MatchError::InvalidWindow {
                window: self.window,
            });
        }
        if self.bands == Some(0) {
            return Err(MatchError::InvalidConfig(
                "bands must be greater than zero when set".into(),
            ));
        }
        Ok(())
    }
}

impl Default for CandidateConfig {
    fn default() -> Self {
        Self {
            window: Self::default_window(),
            bands: None,
            use_parallel: false,
        }
    }
}

/// A token with its fingerprint, as fed to the candidate generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub token: Token,
    pub fingerprint: Fingerprint,
}

impl Entry {
    pub fn new(token: Token, fingerprint: Fingerprint) -> Self {
        Self { token, fingerprint }
    }
}

/// Unordered pair of distinct tokens with the Hamming distance of their
/// fingerprints. `a` always orders before `b`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CandidatePair {
    pub difference: u32,
    pub a: Token,
    pub b: Token,
}

impl CandidatePair {
    /// Build a pair, placing the smaller token first.
    pub fn new(x: Token, y: Token, difference: u32) -> Self {
        if x <= y {
            Self { difference, a: x, b: y }
        } else {
            Self { difference, a: y, b: x }
        }
    }
}

/// A scored pair ready for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonRecord {
    pub a: Token,
    pub b: Token,
    /// Differing fingerprint bits.
    pub difference: u32,
    /// Fingerprint width the difference was measured over.
    pub total_bits: usize,
}

impl ComparisonRecord {
    pub fn from_pair(pair: CandidatePair, total_bits: usize) -> Self {
        Self {
            a: pair.a,
            b: pair.b,
            difference: pair.difference,
            total_bits,
        }
    }

    /// `1 - difference / total_bits`.
    pub fn similarity(&self) -> f64 {
        if self.total_bits == 0 {
            return 0.0;
        }
        1.0 - f64::from(self.difference) / self.total_bits as f64
    }

    /// Similarity rounded to `precision` significant digits, e.g. `1.0`, `0.969`.
    pub fn similarity_score(&self, precision: usize) -> String {
        format_score(self.similarity(), precision)
    }
}

/// Shared flag polled between bands; setting it stops a sweep early.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Errors produced by candidate generation and reporting.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatchError {
    #[error("invalid candidate config: window must be >= 2 (got {window})")]
    InvalidWindow { window: usize },

    #[error("invalid candidate config: {0}")]
    InvalidConfig(String),

    #[error("fingerprint width mismatch: expected {expected} bits, found {found}")]
    WidthMismatch { expected: usize, found: usize },

    #[error("distance error: {0}")]
    Distance(#[from] SimHashError),

    #[error("cancelled after {completed_bands} of {total_bands} bands")]
    Cancelled {
        completed_bands: usize,
        total_bands: usize,
    },

    #[error("report write failed: {0}")]
    Io(String),
}

impl From<csv::Error> for MatchError {
    fn from(value: csv::Error) -> Self {
        MatchError::Io(value.to_string())
    }
}

impl From<std::io::Error> for MatchError {
    fn from(value: std::io::Error) -> Self {
        MatchError::Io(value.to_string())
    }
}
