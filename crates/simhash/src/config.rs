//! Configuration and error types for phoneme-matrix SimHash fingerprinting.
//!
//! The configuration is immutable for the duration of a run: fingerprints
//! computed under one configuration are only comparable with fingerprints
//! computed under an identical one.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest accepted n-gram size. Padding grows with `n`, and windows wider
/// than a short word only repeat padding.
pub const MAX_NGRAM_SIZE: usize = 16;

/// Largest accepted per-feature hash width in bits.
pub const MAX_HASH_BITS: usize = 1 << 16;

/// Feature extractor applied to a padded matrix.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    /// `n x n` sliding blocks over the matrix.
    Stride,
    /// `n x n` sliding blocks over the transposed matrix.
    StrideTransposed,
    /// `n` consecutive phoneme rows (sequence order).
    Rows,
    /// `n` consecutive feature columns.
    Columns,
}

impl FeatureKind {
    pub const ALL: [FeatureKind; 4] = [
        FeatureKind::Stride,
        FeatureKind::StrideTransposed,
        FeatureKind::Rows,
        FeatureKind::Columns,
    ];

    /// Whether the extractor runs over the transposed matrix.
    pub fn transposed(self) -> bool {
        matches!(self, FeatureKind::StrideTransposed | FeatureKind::Columns)
    }

    /// Whether the extractor uses 2D blocks rather than 1D segments.
    pub fn is_stride(self) -> bool {
        matches!(self, FeatureKind::Stride | FeatureKind::StrideTransposed)
    }

    pub fn name(self) -> &'static str {
        match self {
            FeatureKind::Stride => "stride",
            FeatureKind::StrideTransposed => "stride_transposed",
            FeatureKind::Rows => "rows",
            FeatureKind::Columns => "columns",
        }
    }
}

/// Underlying fixed-width keyed hash that wide hashes are assembled from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum HashBackend {
    /// XXH3, 128-bit output.
    #[default]
    Xxh3_128,
    /// XXH3, 64-bit output.
    Xxh3_64,
    /// SHA-256 over `seed || bytes`.
    Sha256,
}

impl HashBackend {
    /// Output width of one pass, in bits.
    pub fn width(self) -> usize {
        match self {
            HashBackend::Xxh3_128 => 128,
            HashBackend::Xxh3_64 => 64,
            HashBackend::Sha256 => 256,
        }
    }
}

/// Configuration for the SimHash engine.
///
/// Missing fields deserialize to their [`Default`] values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimHashConfig {
    /// Configuration schema version.
    ///
    /// Bump on any change that can alter fingerprints.
    pub version: u32,
    /// Width in bits of the SimHash computed per (feature, n-gram size).
    pub hash_bits: usize,
    /// N-gram sizes; each gets its own bit slot per feature.
    pub ngram_sizes: Vec<usize>,
    /// Feature extractors, in slot order.
    pub features: Vec<FeatureKind>,
    /// Seed perturbing every hash pass.
    pub seed: u64,
    /// Keyed hash used for window hashes.
    pub backend: HashBackend,
    /// Compute (feature, n) combinations in parallel.
    pub use_parallel: bool,
    /// Number of fingerprints kept in the LRU cache; 0 disables caching.
    pub cache_capacity: usize,
}

impl SimHashConfig {
    pub fn new() -> Self {
        Self::default()
    }

    fn default_cache_capacity() -> usize {
        1 << 16
    }

    /// Set the per-feature hash width in bits. Typical values: 64, 128, 256.
    pub fn with_hash_bits(mut self, hash_bits: usize) -> Self {
        self.hash_bits = hash_bits;
        self
    }

    /// Set the n-gram sizes. Odd sizes center each window on a phoneme.
    pub fn with_ngram_sizes(mut self, sizes: impl Into<Vec<usize>>) -> Self {
        self.ngram_sizes = sizes.into();
        self
    }

    pub fn with_features(mut self, features: impl Into<Vec<FeatureKind>>) -> Self {
        self.features = features.into();
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_backend(mut self, backend: HashBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_parallel(mut self, use_parallel: bool) -> Self {
        self.use_parallel = use_parallel;
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Total fingerprint width: `hash_bits x features x ngram_sizes`.
    ///
    /// Only meaningful on a validated config; saturates on overflow.
    pub fn total_bits(&self) -> usize {
        self.hash_bits
            .saturating_mul(self.features.len())
            .saturating_mul(self.ngram_sizes.len())
    }

    /// Bit slot of a (feature index, n-gram index) combination. Slot `s`
    /// occupies bits `s * hash_bits .. (s + 1) * hash_bits`.
    pub fn slot(&self, feature_idx: usize, ngram_idx: usize) -> usize {
        feature_idx * self.ngram_sizes.len() + ngram_idx
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), SimHashError> {
        if self.version < 1 {
            return Err(SimHashError::InvalidConfigVersion {
                version: self.version,
            });
        }
        if self.hash_bits == 0 || self.hash_bits > MAX_HASH_BITS {
            return Err(SimHashError::InvalidConfigBits {
                bits: self.hash_bits,
            });
        }
        if self.ngram_sizes.is_empty() {
            return Err(SimHashError::InvalidConfigNgrams(
                "at least one n-gram size is required".into(),
            ));
        }
        for (i, &n) in self.ngram_sizes.iter().enumerate() {
            if n == 0 || n > MAX_NGRAM_SIZE {
                return Err(SimHashError::InvalidConfigNgramSize { n });
            }
            if self.ngram_sizes[..i].contains(&n) {
                return Err(SimHashError::InvalidConfigNgrams(format!(
                    "n-gram size {n} listed twice"
                )));
            }
        }
        if self.features.is_empty() {
            return Err(SimHashError::InvalidConfigFeatures(
                "at least one feature extractor is required".into(),
            ));
        }
        for (i, kind) in self.features.iter().enumerate() {
            if self.features[..i].contains(kind) {
                return Err(SimHashError::InvalidConfigFeatures(format!(
                    "feature {} listed twice",
                    kind.name()
                )));
            }
        }
        self.hash_bits
            .checked_mul(self.features.len())
            .and_then(|b| b.checked_mul(self.ngram_sizes.len()))
            .ok_or(SimHashError::InvalidConfigWidth {
                bits: self.hash_bits,
                slots: self.features.len().saturating_mul(self.ngram_sizes.len()),
            })?;
        Ok(())
    }
}

impl Default for SimHashConfig {
    fn default() -> Self {
        Self {
            version: 1,
            hash_bits: 128,
            ngram_sizes: vec![3, 5, 7],
            features: FeatureKind::ALL.to_vec(),
            seed: 0,
            backend: HashBackend::default(),
            use_parallel: false,
            cache_capacity: Self::default_cache_capacity(),
        }
    }
}

/// Errors returned by the SimHash layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimHashError {
    #[error("invalid config version {version}; expected >= 1")]
    InvalidConfigVersion { version: u32 },

    #[error("invalid config: hash_bits must be in 1..=65536 (got {bits})")]
    InvalidConfigBits { bits: usize },

    #[error("invalid config: n-gram size must be in 1..=16 (got {n})")]
    InvalidConfigNgramSize { n: usize },

    #[error("invalid config: {0}")]
    InvalidConfigNgrams(String),

    #[error("invalid config: {0}")]
    InvalidConfigFeatures(String),

    #[error("invalid config: fingerprint width overflows for hash_bits={bits} slots={slots}")]
    InvalidConfigWidth { bits: usize, slots: usize },

    #[error("cannot compute a bitwise difference between two zero-width fingerprints")]
    DegenerateDistance,
}
