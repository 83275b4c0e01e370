//! # Phoneme-matrix SimHash (`simhash`)
//!
//! Turns a [`FeatureMatrix`] into a fixed-width [`Fingerprint`] whose Hamming
//! distance to another fingerprint approximates how different the two
//! underlying phoneme sequences are.
//!
//! ## Pipeline
//!
//! 1.  **Padding**: for every configured n-gram size `n`, the matrix is
//!     wrapped in `n / 2` rows and columns of boundary sentinels so every
//!     real phoneme sits in a full window.
//! 2.  **Extraction**: four extractors read windows from the padded matrix:
//!     row n-grams, column n-grams, and `n x n` blocks over the matrix and
//!     its transpose. Every window is hashed with a wide keyed hash.
//! 3.  **Voting**: per extractor and n-gram size, bit `j` is set iff more
//!     windows had bit `j` set than clear.
//! 4.  **Composition**: each `(feature, n)` result is XORed into its own
//!     disjoint slot, so the fingerprint is
//!     `hash_bits x features x ngram_sizes` bits wide.
//!
//! Invariant: for the same matrix and the same [`SimHashConfig`], the
//! fingerprint is bit identical. Fingerprints from different configurations
//! are not comparable.
//!
//! ## Example
//!
//! ```
//! use features::{FeatureMatrix, FeatureVector};
//! use simhash::{SimHashConfig, SimHasher};
//!
//! let matrix = FeatureMatrix::from_rows([
//!     FeatureVector::new(["+", "-"]),
//!     FeatureVector::new(["-", "-"]),
//! ])
//! .unwrap();
//!
//! let hasher = SimHasher::new(SimHashConfig::new().with_hash_bits(64)).unwrap();
//! let a = hasher.fingerprint(&matrix);
//! assert_eq!(a.width(), hasher.total_bits());
//! assert_eq!(a.hamming_distance(&hasher.fingerprint(&matrix)).unwrap(), 0);
//! ```

mod cache;
pub mod config;
pub mod engine;
mod fingerprint;
mod keyed;

use features::FeatureMatrix;
use tracing::debug;

pub use crate::cache::{CacheStats, ContentCache};
pub use crate::config::{
    FeatureKind, HashBackend, SimHashConfig, SimHashError, MAX_HASH_BITS, MAX_NGRAM_SIZE,
};
pub use crate::engine::matrix_simhash;
pub use crate::fingerprint::{hamming_distance, rotate, Fingerprint};
pub use crate::keyed::{keyed_hash, HashBits};

/// Validate `cfg` and fingerprint a single matrix without caching.
pub fn simhash_matrix(
    matrix: &FeatureMatrix,
    cfg: &SimHashConfig,
) -> Result<Fingerprint, SimHashError> {
    cfg.validate()?;
    Ok(matrix_simhash(matrix, cfg))
}

/// Fingerprinter bound to one validated configuration, memoizing results by
/// matrix content.
pub struct SimHasher {
    cfg: SimHashConfig,
    cache: ContentCache<FeatureMatrix, Fingerprint>,
}

impl SimHasher {
    pub fn new(cfg: SimHashConfig) -> Result<Self, SimHashError> {
        cfg.validate()?;
        debug!(
            hash_bits = cfg.hash_bits,
            ngram_sizes = ?cfg.ngram_sizes,
            features = cfg.features.len(),
            total_bits = cfg.total_bits(),
            backend = ?cfg.backend,
            cache_capacity = cfg.cache_capacity,
            "simhasher_ready"
        );
        Ok(Self {
            cache: ContentCache::new(cfg.cache_capacity),
            cfg,
        })
    }

    pub fn config(&self) -> &SimHashConfig {
        &self.cfg
    }

    /// Width of every fingerprint this hasher produces.
    pub fn total_bits(&self) -> usize {
        self.cfg.total_bits()
    }

    pub fn fingerprint(&self, matrix: &FeatureMatrix) -> Fingerprint {
        self.cache
            .get_or_insert_with(matrix.clone(), || matrix_simhash(matrix, &self.cfg))
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
