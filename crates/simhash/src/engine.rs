//! SimHash over padded feature matrices.
//!
//! Each (feature, n-gram size) combination yields a `hash_bits`-wide simhash
//! by majority vote over the keyed hashes of every window. Combinations are
//! placed into disjoint slots of the composite fingerprint.

use features::FeatureMatrix;
use rayon::prelude::*;

use crate::config::{FeatureKind, SimHashConfig};
use crate::fingerprint::Fingerprint;
use crate::keyed::{keyed_hash, HashBits};

/// Per-bit vote counters.
struct Votes {
    counts: Vec<i64>,
}

impl Votes {
    fn new(bits: usize) -> Self {
        Self {
            counts: vec![0; bits],
        }
    }

    fn add(&mut self, hash: &HashBits) {
        for (count, bit) in self.counts.iter_mut().zip(hash.iter().by_vals()) {
            if bit {
                *count += 1;
            } else {
                *count -= 1;
            }
        }
    }

    /// Ties resolve to 0.
    fn finish(self) -> HashBits {
        self.counts.iter().map(|&c| c > 0).collect()
    }
}

/// Simhash over windows of `n` consecutive rows.
///
/// Pass a transposed matrix to hash columns instead. Fewer than `n` rows
/// yields all zeros.
pub fn segment_simhash(matrix: &FeatureMatrix, n: usize, cfg: &SimHashConfig) -> HashBits {
    if n == 0 || matrix.rows() < n {
        return HashBits::repeat(false, cfg.hash_bits);
    }
    let mut votes = Votes::new(cfg.hash_bits);
    let mut buf = Vec::new();
    for start in 0..=matrix.rows() - n {
        buf.clear();
        matrix.write_rows(start, n, &mut buf);
        votes.add(&keyed_hash(&buf, cfg.hash_bits, cfg.seed, cfg.backend));
    }
    votes.finish()
}

/// Simhash over every `n x n` block of the matrix.
///
/// Each block's bytes are prefixed with its row offset so equal blocks at
/// different offsets hash differently. The offset is one byte and saturates
/// at 255, so blocks starting below row 255 are told apart. A matrix smaller
/// than `n` on either axis yields all zeros.
pub fn stride_simhash(matrix: &FeatureMatrix, n: usize, cfg: &SimHashConfig) -> HashBits {
    if n == 0 || matrix.rows() < n || matrix.cols() < n {
        return HashBits::repeat(false, cfg.hash_bits);
    }
    let mut votes = Votes::new(cfg.hash_bits);
    let mut buf = Vec::new();
    for row in 0..=matrix.rows() - n {
        for col in 0..=matrix.cols() - n {
            buf.clear();
            buf.push(window_index(row));
            matrix.write_block(row, col, n, &mut buf);
            votes.add(&keyed_hash(&buf, cfg.hash_bits, cfg.seed, cfg.backend));
        }
    }
    votes.finish()
}

/// Leading byte of a stride window.
fn window_index(row: usize) -> u8 {
    u8::try_from(row).unwrap_or(u8::MAX)
}

/// Simhash of one extractor over an already padded matrix.
pub fn feature_simhash(
    padded: &FeatureMatrix,
    transposed: &FeatureMatrix,
    kind: FeatureKind,
    n: usize,
    cfg: &SimHashConfig,
) -> HashBits {
    let m = if kind.transposed() { transposed } else { padded };
    if kind.is_stride() {
        stride_simhash(m, n, cfg)
    } else {
        segment_simhash(m, n, cfg)
    }
}

/// Composite fingerprint of an unpadded matrix.
///
/// The matrix is padded once per n-gram size; the simhash of
/// `(features[fi], ngram_sizes[ni])` is XORed into slot
/// [`SimHashConfig::slot`]. The result is always
/// [`SimHashConfig::total_bits`] wide. `cfg` is assumed validated.
pub fn matrix_simhash(matrix: &FeatureMatrix, cfg: &SimHashConfig) -> Fingerprint {
    let padded: Vec<(FeatureMatrix, FeatureMatrix)> = cfg
        .ngram_sizes
        .iter()
        .map(|&n| {
            let p = matrix.pad(n);
            let t = p.transpose();
            (p, t)
        })
        .collect();

    let combos: Vec<(usize, usize)> = (0..cfg.features.len())
        .flat_map(|fi| (0..cfg.ngram_sizes.len()).map(move |ni| (fi, ni)))
        .collect();

    let compute = |&(fi, ni): &(usize, usize)| {
        let (p, t) = &padded[ni];
        let part = feature_simhash(p, t, cfg.features[fi], cfg.ngram_sizes[ni], cfg);
        (cfg.slot(fi, ni), part)
    };
    let parts: Vec<(usize, HashBits)> = if cfg.use_parallel {
        combos.par_iter().map(compute).collect()
    } else {
        combos.iter().map(compute).collect()
    };

    let mut out = HashBits::repeat(false, cfg.total_bits());
    for (slot, part) in parts {
        let offset = slot * cfg.hash_bits;
        for i in part.iter_ones() {
            let flipped = !out[offset + i];
            out.set(offset + i, flipped);
        }
    }
    Fingerprint::from_bitvec(out)
}
