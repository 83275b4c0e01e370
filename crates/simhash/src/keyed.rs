//! Arbitrary-width keyed hashing.
//!
//! A `bits`-wide hash is assembled from passes of a fixed-width backend hash:
//! pass `p` uses seed `seed + p` and lands at bit offset `p * backend_width`.
//! Passes are added until at least `bits` bits are covered; if the assembled
//! value has more significant bits than requested, it is shifted right until
//! exactly `bits` remain.

use bitvec::prelude::*;
use sha2::{Digest, Sha256};
use xxhash_rust::xxh3::{xxh3_128_with_seed, xxh3_64_with_seed};

use crate::config::HashBackend;

/// Bits of a wide hash, least significant first.
pub type HashBits = BitVec<u64, Lsb0>;

/// Hash `bytes` to exactly `bits` bits.
///
/// Pure and deterministic in `(bytes, bits, seed, backend)`.
pub fn keyed_hash(bytes: &[u8], bits: usize, seed: u64, backend: HashBackend) -> HashBits {
    if bits == 0 {
        return HashBits::new();
    }
    let passes = bits.div_ceil(backend.width());
    let mut words = Vec::with_capacity(passes * backend.width() / 64);
    for pass in 0..passes {
        push_pass(bytes, seed.wrapping_add(pass as u64), backend, &mut words);
    }

    let full = HashBits::from_vec(words);
    let bit_length = full.last_one().map_or(0, |i| i + 1);
    let shift = bit_length.saturating_sub(bits);
    HashBits::from_bitslice(&full[shift..shift + bits])
}

/// Append one backend pass as little-endian 64-bit limbs.
fn push_pass(bytes: &[u8], seed: u64, backend: HashBackend, out: &mut Vec<u64>) {
    match backend {
        HashBackend::Xxh3_128 => {
            let h = xxh3_128_with_seed(bytes, seed);
            out.push(h as u64);
            out.push((h >> 64) as u64);
        }
        HashBackend::Xxh3_64 => out.push(xxh3_64_with_seed(bytes, seed)),
        HashBackend::Sha256 => {
            let mut hasher = Sha256::new();
            hasher.update(seed.to_le_bytes());
            hasher.update(bytes);
            let digest = hasher.finalize();
            // Digest is read as a big-endian integer; emit its low limb first.
            for chunk in digest.rchunks_exact(8) {
                let mut limb = [0u8; 8];
                limb.copy_from_slice(chunk);
                out.push(u64::from_be_bytes(limb));
            }
        }
    }
}
