//! Fixed-width fingerprints with circular rotation and Hamming distance.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use bitvec::prelude::*;

use crate::config::SimHashError;
use crate::keyed::HashBits;

const HEX: &[u8; 16] = b"0123456789abcdef";

/// Non-negative integer of a declared bit width.
///
/// Bit `i` of [`Fingerprint::as_bitslice`] is the coefficient of `2^i`.
/// Ordering is numeric; equal values of different widths order by width.
#[derive(Clone)]
pub struct Fingerprint {
    bits: HashBits,
}

impl Fingerprint {
    /// Wrap raw bits; the width is `bits.len()`.
    pub fn from_bitvec(mut bits: HashBits) -> Self {
        bits.force_align();
        bits.set_uninitialized(false);
        Self { bits }
    }

    /// All-zero value of the given width.
    pub fn zero(width: usize) -> Self {
        Self::from_bitvec(HashBits::repeat(false, width))
    }

    /// Low `width` bits of `value`.
    pub fn from_u128(value: u128, width: usize) -> Self {
        Self::from_bitvec((0..width).map(|i| i < 128 && (value >> i) & 1 == 1).collect())
    }

    /// Declared width in bits.
    pub fn width(&self) -> usize {
        self.bits.len()
    }

    /// Position of the highest set bit plus one; 0 for a zero value.
    pub fn bit_length(&self) -> usize {
        self.bits.last_one().map_or(0, |i| i + 1)
    }

    pub fn count_ones(&self) -> usize {
        self.bits.count_ones()
    }

    /// Bit `i`, or `false` past the declared width.
    pub fn bit(&self, i: usize) -> bool {
        self.bits.get(i).is_some_and(|b| *b)
    }

    pub fn as_bitslice(&self) -> &BitSlice<u64, Lsb0> {
        &self.bits
    }

    /// Lowercase hex, most significant digit first, zero-padded to the width.
    pub fn to_hex(&self) -> String {
        let digits = self.width().div_ceil(4).max(1);
        let mut out = String::with_capacity(digits);
        for d in (0..digits).rev() {
            let mut nibble = 0usize;
            for b in 0..4 {
                if self.bit(d * 4 + b) {
                    nibble |= 1 << b;
                }
            }
            out.push(HEX[nibble] as char);
        }
        out
    }

    /// Circular right rotation by `k` within this fingerprint's width.
    pub fn rotated(&self, k: usize) -> Self {
        rotate(self, self.width(), k)
    }

    /// Number of differing bits. See [`hamming_distance`].
    pub fn hamming_distance(&self, other: &Self) -> Result<u32, SimHashError> {
        hamming_distance(self, other)
    }

    fn words(&self) -> &[u64] {
        self.bits.as_raw_slice()
    }
}

/// Circular right rotation of `value` by `k` bits within a `width`-bit field.
///
/// `value` is truncated (or zero-extended) to `width` first and `k` is reduced
/// modulo `width`; a rotation by a multiple of `width` returns the value
/// unchanged.
pub fn rotate(value: &Fingerprint, width: usize, k: usize) -> Fingerprint {
    let mut bits = value.bits.clone();
    bits.resize(width, false);
    if width > 0 {
        // Lsb0: moving bit `i + k` to index `i` is a numeric right rotation.
        bits.rotate_left(k % width);
    }
    Fingerprint::from_bitvec(bits)
}

/// Count of set bits in `a ^ b`, over `max(bit_length(a), bit_length(b))` bits.
///
/// Fails with [`SimHashError::DegenerateDistance`] when both operands have
/// zero width, since there is no field to compare over. Two all-zero
/// fingerprints of a real width are at distance 0.
pub fn hamming_distance(a: &Fingerprint, b: &Fingerprint) -> Result<u32, SimHashError> {
    if a.width() == 0 && b.width() == 0 {
        return Err(SimHashError::DegenerateDistance);
    }
    let (wa, wb) = (a.words(), b.words());
    let distance = (0..wa.len().max(wb.len()))
        .map(|i| {
            let x = wa.get(i).copied().unwrap_or(0);
            let y = wb.get(i).copied().unwrap_or(0);
            (x ^ y).count_ones()
        })
        .sum();
    Ok(distance)
}

impl PartialEq for Fingerprint {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Fingerprint {}

impl PartialOrd for Fingerprint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Fingerprint {
    fn cmp(&self, other: &Self) -> Ordering {
        let (wa, wb) = (self.words(), other.words());
        for i in (0..wa.len().max(wb.len())).rev() {
            let x = wa.get(i).copied().unwrap_or(0);
            let y = wb.get(i).copied().unwrap_or(0);
            match x.cmp(&y) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        self.width().cmp(&other.width())
    }
}

impl Hash for Fingerprint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.width());
        self.words().hash(state);
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({}; 0x{})", self.width(), self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(fp: &Fingerprint) -> u128 {
        fp.as_bitslice()
            .iter()
            .by_vals()
            .enumerate()
            .fold(0, |acc, (i, b)| acc | (u128::from(b) << i))
    }

    #[test]
    fn from_u128_truncates_to_width() {
        let fp = Fingerprint::from_u128(0b1011_0110, 4);
        assert_eq!(fp.width(), 4);
        assert_eq!(value(&fp), 0b0110);
        assert_eq!(fp.bit_length(), 3);
        assert_eq!(fp.count_ones(), 2);
    }

    #[test]
    fn rotate_right_moves_low_bits_to_top() {
        let fp = Fingerprint::from_u128(0b0001, 4);
        assert_eq!(value(&rotate(&fp, 4, 1)), 0b1000);
        let fp = Fingerprint::from_u128(0b0110, 4);
        assert_eq!(value(&rotate(&fp, 4, 1)), 0b0011);
        assert_eq!(value(&rotate(&fp, 4, 2)), 0b1001);
    }

    #[test]
    fn rotate_identity_at_zero_and_full_width() {
        let fp = Fingerprint::from_u128(0xDEAD_BEEF_1234, 100);
        assert_eq!(rotate(&fp, 100, 0), fp);
        assert_eq!(rotate(&fp, 100, 100), fp);
        assert_eq!(rotate(&fp, 100, 7), rotate(&fp, 100, 207));
    }

    #[test]
    fn rotate_is_invertible() {
        let fp = Fingerprint::from_u128(0x0123_4567_89AB_CDEF_FEDC_BA98, 96);
        for k in 0..96 {
            let once = rotate(&fp, 96, k);
            assert_eq!(rotate(&once, 96, 96 - k), fp, "k={k}");
        }
    }

    #[test]
    fn rotate_across_word_boundary_keeps_population() {
        let fp = Fingerprint::from_bitvec((0..200).map(|i| i < 3).collect());
        let r = fp.rotated(2);
        assert_eq!(r.width(), 200);
        assert_eq!(r.count_ones(), 3);
        assert!(r.bit(0));
        assert!(r.bit(198) && r.bit(199));
    }

    #[test]
    fn hamming_is_symmetric() {
        let a = Fingerprint::from_u128(0b1100_1010, 8);
        let b = Fingerprint::from_u128(0b0101_1010, 8);
        assert_eq!(hamming_distance(&a, &b).unwrap(), 2);
        assert_eq!(hamming_distance(&b, &a).unwrap(), 2);
    }

    #[test]
    fn hamming_zero_iff_equal() {
        let a = Fingerprint::from_u128(u128::MAX, 128);
        let b = Fingerprint::from_u128(u128::MAX - 1, 128);
        assert_eq!(a.hamming_distance(&a).unwrap(), 0);
        assert_eq!(a.hamming_distance(&b).unwrap(), 1);
        assert_ne!(a, b);
    }

    #[test]
    fn hamming_is_rotation_invariant() {
        let a = Fingerprint::from_u128(0xF0F0_1234, 64);
        let b = Fingerprint::from_u128(0x0F0F_4321, 64);
        let d = a.hamming_distance(&b).unwrap();
        for k in [1, 13, 63] {
            assert_eq!(a.rotated(k).hamming_distance(&b.rotated(k)).unwrap(), d);
        }
    }

    #[test]
    fn hamming_of_zero_width_is_degenerate() {
        let empty = Fingerprint::zero(0);
        assert_eq!(
            hamming_distance(&empty, &empty),
            Err(SimHashError::DegenerateDistance)
        );
        // Zero values with a real width are comparable.
        assert_eq!(hamming_distance(&Fingerprint::zero(8), &Fingerprint::zero(8)), Ok(0));
    }

    #[test]
    fn ordering_is_numeric() {
        let mut fps: Vec<_> = [5u128, 1 << 100, 0, 77]
            .into_iter()
            .map(|v| Fingerprint::from_u128(v, 128))
            .collect();
        fps.sort();
        let values: Vec<_> = fps.iter().map(value).collect();
        assert_eq!(values, vec![0, 5, 77, 1 << 100]);
    }

    #[test]
    fn hex_is_zero_padded() {
        assert_eq!(Fingerprint::from_u128(0xAB, 16).to_hex(), "00ab");
        assert_eq!(Fingerprint::from_u128(0x1F, 5).to_hex(), "1f");
        assert_eq!(Fingerprint::from_u128(0xAB, 16).to_string(), "0x00ab");
    }
}
