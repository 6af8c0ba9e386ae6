use std::fmt;

use crate::BinVecError;

const WORD_BITS: usize = 64;

/// A fixed-width bit vector compared by Hamming distance.
///
/// Bits past `len()` in the last storage word are always zero, so the
/// derived `Eq` and `Hash` compare content only.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct BinaryVector {
    bits: usize,
    words: Vec<u64>,
}

impl BinaryVector {
    /// Creates an all-zero vector of `bits` bits.
    pub fn zeros(bits: usize) -> Self {
        Self {
            bits,
            words: vec![0; bits.div_ceil(WORD_BITS)],
        }
    }

    /// Creates a vector from one bool per bit.
    pub fn from_bools(values: &[bool]) -> Self {
        let mut v = Self::zeros(values.len());
        for (i, &b) in values.iter().enumerate() {
            if b {
                v.words[i / WORD_BITS] |= 1u64 << (i % WORD_BITS);
            }
        }
        v
    }

    /// Unpacks an LSB-first byte string of exactly `ceil(bits / 8)` bytes.
    ///
    /// Padding bits of the last byte must be zero.
    pub fn from_bytes(bits: usize, bytes: &[u8]) -> Result<Self, BinVecError> {
        let want = bits.div_ceil(8);
        if bytes.len() != want {
            return Err(BinVecError::ByteLength {
                bits,
                want,
                got: bytes.len(),
            });
        }
        let tail = bits % 8;
        if tail != 0 {
            if let Some(&last) = bytes.last() {
                if last >> tail != 0 {
                    return Err(BinVecError::Padding { bits });
                }
            }
        }

        let mut words = vec![0u64; bits.div_ceil(WORD_BITS)];
        for (i, &b) in bytes.iter().enumerate() {
            words[i / 8] |= (b as u64) << ((i % 8) * 8);
        }
        Ok(Self { bits, words })
    }

    /// Packs the vector LSB-first into `ceil(len / 8)` bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        (0..self.byte_len())
            .map(|i| (self.words[i / 8] >> ((i % 8) * 8)) as u8)
            .collect()
    }

    /// Number of bytes produced by [`BinaryVector::to_bytes`].
    pub fn byte_len(&self) -> usize {
        self.bits.div_ceil(8)
    }

    /// Parses the hex form of [`BinaryVector::to_bytes`].
    pub fn from_hex(bits: usize, s: &str) -> Result<Self, BinVecError> {
        let bytes = hex::decode(s.trim()).map_err(|e| BinVecError::Hex(e.to_string()))?;
        Self::from_bytes(bits, &bytes)
    }

    /// Lowercase hex of the packed bytes.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Returns the width in bits.
    pub fn len(&self) -> usize {
        self.bits
    }

    /// Returns true for a zero-width vector.
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Returns bit `i`. Panics if `i >= len()`.
    pub fn get(&self, i: usize) -> bool {
        assert!(i < self.bits, "binvec: bit {i} out of range for width {}", self.bits);
        (self.words[i / WORD_BITS] >> (i % WORD_BITS)) & 1 == 1
    }

    /// Sets bit `i`. Panics if `i >= len()`.
    pub fn set(&mut self, i: usize, value: bool) {
        assert!(i < self.bits, "binvec: bit {i} out of range for width {}", self.bits);
        let mask = 1u64 << (i % WORD_BITS);
        if value {
            self.words[i / WORD_BITS] |= mask;
        } else {
            self.words[i / WORD_BITS] &= !mask;
        }
    }

    /// Inverts bit `i`. Panics if `i >= len()`.
    pub fn flip(&mut self, i: usize) {
        assert!(i < self.bits, "binvec: bit {i} out of range for width {}", self.bits);
        self.words[i / WORD_BITS] ^= 1u64 << (i % WORD_BITS);
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }

    /// Iterates the indices of set bits in ascending order.
    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(wi, &word)| {
            let mut w = word;
            std::iter::from_fn(move || {
                if w == 0 {
                    return None;
                }
                let tz = w.trailing_zeros() as usize;
                w &= w - 1;
                Some(wi * WORD_BITS + tz)
            })
        })
    }

    /// Hamming distance to `other`.
    pub fn hamming(&self, other: &Self) -> Result<u32, BinVecError> {
        self.check_width(other)?;
        Ok(self
            .words
            .iter()
            .zip(other.words.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum())
    }

    /// Hamming distance to `other` if it is at most `limit`.
    ///
    /// Stops at the first 64-bit word where the running distance exceeds
    /// `limit` and returns `Ok(None)`.
    pub fn hamming_within(&self, other: &Self, limit: u32) -> Result<Option<u32>, BinVecError> {
        self.check_width(other)?;
        let mut dist = 0u32;
        for (a, b) in self.words.iter().zip(other.words.iter()) {
            dist += (a ^ b).count_ones();
            if dist > limit {
                return Ok(None);
            }
        }
        Ok(Some(dist))
    }

    fn check_width(&self, other: &Self) -> Result<(), BinVecError> {
        if self.bits != other.bits {
            return Err(BinVecError::WidthMismatch {
                expected: self.bits,
                got: other.bits,
            });
        }
        Ok(())
    }
}

impl fmt::Display for BinaryVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for BinaryVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BinaryVector({}b:{})", self.bits, self.to_hex())
    }
}
