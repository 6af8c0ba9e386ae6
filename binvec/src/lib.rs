//! Fixed-width binary vectors for fingerprint descriptors.
//!
//! A [`BinaryVector`] is a packed bit string with content equality and
//! Hamming distance. Bits are stored in `u64` words so distance is a
//! sequence of XOR + popcount steps.
//!
//! # Byte Layout
//!
//! [`BinaryVector::to_bytes`] packs bits LSB-first: bit `i` lives in byte
//! `i / 8` at position `i % 8`. The hex form is the same bytes in lowercase
//! hex, so `"0100"` with 16 bits has only bit 0 set.

mod binvec;
mod error;

pub use binvec::BinaryVector;
pub use error::BinVecError;
