use thiserror::Error;

/// Errors returned by binary vector constructors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BinVecError {
    #[error("binvec: width mismatch: expected {expected} bits, got {got}")]
    WidthMismatch { expected: usize, got: usize },

    #[error("binvec: {bits} bits need {want} bytes, got {got}")]
    ByteLength { bits: usize, want: usize, got: usize },

    #[error("binvec: padding bits set beyond width {bits}")]
    Padding { bits: usize },

    #[error("binvec: invalid hex: {0}")]
    Hex(String),
}
