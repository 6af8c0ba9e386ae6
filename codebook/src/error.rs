use giztoy_binvec::BinVecError;
use thiserror::Error;

/// Errors returned by codebook operations.
#[derive(Debug, Error)]
pub enum CodebookError {
    /// Serialized bytes are malformed or inconsistent.
    #[error("codebook: invalid codes: {0}")]
    InvalidCodes(String),

    /// Reading or writing a codebook file failed.
    #[error("codebook: io: {0}")]
    Io(#[from] std::io::Error),

    #[error("codebook: need at least {k} distinct points, got {distinct}")]
    TooFewPoints { k: usize, distinct: usize },

    #[error("codebook: word {word} out of range (size {size})")]
    OutOfRange { word: u32, size: usize },

    #[error("codebook: dimension mismatch: expected {expected} bits, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("codebook: invalid config: {0}")]
    InvalidConfig(String),

    #[error("codebook: {empty} clusters still empty after re-seeding")]
    Degenerate { empty: usize },
}

impl From<BinVecError> for CodebookError {
    fn from(e: BinVecError) -> Self {
        match e {
            BinVecError::WidthMismatch { expected, got } => {
                CodebookError::DimensionMismatch { expected, got }
            }
            other => CodebookError::InvalidCodes(other.to_string()),
        }
    }
}
