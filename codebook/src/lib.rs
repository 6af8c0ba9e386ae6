//! Binary-vector codebook for audio fingerprint quantization.
//!
//! A [`Codebook`] partitions fixed-width binary fingerprint vectors into a
//! fixed vocabulary of clusters ("words"), each with a binary centroid.
//! [`Codebook::quantize`] maps an incoming vector to the nearest word by
//! Hamming distance; the word IDs feed an inverted index downstream.
//!
//! # Usage
//!
//! ```
//! use giztoy_codebook::{BinaryVector, Codebook, TrainConfig, Trainer};
//!
//! let points: Vec<BinaryVector> = (0..8u8)
//!     .map(|i| BinaryVector::from_bytes(8, &[i.wrapping_mul(37)]).unwrap())
//!     .collect();
//!
//! let codebook = Trainer::new(TrainConfig::new(2)).train(&points)?.into_codebook();
//! let loaded = Codebook::deserialize(&codebook.serialize()?)?;
//! assert_eq!(loaded, codebook);
//!
//! let q = loaded.quantize(&points[0])?;
//! assert!(q.is_match());
//! # Ok::<(), giztoy_codebook::CodebookError>(())
//! ```
//!
//! # Design
//!
//! Training and serving share one nearest-centroid rule: minimum Hamming
//! distance, ties to the lowest cluster ID. Codebooks are immutable once
//! built; serving code swaps them whole through [`SharedCodebook`].
//! Per-point assignments exist only in the [`Training`] result and are never
//! persisted.

mod codebook;
mod codec;
mod diagnostics;
mod error;
mod quantizer;
mod shared;
mod trainer;

pub use codebook::{Cluster, Codebook, QResults};
pub use diagnostics::{CodebookStats, DuplicatePair};
pub use error::CodebookError;
pub use giztoy_binvec::BinaryVector;
pub use shared::SharedCodebook;
pub use trainer::{Membership, StopReason, TrainConfig, Trainer, Training};
