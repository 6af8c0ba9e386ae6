use std::path::Path;
use std::sync::Arc;

use giztoy_binvec::BinaryVector;
use parking_lot::RwLock;
use tracing::info;

use crate::{Codebook, CodebookError, QResults};

/// A replaceable codebook for the serving path.
///
/// Readers take an [`Arc`] snapshot, so a concurrent [`SharedCodebook::replace`]
/// never exposes a partially updated codebook: each call sees either the old
/// or the new one in full. Safe for concurrent use.
#[derive(Default)]
pub struct SharedCodebook {
    current: RwLock<Option<Arc<Codebook>>>,
}

impl SharedCodebook {
    /// Creates a handle with no codebook loaded.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_codebook(cb: Codebook) -> Self {
        Self {
            current: RwLock::new(Some(Arc::new(cb))),
        }
    }

    /// Installs `cb` and returns the codebook it replaced.
    pub fn replace(&self, cb: Codebook) -> Option<Arc<Codebook>> {
        self.current.write().replace(Arc::new(cb))
    }

    /// Unloads the codebook and returns it.
    pub fn clear(&self) -> Option<Arc<Codebook>> {
        self.current.write().take()
    }

    /// Returns the current codebook, if any.
    pub fn snapshot(&self) -> Option<Arc<Codebook>> {
        self.current.read().clone()
    }

    /// Quantizes against the current codebook, or returns
    /// [`QResults::NONE`] when none is loaded.
    pub fn quantize(&self, v: &BinaryVector) -> Result<QResults, CodebookError> {
        match self.snapshot() {
            Some(cb) => cb.quantize(v),
            None => Ok(QResults::NONE),
        }
    }

    /// Loads a codebook from `path` and installs it. On error the current
    /// codebook stays in place. Returns the new vocabulary size.
    pub fn reload(&self, path: impl AsRef<Path>) -> Result<usize, CodebookError> {
        let cb = Codebook::load(path.as_ref())?;
        let n = cb.len();
        let old = self.replace(cb);
        info!(
            path = %path.as_ref().display(),
            clusters = n,
            previous = old.map(|c| c.len()),
            "codebook: reloaded"
        );
        Ok(n)
    }
}
