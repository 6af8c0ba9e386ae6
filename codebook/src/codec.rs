use std::ffi::OsString;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use giztoy_binvec::BinaryVector;
use tracing::info;

use crate::{Cluster, Codebook, CodebookError};

const CODEBOOK_MAGIC: [u8; 4] = *b"CBK1";
const CODEBOOK_VERSION: u32 = 1;

/// magic + version + cluster count + bit-width.
const HEADER_LEN: usize = 16;

/// id + sum_d + npoints, before the centroid bytes.
const RECORD_FIXED_LEN: usize = 12;

impl Codebook {
    /// Encodes the codebook in its binary file format.
    ///
    /// ```text
    /// [4B magic "CBK1"] [4B version=1]
    /// [4B cluster count] [4B centroid bits]
    /// For each cluster, in ID order:
    ///   [4B id u32] [4B sum_d f32] [4B npoints u32]
    ///   [ceil(bits/8) B centroid, LSB-first]
    /// ```
    ///
    /// All multi-byte values are little-endian. Fails if a cluster's ID is
    /// not its position or the centroids differ in width.
    pub fn serialize(&self) -> Result<Vec<u8>, CodebookError> {
        let width = self.width().unwrap_or(0);
        let count = u32::try_from(self.len())
            .map_err(|_| CodebookError::InvalidCodes(format!("{} clusters overflow u32", self.len())))?;
        let bits = u32::try_from(width)
            .map_err(|_| CodebookError::InvalidCodes(format!("{width} bits overflow u32")))?;

        let record_len = RECORD_FIXED_LEN + width.div_ceil(8);
        let mut buf = Vec::with_capacity(HEADER_LEN + self.len() * record_len);
        buf.extend_from_slice(&CODEBOOK_MAGIC);
        buf.extend_from_slice(&CODEBOOK_VERSION.to_le_bytes());
        buf.extend_from_slice(&count.to_le_bytes());
        buf.extend_from_slice(&bits.to_le_bytes());

        for (i, c) in self.clusters().iter().enumerate() {
            if c.id as usize != i {
                return Err(CodebookError::InvalidCodes(format!(
                    "cluster at position {i} has id {}",
                    c.id
                )));
            }
            if c.centroid.len() != width {
                return Err(CodebookError::DimensionMismatch {
                    expected: width,
                    got: c.centroid.len(),
                });
            }
            buf.extend_from_slice(&c.id.to_le_bytes());
            buf.extend_from_slice(&c.sum_d.to_le_bytes());
            buf.extend_from_slice(&c.npoints.to_le_bytes());
            buf.extend_from_slice(&c.centroid.to_bytes());
        }
        Ok(buf)
    }

    /// Decodes bytes produced by [`Codebook::serialize`].
    ///
    /// The buffer length must match the header exactly. Any inconsistency
    /// fails with [`CodebookError::InvalidCodes`] and no codebook is built.
    pub fn deserialize(data: &[u8]) -> Result<Codebook, CodebookError> {
        if data.len() < HEADER_LEN {
            return Err(CodebookError::InvalidCodes(format!(
                "{} bytes is shorter than the {HEADER_LEN}-byte header",
                data.len()
            )));
        }
        let mut r = ByteReader::new(data);

        let magic: [u8; 4] = r.take()?;
        if magic != CODEBOOK_MAGIC {
            return Err(CodebookError::InvalidCodes(format!("invalid magic {magic:?}")));
        }
        let version = r.u32()?;
        if version != CODEBOOK_VERSION {
            return Err(CodebookError::InvalidCodes(format!(
                "unsupported version {version} (want {CODEBOOK_VERSION})"
            )));
        }

        let count = r.u32()? as u64;
        let bits = r.u32()? as usize;
        let centroid_len = bits.div_ceil(8);
        let expected = (RECORD_FIXED_LEN as u64 + centroid_len as u64)
            .checked_mul(count)
            .and_then(|n| n.checked_add(HEADER_LEN as u64));
        if expected != Some(data.len() as u64) {
            return Err(CodebookError::InvalidCodes(format!(
                "{count} clusters of {bits} bits do not fit {} bytes",
                data.len()
            )));
        }

        let mut clusters = Vec::with_capacity(count as usize);
        for i in 0..count as usize {
            let id = r.u32()?;
            if id as usize != i {
                return Err(CodebookError::InvalidCodes(format!(
                    "cluster at position {i} has id {id}"
                )));
            }
            let sum_d = f32::from_le_bytes(r.take()?);
            if !sum_d.is_finite() || sum_d < 0.0 {
                return Err(CodebookError::InvalidCodes(format!(
                    "cluster {i} has invalid distortion sum {sum_d}"
                )));
            }
            let npoints = r.u32()?;
            let centroid = BinaryVector::from_bytes(bits, r.bytes(centroid_len)?)
                .map_err(|e| CodebookError::InvalidCodes(format!("cluster {i}: {e}")))?;
            clusters.push(Cluster {
                id,
                sum_d,
                npoints,
                centroid,
            });
        }
        Ok(Codebook::from_clusters(clusters))
    }

    /// Writes the serialized codebook to `w`.
    pub fn write_to(&self, w: &mut dyn Write) -> Result<(), CodebookError> {
        w.write_all(&self.serialize()?)?;
        w.flush()?;
        Ok(())
    }

    /// Reads a whole serialized codebook from `r`.
    pub fn read_from(r: &mut dyn Read) -> Result<Codebook, CodebookError> {
        let mut data = Vec::new();
        r.read_to_end(&mut data)?;
        Codebook::deserialize(&data)
    }

    /// Saves the codebook to `path`.
    ///
    /// Writes `<path>.tmp` first and renames it over `path`, so readers never
    /// observe a half-written file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), CodebookError> {
        let path = path.as_ref();
        let data = self.serialize()?;
        let tmp = tmp_path(path);
        if let Err(e) = fs::write(&tmp, &data).and_then(|_| fs::rename(&tmp, path)) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        info!(
            path = %path.display(),
            clusters = self.len(),
            bytes = data.len(),
            "codebook: saved"
        );
        Ok(())
    }

    /// Loads a codebook from `path`.
    ///
    /// A missing or unreadable file is [`CodebookError::Io`]; a file with bad
    /// contents is [`CodebookError::InvalidCodes`].
    pub fn load(path: impl AsRef<Path>) -> Result<Codebook, CodebookError> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        let cb = Codebook::deserialize(&data)?;
        info!(
            path = %path.display(),
            clusters = cb.len(),
            bits = cb.width().unwrap_or(0),
            "codebook: loaded"
        );
        Ok(cb)
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut s = OsString::from(path.as_os_str());
    s.push(".tmp");
    PathBuf::from(s)
}

/// Cursor over a byte slice; running past the end is `InvalidCodes`.
struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn bytes(&mut self, n: usize) -> Result<&'a [u8], CodebookError> {
        let end = self.pos.checked_add(n).filter(|&e| e <= self.buf.len()).ok_or_else(|| {
            CodebookError::InvalidCodes(format!("unexpected end of data at byte {}", self.pos))
        })?;
        let out = &self.buf[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], CodebookError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes(N)?);
        Ok(out)
    }

    fn u32(&mut self) -> Result<u32, CodebookError> {
        Ok(u32::from_le_bytes(self.take()?))
    }
}
