use giztoy_binvec::{BinVecError, BinaryVector};
use rayon::prelude::*;

use crate::{Codebook, CodebookError, QResults};

/// Finds the centroid closest to `v`, ties going to the lowest position.
///
/// Returns `(position, distance)`, or `None` if there are no centroids.
/// Each centroid comparison stops as soon as its partial distance reaches
/// the best distance seen so far, which leaves the result identical to a
/// full linear scan.
pub(crate) fn nearest<'a, I>(centroids: I, v: &BinaryVector) -> Result<Option<(u32, u32)>, BinVecError>
where
    I: IntoIterator<Item = &'a BinaryVector>,
{
    let mut best: Option<(u32, u32)> = None;
    for (i, c) in centroids.into_iter().enumerate() {
        let limit = match best {
            Some((_, 0)) => break,
            Some((_, d)) => d - 1,
            None => u32::MAX,
        };
        if let Some(d) = c.hamming_within(v, limit)? {
            best = Some((i as u32, d));
        }
    }
    Ok(best)
}

impl Codebook {
    /// Maps a vector to its nearest word.
    ///
    /// Returns [`QResults::NONE`] for an empty codebook. Fails with
    /// [`CodebookError::DimensionMismatch`] if `v` is not as wide as the
    /// centroids.
    pub fn quantize(&self, v: &BinaryVector) -> Result<QResults, CodebookError> {
        Ok(match nearest(self.centroids(), v)? {
            Some((word, dist)) => QResults::matched(word, dist),
            None => QResults::NONE,
        })
    }

    /// Quantizes many vectors in parallel. Output order matches input order.
    pub fn quantize_batch(&self, vs: &[BinaryVector]) -> Vec<Result<QResults, CodebookError>> {
        vs.par_iter().map(|v| self.quantize(v)).collect()
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::Cluster;

    fn random_vec(rng: &mut StdRng, bits: usize) -> BinaryVector {
        let bools: Vec<bool> = (0..bits).map(|_| rng.gen_bool(0.5)).collect();
        BinaryVector::from_bools(&bools)
    }

    fn codebook_of(centroids: Vec<BinaryVector>) -> Codebook {
        Codebook::from_clusters(
            centroids
                .into_iter()
                .enumerate()
                .map(|(i, c)| Cluster::new(i as u32, c))
                .collect(),
        )
    }

    fn brute_force(cb: &Codebook, v: &BinaryVector) -> (u32, u32) {
        let mut best = (0u32, u32::MAX);
        for (i, c) in cb.centroids().enumerate() {
            let d = c.hamming(v).unwrap();
            if d < best.1 {
                best = (i as u32, d);
            }
        }
        best
    }

    #[test]
    fn empty_codebook_returns_sentinel() {
        let cb = Codebook::new();
        let q = cb.quantize(&BinaryVector::zeros(64)).unwrap();
        assert_eq!(q, QResults::NONE);
        assert!(q.word.is_none());
        assert!(q.dist.is_none());
    }

    #[test]
    fn exact_match_has_zero_distance() {
        let mut rng = StdRng::seed_from_u64(1);
        let centroids: Vec<BinaryVector> = (0..16).map(|_| random_vec(&mut rng, 128)).collect();
        let cb = codebook_of(centroids.clone());
        for (i, c) in centroids.iter().enumerate() {
            let q = cb.quantize(c).unwrap();
            assert_eq!(q.word, Some(i as u32));
            assert_eq!(q.dist, Some(0));
        }
    }

    #[test]
    fn tie_goes_to_lowest_id() {
        // Query 0000 is distance 1 from both 0100 and 0200 (bits 0 and 1).
        let cb = codebook_of(vec![
            BinaryVector::from_hex(16, "ff00").unwrap(),
            BinaryVector::from_hex(16, "0200").unwrap(),
            BinaryVector::from_hex(16, "0100").unwrap(),
        ]);
        let q = cb.quantize(&BinaryVector::zeros(16)).unwrap();
        assert_eq!(q, QResults::matched(1, 1));
    }

    #[test]
    fn identical_centroids_pick_first() {
        let c = BinaryVector::from_hex(16, "0f0f").unwrap();
        let cb = codebook_of(vec![BinaryVector::zeros(16), c.clone(), c.clone()]);
        assert_eq!(cb.quantize(&c).unwrap(), QResults::matched(1, 0));
    }

    #[test]
    fn matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(42);
        for &bits in &[7usize, 64, 150, 256] {
            let cb = codebook_of((0..200).map(|_| random_vec(&mut rng, bits)).collect());
            for _ in 0..200 {
                let v = random_vec(&mut rng, bits);
                let (word, dist) = brute_force(&cb, &v);
                let q = cb.quantize(&v).unwrap();
                assert_eq!(q.dist, Some(dist), "bits={bits}");
                assert_eq!(q.word, Some(word), "bits={bits}");
            }
        }
    }

    #[test]
    fn width_mismatch_is_an_error() {
        let cb = codebook_of(vec![BinaryVector::zeros(16)]);
        let err = cb.quantize(&BinaryVector::zeros(32)).unwrap_err();
        assert!(matches!(
            err,
            CodebookError::DimensionMismatch {
                expected: 16,
                got: 32
            }
        ));
    }

    #[test]
    fn batch_preserves_order() {
        let mut rng = StdRng::seed_from_u64(7);
        let cb = codebook_of((0..32).map(|_| random_vec(&mut rng, 96)).collect());
        let queries: Vec<BinaryVector> = (0..500).map(|_| random_vec(&mut rng, 96)).collect();

        let batch = cb.quantize_batch(&queries);
        assert_eq!(batch.len(), queries.len());
        for (q, r) in queries.iter().zip(batch) {
            assert_eq!(r.unwrap(), cb.quantize(q).unwrap());
        }
    }
}
