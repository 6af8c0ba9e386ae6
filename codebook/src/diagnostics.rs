use std::collections::HashMap;
use std::fmt;

use giztoy_binvec::BinaryVector;
use serde::Serialize;
use tracing::warn;

use crate::Codebook;

/// Two clusters with bit-identical centroids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DuplicatePair {
    pub first: u32,
    pub second: u32,
}

/// Summary statistics over a codebook.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CodebookStats {
    pub clusters: usize,
    pub bits: usize,
    pub total_points: u64,
    /// Clusters with no assigned points.
    pub degenerate: usize,
    pub npoints_min: u32,
    pub npoints_max: u32,
    pub npoints_mean: f64,
    pub npoints_stddev: f64,
    /// `npoints_max / npoints_mean`; 1.0 for a perfectly even vocabulary.
    pub skew: f64,
    /// Mean of per-cluster `sum_d / npoints` over non-degenerate clusters.
    pub distortion_mean: f64,
    pub distortion_variance: f64,
}

impl Codebook {
    /// Lists every pair of clusters whose centroids are identical, ordered
    /// by `(first, second)`. Each pair is also logged as a warning.
    pub fn find_duplicates(&self) -> Vec<DuplicatePair> {
        let mut groups: HashMap<&BinaryVector, Vec<u32>> = HashMap::new();
        for c in self.clusters() {
            groups.entry(&c.centroid).or_default().push(c.id);
        }

        let mut pairs = Vec::new();
        for ids in groups.values().filter(|ids| ids.len() > 1) {
            for (i, &first) in ids.iter().enumerate() {
                for &second in &ids[i + 1..] {
                    pairs.push(DuplicatePair { first, second });
                }
            }
        }
        pairs.sort_by_key(|p| (p.first, p.second));

        for p in &pairs {
            warn!(first = p.first, second = p.second, "codebook: duplicate centroids");
        }
        pairs
    }

    /// Computes [`CodebookStats`]. Read-only.
    pub fn analyze(&self) -> CodebookStats {
        let clusters = self.clusters();
        if clusters.is_empty() {
            return CodebookStats::default();
        }

        let counts: Vec<f64> = clusters.iter().map(|c| c.npoints as f64).collect();
        let (npoints_mean, npoints_var) = mean_variance(&counts);
        let npoints_min = clusters.iter().map(|c| c.npoints).min().unwrap_or(0);
        let npoints_max = clusters.iter().map(|c| c.npoints).max().unwrap_or(0);

        let distortions: Vec<f64> = clusters.iter().filter_map(|c| c.mean_distortion()).collect();
        let (distortion_mean, distortion_variance) = mean_variance(&distortions);

        let degenerate = clusters.iter().filter(|c| c.is_degenerate()).count();
        if degenerate > 0 {
            warn!(degenerate, clusters = clusters.len(), "codebook: empty clusters");
        }

        CodebookStats {
            clusters: clusters.len(),
            bits: self.width().unwrap_or(0),
            total_points: clusters.iter().map(|c| c.npoints as u64).sum(),
            degenerate,
            npoints_min,
            npoints_max,
            npoints_mean,
            npoints_stddev: npoints_var.sqrt(),
            skew: if npoints_mean > 0.0 {
                npoints_max as f64 / npoints_mean
            } else {
                0.0
            },
            distortion_mean,
            distortion_variance,
        }
    }
}

/// Population mean and variance; zeros for an empty slice.
fn mean_variance(xs: &[f64]) -> (f64, f64) {
    if xs.is_empty() {
        return (0.0, 0.0);
    }
    let n = xs.len() as f64;
    let mean = xs.iter().sum::<f64>() / n;
    let var = xs.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / n;
    (mean, var)
}

impl fmt::Display for CodebookStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "clusters:      {} x {} bits", self.clusters, self.bits)?;
        writeln!(f, "points:        {}", self.total_points)?;
        writeln!(f, "degenerate:    {}", self.degenerate)?;
        writeln!(
            f,
            "npoints:       min {} / max {} / mean {:.2} / stddev {:.2}",
            self.npoints_min, self.npoints_max, self.npoints_mean, self.npoints_stddev
        )?;
        writeln!(f, "skew:          {:.2}", self.skew)?;
        write!(
            f,
            "distortion:    mean {:.3} / variance {:.3}",
            self.distortion_mean, self.distortion_variance
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Cluster;

    fn cluster(id: u32, hex: &str, npoints: u32, sum_d: f32) -> Cluster {
        Cluster {
            id,
            sum_d,
            npoints,
            centroid: BinaryVector::from_hex(16, hex).unwrap(),
        }
    }

    #[test]
    fn duplicates_reported() {
        let cb = Codebook::from_clusters(vec![
            cluster(0, "00ff", 1, 0.0),
            cluster(1, "0f0f", 1, 0.0),
            cluster(2, "00ff", 1, 0.0),
            cluster(3, "ffff", 1, 0.0),
            cluster(4, "0f0f", 1, 0.0),
            cluster(5, "00ff", 1, 0.0),
        ]);
        let pairs = cb.find_duplicates();
        let got: Vec<(u32, u32)> = pairs.iter().map(|p| (p.first, p.second)).collect();
        assert_eq!(got, vec![(0, 2), (0, 5), (1, 4), (2, 5)]);
    }

    #[test]
    fn no_duplicates_for_distinct_centroids() {
        let cb = Codebook::from_clusters(vec![
            cluster(0, "0000", 1, 0.0),
            cluster(1, "0100", 1, 0.0),
            cluster(2, "0200", 1, 0.0),
        ]);
        assert!(cb.find_duplicates().is_empty());
        assert!(Codebook::new().find_duplicates().is_empty());
    }

    #[test]
    fn analyze_statistics() {
        let cb = Codebook::from_clusters(vec![
            cluster(0, "0000", 2, 4.0),
            cluster(1, "0100", 6, 6.0),
            cluster(2, "0200", 0, 0.0),
            cluster(3, "0300", 4, 12.0),
        ]);
        let s = cb.analyze();
        assert_eq!(s.clusters, 4);
        assert_eq!(s.bits, 16);
        assert_eq!(s.total_points, 12);
        assert_eq!(s.degenerate, 1);
        assert_eq!(s.npoints_min, 0);
        assert_eq!(s.npoints_max, 6);
        assert!((s.npoints_mean - 3.0).abs() < 1e-12);
        // counts 2, 6, 0, 4 around 3: (1 + 9 + 9 + 1) / 4 = 5.
        assert!((s.npoints_stddev - 5.0f64.sqrt()).abs() < 1e-12);
        assert!((s.skew - 2.0).abs() < 1e-12);
        // mean distortions 2, 1, 3 -> mean 2, variance 2/3.
        assert!((s.distortion_mean - 2.0).abs() < 1e-12);
        assert!((s.distortion_variance - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn analyze_is_idempotent() {
        let cb = Codebook::from_clusters(vec![
            cluster(0, "0000", 3, 1.0),
            cluster(1, "ffff", 5, 7.0),
        ]);
        assert_eq!(cb.analyze(), cb.analyze());
    }

    #[test]
    fn analyze_empty() {
        let s = Codebook::new().analyze();
        assert_eq!(s, CodebookStats::default());
        assert_eq!(s.clusters, 0);
    }

    #[test]
    fn stats_serialize_and_display() {
        let cb = Codebook::from_clusters(vec![cluster(0, "0000", 2, 2.0)]);
        let s = cb.analyze();
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["clusters"], 1);
        assert_eq!(json["total_points"], 2);
        let text = s.to_string();
        assert!(text.contains("clusters:      1 x 16 bits"));
        assert!(text.contains("degenerate:    0"));
    }
}
