use std::fmt;

use giztoy_binvec::BinaryVector;

use crate::CodebookError;

/// One codebook entry: a binary centroid and its training statistics.
#[derive(Clone, PartialEq)]
pub struct Cluster {
    /// Word ID. Always equal to the cluster's position in its [`Codebook`].
    pub id: u32,

    /// Sum of Hamming distances from assigned points to the centroid,
    /// measured at assignment time.
    pub sum_d: f32,

    /// Number of points assigned to this cluster.
    pub npoints: u32,

    /// Per-bit majority vote over the assigned points.
    pub centroid: BinaryVector,
}

impl Cluster {
    /// Creates a cluster with no assigned points.
    pub fn new(id: u32, centroid: BinaryVector) -> Self {
        Self {
            id,
            sum_d: 0.0,
            npoints: 0,
            centroid,
        }
    }

    /// Mean distance from assigned points to the centroid, or `None` for a
    /// degenerate cluster.
    pub fn mean_distortion(&self) -> Option<f64> {
        if self.npoints == 0 {
            return None;
        }
        Some(self.sum_d as f64 / self.npoints as f64)
    }

    /// True when no points are assigned.
    pub fn is_degenerate(&self) -> bool {
        self.npoints == 0
    }
}

impl fmt::Debug for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cluster")
            .field("id", &self.id)
            .field("sum_d", &self.sum_d)
            .field("npoints", &self.npoints)
            .field("centroid_bits", &self.centroid.len())
            .finish()
    }
}

/// Result of quantizing one vector.
///
/// Both fields are `None` when there was no codebook to match against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QResults {
    /// ID of the nearest cluster.
    pub word: Option<u32>,

    /// Hamming distance to that cluster's centroid.
    pub dist: Option<u32>,
}

impl QResults {
    /// The "no match" sentinel.
    pub const NONE: QResults = QResults {
        word: None,
        dist: None,
    };

    pub(crate) fn matched(word: u32, dist: u32) -> Self {
        Self {
            word: Some(word),
            dist: Some(dist),
        }
    }

    /// True if a word was found.
    pub fn is_match(&self) -> bool {
        self.word.is_some()
    }
}

/// Dense, ID-ordered collection of clusters.
///
/// A codebook is built once (by [`crate::Trainer`] or
/// [`Codebook::deserialize`]) and then only read. Serving code swaps whole
/// codebooks through [`crate::SharedCodebook`] instead of mutating one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Codebook {
    clusters: Vec<Cluster>,
}

impl Codebook {
    /// Creates an empty codebook.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a codebook from clusters already in ID order.
    pub fn from_clusters(clusters: Vec<Cluster>) -> Self {
        Self { clusters }
    }

    /// Replaces all clusters.
    pub fn set(&mut self, clusters: Vec<Cluster>) {
        self.clusters = clusters;
    }

    /// Returns all clusters in ID order.
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// Appends one cluster.
    pub fn put(&mut self, cluster: Cluster) {
        self.clusters.push(cluster);
    }

    /// Returns the cluster for `word`.
    pub fn get(&self, word: u32) -> Result<&Cluster, CodebookError> {
        self.clusters
            .get(word as usize)
            .ok_or(CodebookError::OutOfRange {
                word,
                size: self.clusters.len(),
            })
    }

    /// Number of clusters (vocabulary size).
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// True if the codebook has no clusters.
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Centroid width in bits, taken from the first cluster.
    pub fn width(&self) -> Option<usize> {
        self.clusters.first().map(|c| c.centroid.len())
    }

    /// Iterates the centroids in ID order.
    pub fn centroids(&self) -> impl Iterator<Item = &BinaryVector> + '_ {
        self.clusters.iter().map(|c| &c.centroid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster(id: u32, hex: &str) -> Cluster {
        Cluster::new(id, BinaryVector::from_hex(16, hex).unwrap())
    }

    #[test]
    fn put_get_and_size() {
        let mut cb = Codebook::new();
        assert!(cb.is_empty());
        assert_eq!(cb.width(), None);

        cb.put(cluster(0, "0000"));
        cb.put(cluster(1, "ffff"));
        assert_eq!(cb.len(), 2);
        assert_eq!(cb.width(), Some(16));
        assert_eq!(cb.get(1).unwrap().centroid.count_ones(), 16);
    }

    #[test]
    fn get_out_of_range() {
        let cb = Codebook::from_clusters(vec![cluster(0, "0000")]);
        let err = cb.get(1).unwrap_err();
        assert!(matches!(err, CodebookError::OutOfRange { word: 1, size: 1 }));
    }

    #[test]
    fn set_replaces_everything() {
        let mut cb = Codebook::from_clusters(vec![cluster(0, "0000"), cluster(1, "0100")]);
        cb.set(vec![cluster(0, "ff00")]);
        assert_eq!(cb.len(), 1);
        assert_eq!(cb.clusters()[0].centroid.to_hex(), "ff00");
    }

    #[test]
    fn cluster_equality_covers_all_fields() {
        let a = Cluster {
            id: 3,
            sum_d: 12.0,
            npoints: 4,
            centroid: BinaryVector::from_hex(16, "00ff").unwrap(),
        };
        let mut b = a.clone();
        assert_eq!(a, b);

        b.sum_d = 12.5;
        assert_ne!(a, b);

        let mut c = a.clone();
        c.centroid.flip(0);
        assert_ne!(a, c);

        let mut d = a.clone();
        d.npoints = 5;
        assert_ne!(a, d);
    }

    #[test]
    fn mean_distortion() {
        let mut c = cluster(0, "0000");
        assert!(c.is_degenerate());
        assert_eq!(c.mean_distortion(), None);

        c.sum_d = 9.0;
        c.npoints = 4;
        assert_eq!(c.mean_distortion(), Some(2.25));
    }

    #[test]
    fn sentinel() {
        assert_eq!(QResults::default(), QResults::NONE);
        assert!(!QResults::NONE.is_match());
        assert!(QResults::matched(2, 5).is_match());
    }

    #[test]
    fn debug_omits_centroid_bits() {
        let s = format!("{:?}", cluster(7, "abcd"));
        assert!(s.contains("id: 7"));
        assert!(s.contains("centroid_bits: 16"));
        assert!(!s.contains("abcd"));
    }
}
