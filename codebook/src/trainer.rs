use std::collections::HashSet;

use giztoy_binvec::BinaryVector;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::quantizer::nearest;
use crate::{Cluster, Codebook, CodebookError};

/// Controls codebook training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// Vocabulary size: the number of clusters to produce.
    pub k: usize,

    /// Upper bound on assignment/update rounds.
    /// Default: 100.
    pub max_iter: usize,

    /// Seed for choosing the first initial centroid.
    pub seed: u64,

    /// Stop once an iteration lowers total distortion by less than this.
    /// Default: 0.0 (only stop on a stable assignment or `max_iter`).
    pub conv_threshold: f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            k: 0,
            max_iter: 100,
            seed: 0,
            conv_threshold: 0.0,
        }
    }
}

impl TrainConfig {
    /// Config for `k` clusters with default hyperparameters.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            ..Self::default()
        }
    }

    fn with_defaults(mut self) -> Self {
        if self.max_iter == 0 {
            self.max_iter = 100;
        }
        self
    }

    fn validate(&self) -> Result<(), CodebookError> {
        if self.k == 0 {
            return Err(CodebookError::InvalidConfig("k must be positive".into()));
        }
        if u32::try_from(self.k).is_err() {
            return Err(CodebookError::InvalidConfig(format!(
                "k={} does not fit a 32-bit word ID",
                self.k
            )));
        }
        if !self.conv_threshold.is_finite() || self.conv_threshold < 0.0 {
            return Err(CodebookError::InvalidConfig(format!(
                "conv_threshold must be a non-negative number, got {}",
                self.conv_threshold
            )));
        }
        Ok(())
    }
}

/// Why training stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// No point changed cluster, or the centroids stopped moving.
    Stable,
    /// Distortion improvement fell below `conv_threshold`.
    Converged,
    /// `max_iter` rounds ran.
    MaxIter,
}

/// Point indices assigned to each cluster, keyed by cluster ID.
///
/// Only training produces this table; codebooks never carry it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Membership {
    members: Vec<Vec<usize>>,
}

impl Membership {
    /// Training-set indices assigned to cluster `id`. Empty for unknown IDs.
    pub fn points(&self, id: u32) -> &[usize] {
        self.members
            .get(id as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of clusters covered.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Output of [`Trainer::train`].
#[derive(Debug, Clone)]
pub struct Training {
    pub codebook: Codebook,
    pub membership: Membership,
    pub iterations: usize,
    /// Total distortion: sum over points of the distance to their centroid.
    pub distortion: u64,
    pub stop: StopReason,
}

impl Training {
    /// Drops the membership table and returns the serving codebook.
    pub fn into_codebook(self) -> Codebook {
        self.codebook
    }
}

/// Builds codebooks with k-means in Hamming space.
///
/// # Algorithm
///
/// 1. Farthest-point seeding: the first centroid is a point chosen with
///    `seed`; every next centroid is the point farthest from its nearest
///    chosen centroid (ties to the lowest point index).
/// 2. Assignment: each point joins its nearest centroid, ties to the lowest
///    cluster ID. This is the same rule [`Codebook::quantize`] uses.
/// 3. Update: each centroid becomes the per-bit majority of its points;
///    an exact tie keeps the previous bit.
/// 4. Empty clusters are re-seeded from the point farthest from its
///    centroid, taken from a cluster that keeps at least one point, and the
///    assignment is redone.
///
/// Assignment runs in parallel over points and the update in parallel over
/// clusters. Per-cluster sums are integers collected in point order, so the
/// result does not depend on the thread count.
pub struct Trainer {
    cfg: TrainConfig,
}

impl Trainer {
    pub fn new(cfg: TrainConfig) -> Self {
        Self {
            cfg: cfg.with_defaults(),
        }
    }

    pub fn config(&self) -> &TrainConfig {
        &self.cfg
    }

    /// Trains a codebook of exactly `k` non-degenerate clusters.
    ///
    /// The point index used in [`Membership`] is the position in `points`.
    /// Fails before any work if the config is invalid, the points differ in
    /// width, or there are fewer than `k` distinct points.
    pub fn train(&self, points: &[BinaryVector]) -> Result<Training, CodebookError> {
        self.cfg.validate()?;
        let k = self.cfg.k;

        let width = points.first().map(BinaryVector::len).unwrap_or(0);
        if let Some(p) = points.iter().find(|p| p.len() != width) {
            return Err(CodebookError::DimensionMismatch {
                expected: width,
                got: p.len(),
            });
        }
        let distinct = points.iter().collect::<HashSet<_>>().len();
        if distinct < k {
            return Err(CodebookError::TooFewPoints { k, distinct });
        }

        let mut centroids = seed_centroids(points, k, self.cfg.seed)?;
        let mut current = assign_repairing(points, &mut centroids)?;
        let mut distortion = current.distortion();
        let mut iterations = 0;
        let mut stop = StopReason::MaxIter;

        while iterations < self.cfg.max_iter {
            iterations += 1;

            let mut next = update_centroids(points, &centroids, &current);
            if next == centroids {
                stop = StopReason::Stable;
                break;
            }
            let assignment = assign_repairing(points, &mut next)?;
            let changed = assignment
                .labels
                .iter()
                .zip(&current.labels)
                .filter(|(a, b)| a != b)
                .count();
            let total = assignment.distortion();
            let improvement = distortion as f64 - total as f64;
            debug!(iteration = iterations, changed, distortion = total, "codebook: training round");

            centroids = next;
            current = assignment;
            distortion = total;

            if changed == 0 {
                stop = StopReason::Stable;
                break;
            }
            if improvement < self.cfg.conv_threshold {
                stop = StopReason::Converged;
                break;
            }
        }

        let clusters = centroids
            .into_iter()
            .enumerate()
            .map(|(i, centroid)| Cluster {
                id: i as u32,
                sum_d: current.sum_d[i] as f32,
                npoints: current.members[i].len() as u32,
                centroid,
            })
            .collect();

        info!(
            k,
            points = points.len(),
            iterations,
            distortion,
            stop = ?stop,
            "codebook: training done"
        );

        Ok(Training {
            codebook: Codebook::from_clusters(clusters),
            membership: Membership {
                members: current.members,
            },
            iterations,
            distortion,
            stop,
        })
    }
}

/// One assignment pass: nearest cluster and distance per point.
struct Assignment {
    labels: Vec<u32>,
    dists: Vec<u32>,
    members: Vec<Vec<usize>>,
    sum_d: Vec<u64>,
}

impl Assignment {
    fn distortion(&self) -> u64 {
        self.sum_d.iter().sum()
    }

    fn empty_clusters(&self) -> Vec<usize> {
        self.members
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_empty())
            .map(|(c, _)| c)
            .collect()
    }
}

fn seed_centroids(
    points: &[BinaryVector],
    k: usize,
    seed: u64,
) -> Result<Vec<BinaryVector>, CodebookError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let first = points[rng.gen_range(0..points.len())].clone();

    let mut closest: Vec<u32> = points
        .par_iter()
        .map(|p| p.hamming(&first))
        .collect::<Result<_, _>>()?;
    let mut centroids = Vec::with_capacity(k);
    centroids.push(first);

    while centroids.len() < k {
        let (idx, dist) = farthest(closest.iter().copied().enumerate());
        if dist == 0 {
            // Every point already equals a centroid.
            return Err(CodebookError::TooFewPoints {
                k,
                distinct: centroids.len(),
            });
        }
        let c = points[idx].clone();
        closest
            .par_iter_mut()
            .zip(points.par_iter())
            .try_for_each(|(best, p)| {
                let d = p.hamming(&c)?;
                if d < *best {
                    *best = d;
                }
                Ok::<(), CodebookError>(())
            })?;
        centroids.push(c);
    }
    Ok(centroids)
}

/// Largest distance, ties to the lowest index.
fn farthest(dists: impl Iterator<Item = (usize, u32)>) -> (usize, u32) {
    let mut best = (0, 0);
    for (i, d) in dists {
        if d > best.1 {
            best = (i, d);
        }
    }
    best
}

fn assign(points: &[BinaryVector], centroids: &[BinaryVector]) -> Result<Assignment, CodebookError> {
    let nearest_of: Vec<(u32, u32)> = points
        .par_iter()
        .map(|p| {
            nearest(centroids, p)?
                .ok_or_else(|| CodebookError::InvalidConfig("no centroids to assign to".into()))
        })
        .collect::<Result<_, _>>()?;

    let k = centroids.len();
    let mut members = vec![Vec::new(); k];
    let mut sum_d = vec![0u64; k];
    let mut labels = Vec::with_capacity(points.len());
    let mut dists = Vec::with_capacity(points.len());
    for (i, &(c, d)) in nearest_of.iter().enumerate() {
        members[c as usize].push(i);
        sum_d[c as usize] += d as u64;
        labels.push(c);
        dists.push(d);
    }
    Ok(Assignment {
        labels,
        dists,
        members,
        sum_d,
    })
}

/// Assigns points and re-seeds empty clusters until none is left.
fn assign_repairing(
    points: &[BinaryVector],
    centroids: &mut [BinaryVector],
) -> Result<Assignment, CodebookError> {
    let k = centroids.len();
    for _ in 0..=k {
        let assignment = assign(points, centroids)?;
        let empty = assignment.empty_clusters();
        if empty.is_empty() {
            return Ok(assignment);
        }

        let mut remaining: Vec<usize> = assignment.members.iter().map(Vec::len).collect();
        let mut candidates: Vec<usize> = (0..points.len())
            .filter(|&i| assignment.dists[i] > 0)
            .collect();
        candidates.sort_by(|&a, &b| {
            assignment.dists[b]
                .cmp(&assignment.dists[a])
                .then(a.cmp(&b))
        });

        let mut used: HashSet<&BinaryVector> = HashSet::new();
        let mut candidates = candidates.into_iter();
        let mut reseeded = 0;
        for &c in &empty {
            let pick = candidates.find(|&i| {
                let src = assignment.labels[i] as usize;
                remaining[src] >= 2 && used.insert(&points[i])
            });
            let Some(i) = pick else { break };
            remaining[assignment.labels[i] as usize] -= 1;
            warn!(
                cluster = c,
                point = i,
                dist = assignment.dists[i],
                "codebook: re-seeding empty cluster"
            );
            centroids[c] = points[i].clone();
            reseeded += 1;
        }
        if reseeded == 0 {
            return Err(CodebookError::Degenerate { empty: empty.len() });
        }
    }

    let assignment = assign(points, centroids)?;
    let empty = assignment.empty_clusters().len();
    if empty > 0 {
        return Err(CodebookError::Degenerate { empty });
    }
    Ok(assignment)
}

fn update_centroids(
    points: &[BinaryVector],
    centroids: &[BinaryVector],
    assignment: &Assignment,
) -> Vec<BinaryVector> {
    centroids
        .par_iter()
        .zip(assignment.members.par_iter())
        .map(|(prev, members)| majority(points, members, prev))
        .collect()
}

/// Per-bit majority over `members`; exact ties keep the bit from `prev`.
fn majority(points: &[BinaryVector], members: &[usize], prev: &BinaryVector) -> BinaryVector {
    if members.is_empty() {
        return prev.clone();
    }
    let mut counts = vec![0u64; prev.len()];
    for &i in members {
        for b in points[i].ones() {
            counts[b] += 1;
        }
    }

    let n = members.len() as u64;
    let mut centroid = prev.clone();
    for (b, &ones) in counts.iter().enumerate() {
        match (ones * 2).cmp(&n) {
            std::cmp::Ordering::Greater => centroid.set(b, true),
            std::cmp::Ordering::Less => centroid.set(b, false),
            std::cmp::Ordering::Equal => {}
        }
    }
    centroid
}
