//! Cluster assigner: seeded k-means over the full-dimensional embedding
//! vectors, plus the silhouette quality score reported with the scene.
//!
//! The 3-D projection is never an input here; grouping decisions always use
//! the original embedding space.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct KMeansResult {
    /// Cluster id in `[0, k)` per input vector.
    pub assignments: Vec<usize>,
    pub centroids: Vec<Vec<f32>>,
    pub k: usize,
}

impl KMeansResult {
    /// Member counts per cluster slot; empty slots report zero.
    pub fn member_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.k];
        for &a in &self.assignments {
            counts[a] += 1;
        }
        counts
    }
}

fn sq_dist(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn mean_of(vectors: &[Vec<f32>], members: &[usize]) -> Vec<f32> {
    let dim = vectors[members[0]].len();
    let mut mean = vec![0.0f32; dim];
    for &i in members {
        for (m, v) in mean.iter_mut().zip(&vectors[i]) {
            *m += v;
        }
    }
    let n = members.len() as f32;
    for m in &mut mean {
        *m /= n;
    }
    mean
}

/// Seeded k-means with k-means++ initialization. Always returns exactly `k`
/// cluster slots; a slot losing all its points keeps its last centroid and
/// simply ends with zero members.
pub fn kmeans(vectors: &[Vec<f32>], k: usize, seed: u64, max_iterations: usize) -> KMeansResult {
    let n = vectors.len();
    assert!(k > 0, "cluster count must be positive");

    if n <= k {
        // Degenerate corpus: one point per slot, remaining slots empty.
        let centroids = (0..k)
            .map(|i| vectors.get(i).cloned().unwrap_or_else(|| vectors[0].clone()))
            .collect();
        return KMeansResult {
            assignments: (0..n).collect(),
            centroids,
            k,
        };
    }

    let mut rng = StdRng::seed_from_u64(seed);

    // k-means++ roulette initialization
    let mut centroids: Vec<Vec<f32>> = Vec::with_capacity(k);
    centroids.push(vectors[rng.random_range(0..n)].clone());
    while centroids.len() < k {
        let dists: Vec<f32> = vectors
            .par_iter()
            .map(|v| {
                centroids
                    .iter()
                    .map(|c| sq_dist(v, c))
                    .fold(f32::MAX, f32::min)
            })
            .collect();
        let total: f32 = dists.iter().sum();
        if total <= 0.0 {
            centroids.push(vectors[rng.random_range(0..n)].clone());
            continue;
        }
        let threshold = rng.random::<f32>() * total;
        let mut cumsum = 0.0f32;
        let mut chosen = n - 1;
        for (i, &d) in dists.iter().enumerate() {
            cumsum += d;
            if cumsum >= threshold {
                chosen = i;
                break;
            }
        }
        centroids.push(vectors[chosen].clone());
    }

    let mut assignments = vec![0usize; n];
    for iter in 0..max_iterations {
        let next: Vec<usize> = vectors
            .par_iter()
            .map(|v| {
                let mut best = 0;
                let mut best_d = f32::MAX;
                for (ki, c) in centroids.iter().enumerate() {
                    let d = sq_dist(v, c);
                    if d < best_d {
                        best_d = d;
                        best = ki;
                    }
                }
                best
            })
            .collect();

        let changed = next != assignments;
        assignments = next;
        if !changed && iter > 0 {
            debug!("k-means converged - iterations={}", iter);
            break;
        }

        for ki in 0..k {
            let members: Vec<usize> = (0..n).filter(|&i| assignments[i] == ki).collect();
            if !members.is_empty() {
                centroids[ki] = mean_of(vectors, &members);
            }
        }
    }

    let result = KMeansResult {
        assignments,
        centroids,
        k,
    };
    info!(
        "Clustering completed - k={}, points={}, non_empty={}",
        k,
        n,
        result.member_counts().iter().filter(|&&c| c > 0).count()
    );
    result
}

/// Mean silhouette over all points (euclidean): separation to the nearest
/// other cluster versus cohesion within the own cluster, each in [-1, 1].
/// Points in singleton clusters contribute zero.
pub fn silhouette_score(vectors: &[Vec<f32>], assignments: &[usize], k: usize) -> f32 {
    let n = vectors.len();
    if n < 2 || k < 2 {
        return 0.0;
    }

    let scores: Vec<f32> = (0..n)
        .into_par_iter()
        .map(|i| {
            let own = assignments[i];
            let mut sums = vec![0.0f64; k];
            let mut counts = vec![0usize; k];
            for j in 0..n {
                if i == j {
                    continue;
                }
                let d = sq_dist(&vectors[i], &vectors[j]).sqrt() as f64;
                sums[assignments[j]] += d;
                counts[assignments[j]] += 1;
            }

            if counts[own] == 0 {
                return 0.0; // singleton cluster
            }
            let a = sums[own] / counts[own] as f64;

            let mut b = f64::MAX;
            for c in 0..k {
                if c != own && counts[c] > 0 {
                    b = b.min(sums[c] / counts[c] as f64);
                }
            }
            if b == f64::MAX {
                return 0.0; // no other populated cluster
            }

            let denom = a.max(b);
            if denom > 0.0 {
                ((b - a) / denom) as f32
            } else {
                0.0
            }
        })
        .collect();

    scores.iter().sum::<f32>() / n as f32
}
