//! Dimensionality reducer: projects the embedding batch into 3-D for
//! display while preserving local neighborhood structure.
//!
//! The projection builds a cosine k-nearest-neighbor graph over the
//! length-normalized embeddings, then runs a seeded force layout: points
//! attract along graph edges down to a minimum spacing, and repel a sampled
//! set of non-neighbors. Entirely deterministic for a fixed seed. The
//! output feeds the scene only; cluster assignment never reads it.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::ProjectionConfig;

const NEGATIVE_SAMPLES: usize = 5;
const INIT_SPREAD: f32 = 10.0;
const REPULSION: f32 = 1.0;
const MAX_STEP: f32 = 4.0;

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Cosine k-nearest neighbors per point. Inputs are unit-normalized, so
/// the cosine distance is `1 - dot`.
fn knn_edges(vectors: &[Vec<f32>], k: usize) -> Vec<(usize, usize)> {
    let n = vectors.len();
    let neighbor_lists: Vec<Vec<usize>> = (0..n)
        .into_par_iter()
        .map(|i| {
            let mut scored: Vec<(usize, f32)> = (0..n)
                .filter(|&j| j != i)
                .map(|j| (j, 1.0 - dot(&vectors[i], &vectors[j])))
                .collect();
            scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
            scored.truncate(k);
            scored.into_iter().map(|(j, _)| j).collect()
        })
        .collect();

    let mut edges = Vec::with_capacity(n * k);
    for (i, neighbors) in neighbor_lists.into_iter().enumerate() {
        for j in neighbors {
            edges.push((i, j));
        }
    }
    edges
}

fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn norm_sq(v: [f32; 3]) -> f32 {
    v[0] * v[0] + v[1] * v[1] + v[2] * v[2]
}

fn clip(x: f32) -> f32 {
    x.clamp(-MAX_STEP, MAX_STEP)
}

/// Project the embedding batch to 3-D coordinates, one per input vector.
pub fn project_3d(vectors: &[Vec<f32>], cfg: &ProjectionConfig) -> Vec<[f32; 3]> {
    let n = vectors.len();
    if n == 0 {
        return Vec::new();
    }

    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let mut positions: Vec<[f32; 3]> = (0..n)
        .map(|_| {
            [
                (rng.random::<f32>() - 0.5) * 2.0 * INIT_SPREAD,
                (rng.random::<f32>() - 0.5) * 2.0 * INIT_SPREAD,
                (rng.random::<f32>() - 0.5) * 2.0 * INIT_SPREAD,
            ]
        })
        .collect();

    if n < 3 {
        return positions;
    }

    let k = cfg.n_neighbors.min(n - 1);
    let start = std::time::Instant::now();
    let edges = knn_edges(vectors, k);
    debug!(
        "Neighbor graph built - points={}, k={}, edges={}, duration={:.2}s",
        n,
        k,
        edges.len(),
        start.elapsed().as_secs_f32()
    );

    let min_dist = cfg.min_dist.max(1e-3);
    for epoch in 0..cfg.epochs {
        let alpha = 1.0 - epoch as f32 / cfg.epochs as f32;

        for &(i, j) in &edges {
            // attract endpoints toward the minimum spacing
            let diff = sub(positions[i], positions[j]);
            let d = norm_sq(diff).sqrt();
            if d > min_dist {
                let pull = alpha * (d - min_dist) / d * 0.5;
                for axis in 0..3 {
                    let step = clip(diff[axis] * pull);
                    positions[i][axis] -= step;
                    positions[j][axis] += step;
                }
            }

            // repel a handful of sampled points from the moving endpoint
            for _ in 0..NEGATIVE_SAMPLES {
                let t = rng.random_range(0..n);
                if t == i || t == j {
                    continue;
                }
                let mut diff = sub(positions[i], positions[t]);
                let mut d2 = norm_sq(diff);
                if d2 < 1e-8 {
                    // coincident points: nudge along a random direction
                    diff = [
                        rng.random::<f32>() - 0.5,
                        rng.random::<f32>() - 0.5,
                        rng.random::<f32>() - 0.5,
                    ];
                    d2 = norm_sq(diff).max(1e-8);
                }
                let push = alpha * REPULSION / (1.0 + d2);
                let inv = push / d2.sqrt();
                for axis in 0..3 {
                    positions[i][axis] += clip(diff[axis] * inv);
                }
            }
        }
    }

    // center the layout on the origin
    let mut mean = [0.0f32; 3];
    for p in &positions {
        for axis in 0..3 {
            mean[axis] += p[axis];
        }
    }
    for axis in 0..3 {
        mean[axis] /= n as f32;
    }
    for p in &mut positions {
        for axis in 0..3 {
            p[axis] -= mean[axis];
        }
    }

    info!(
        "Projection completed - points={}, epochs={}, duration={:.2}s",
        n,
        cfg.epochs,
        start.elapsed().as_secs_f32()
    );
    positions
}
