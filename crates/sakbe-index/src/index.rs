//! Inverted-file vector index with a brute-force fallback.
//!
//! The index stores L2-normalized vectors and searches them by inner-product
//! distance. Small corpora are scanned exhaustively (`IndexMode::BruteForce`,
//! exact results); once the corpus reaches `train_threshold`, deterministic
//! k-means partitions it into inverted lists and searches probe only the
//! `num_probes` nearest clusters (`IndexMode::Trained`).
//!
//! Training preserves positions: a vector's position is assigned once at
//! insertion and never changes, so external position → document mappings
//! survive the mode transition.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use sakbe_core::{Error, Result};

use crate::types::{IndexConfig, IndexMode, IndexStats, SearchMatch};

/// Norms at or below this are treated as zero and rejected.
const MIN_NORM: f32 = 1e-6;

/// Approximate-nearest-neighbor index over L2-normalized vectors.
///
/// One dimension per index, fixed at construction. All mutation happens
/// through `&mut self`; callers that share an index across tasks wrap it in
/// their own lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndex {
    dimension: usize,
    config: IndexConfig,
    mode: IndexMode,
    /// Every vector ever accepted, in insertion order. Index = position.
    vectors: Vec<Vec<f32>>,
    /// k-means centroids. Empty while brute-force.
    centroids: Vec<Vec<f32>>,
    /// Inverted lists: `lists[c]` holds the positions assigned to centroid `c`.
    lists: Vec<Vec<usize>>,
}

impl VectorIndex {
    /// Create an empty index for vectors of the given dimension.
    pub fn new(dimension: usize, config: IndexConfig) -> Result<Self> {
        if dimension == 0 {
            return Err(Error::config("index dimension must be non-zero"));
        }
        Ok(Self {
            dimension,
            config,
            mode: IndexMode::BruteForce,
            vectors: Vec::new(),
            centroids: Vec::new(),
            lists: Vec::new(),
        })
    }

    /// Add a vector and return its assigned position.
    ///
    /// The vector is validated (dimension, finite components, non-zero norm)
    /// and L2-normalized before storage; on rejection the index is unchanged.
    /// Positions are dense and monotonically increasing.
    ///
    /// Reaching `train_threshold` triggers training before this call returns,
    /// so a caller never observes a corpus at the threshold still in
    /// brute-force mode. In trained mode the new vector is routed into the
    /// inverted list of its nearest centroid.
    pub fn add(&mut self, vector: &[f32]) -> Result<usize> {
        let normalized = self.normalized(vector)?;
        let position = self.vectors.len();
        self.vectors.push(normalized);

        match self.mode {
            IndexMode::BruteForce => {
                if self.vectors.len() >= self.config.train_threshold {
                    self.train();
                }
            }
            IndexMode::Trained => {
                let centroid = nearest_centroid(&self.centroids, &self.vectors[position]);
                self.lists[centroid].push(position);
            }
        }

        Ok(position)
    }

    /// Run k-means over the current corpus and switch to trained mode.
    ///
    /// Returns `true` if the index is in trained mode after the call. With
    /// fewer than two usable clusters (corpus too small) training is skipped
    /// with a warning and the index stays brute-force; a later call may
    /// succeed once more vectors have been added. Calling on an already
    /// trained index is a no-op.
    ///
    /// Positions are never reassigned: training only rebuilds the centroid
    /// set and the inverted lists over the existing positions.
    pub fn train(&mut self) -> bool {
        if self.mode == IndexMode::Trained {
            return true;
        }

        let Some(centroids) = self.run_kmeans() else {
            log::warn!(
                "not enough vectors to train ({} total); index stays brute-force",
                self.vectors.len()
            );
            return false;
        };

        let mut lists: Vec<Vec<usize>> = vec![Vec::new(); centroids.len()];
        for (position, vector) in self.vectors.iter().enumerate() {
            lists[nearest_centroid(&centroids, vector)].push(position);
        }

        log::info!(
            "trained index: {} vectors across {} clusters",
            self.vectors.len(),
            centroids.len()
        );

        self.centroids = centroids;
        self.lists = lists;
        self.mode = IndexMode::Trained;
        true
    }

    /// Deterministic k-means over the stored vectors.
    ///
    /// Initialization picks evenly spaced vectors (`i * n / k`), so repeated
    /// training over the same corpus yields the same centroids. Empty
    /// clusters keep their previous centroid. Returns `None` when fewer than
    /// two clusters are usable.
    fn run_kmeans(&self) -> Option<Vec<Vec<f32>>> {
        let n = self.vectors.len();
        let k = self.config.num_clusters.min(n);
        if k < 2 {
            return None;
        }

        let mut centroids: Vec<Vec<f32>> =
            (0..k).map(|i| self.vectors[i * n / k].clone()).collect();
        let mut assignments = vec![0usize; n];

        for _ in 0..self.config.max_kmeans_iterations.max(1) {
            // Assign each vector to its nearest centroid.
            let mut changed = false;
            for (position, vector) in self.vectors.iter().enumerate() {
                let nearest = nearest_centroid(&centroids, vector);
                if assignments[position] != nearest {
                    assignments[position] = nearest;
                    changed = true;
                }
            }

            // Recompute centroids as the mean of their members.
            let mut sums = vec![vec![0.0f32; self.dimension]; k];
            let mut counts = vec![0usize; k];
            for (position, vector) in self.vectors.iter().enumerate() {
                let cluster = assignments[position];
                counts[cluster] += 1;
                for (sum, component) in sums[cluster].iter_mut().zip(vector) {
                    *sum += component;
                }
            }
            for (cluster, sum) in sums.into_iter().enumerate() {
                if counts[cluster] > 0 {
                    centroids[cluster] = sum
                        .into_iter()
                        .map(|s| s / counts[cluster] as f32)
                        .collect();
                }
            }

            if !changed {
                break;
            }
        }

        Some(centroids)
    }

    /// Find the `k` nearest vectors to `query`.
    ///
    /// The query is validated and normalized exactly like an inserted vector.
    /// Brute-force mode scans every vector (exact); trained mode probes the
    /// `num_probes` nearest centroids' lists (approximate). Results are
    /// sorted by ascending distance, ties broken by ascending position. An
    /// empty index or `k == 0` yields an empty vec.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchMatch>> {
        let query = self.normalized(query)?;
        if k == 0 || self.vectors.is_empty() {
            return Ok(Vec::new());
        }

        let mut matches: Vec<SearchMatch> = match self.mode {
            IndexMode::BruteForce => self
                .vectors
                .iter()
                .enumerate()
                .map(|(position, vector)| SearchMatch {
                    position,
                    distance: distance(&query, vector),
                })
                .collect(),
            IndexMode::Trained => self
                .probe_clusters(&query)
                .into_iter()
                .flat_map(|cluster| self.lists[cluster].iter().copied())
                .map(|position| SearchMatch {
                    position,
                    distance: distance(&query, &self.vectors[position]),
                })
                .collect(),
        };

        matches.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(Ordering::Equal)
                .then(a.position.cmp(&b.position))
        });
        matches.truncate(k);
        Ok(matches)
    }

    /// The `num_probes` clusters nearest to the query, nearest first.
    fn probe_clusters(&self, query: &[f32]) -> Vec<usize> {
        let mut ranked: Vec<(usize, f32)> = self
            .centroids
            .iter()
            .enumerate()
            .map(|(cluster, centroid)| (cluster, distance(query, centroid)))
            .collect();
        ranked.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        ranked.truncate(self.config.num_probes.max(1));
        ranked.into_iter().map(|(cluster, _)| cluster).collect()
    }

    /// Validate a vector and return its L2-normalized copy.
    fn normalized(&self, vector: &[f32]) -> Result<Vec<f32>> {
        if vector.len() != self.dimension {
            return Err(Error::invalid_vector(format!(
                "expected dimension {}, got {}",
                self.dimension,
                vector.len()
            )));
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(Error::invalid_vector("non-finite component"));
        }
        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm <= MIN_NORM {
            return Err(Error::invalid_vector("zero norm"));
        }
        Ok(vector.iter().map(|v| v / norm).collect())
    }

    /// Number of vectors in the index.
    pub fn ntotal(&self) -> usize {
        self.vectors.len()
    }

    /// Current search strategy.
    pub fn mode(&self) -> IndexMode {
        self.mode
    }

    /// Embedding dimension accepted by this index.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// The configuration the index was built with.
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Statistics snapshot.
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            ntotal: self.vectors.len(),
            dimension: self.dimension,
            mode: self.mode,
            num_clusters: self.centroids.len(),
        }
    }
}

/// Inner-product distance between two vectors: `1.0 − dot`, clamped to
/// `[0.0, 2.0]` against float drift. Assumes both inputs are normalized.
fn distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    (1.0 - dot).clamp(0.0, 2.0)
}

/// Index of the centroid nearest to `vector`.
fn nearest_centroid(centroids: &[Vec<f32>], vector: &[f32]) -> usize {
    let mut best = 0;
    let mut best_distance = f32::MAX;
    for (cluster, centroid) in centroids.iter().enumerate() {
        let d = distance(vector, centroid);
        if d < best_distance {
            best = cluster;
            best_distance = d;
        }
    }
    best
}

// ============================================================================
// Tests
// ============================================================================
