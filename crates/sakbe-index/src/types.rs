//! Common types for the vector index.
//!
//! These types are shared by the index itself, the snapshot artifacts, and
//! the service layer's statistics reporting.

use serde::{Deserialize, Serialize};

// ============================================================================
// Configuration
// ============================================================================

/// Vector index configuration.
///
/// Controls when the index transitions from exact brute-force search to
/// approximate inverted-list search, and how that approximate search behaves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Corpus size at which training is triggered automatically.
    #[serde(default = "default_train_threshold")]
    pub train_threshold: usize,

    /// Number of k-means clusters (inverted lists) after training.
    ///
    /// Capped at the corpus size when the corpus is smaller.
    #[serde(default = "default_num_clusters")]
    pub num_clusters: usize,

    /// Number of nearest clusters probed per search.
    #[serde(default = "default_num_probes")]
    pub num_probes: usize,

    /// Iteration cap for the k-means assign/update loop.
    #[serde(default = "default_max_kmeans_iterations")]
    pub max_kmeans_iterations: usize,
}

fn default_train_threshold() -> usize {
    10_000
}

fn default_num_clusters() -> usize {
    1_024
}

fn default_num_probes() -> usize {
    64
}

fn default_max_kmeans_iterations() -> usize {
    10
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            train_threshold: default_train_threshold(),
            num_clusters: default_num_clusters(),
            num_probes: default_num_probes(),
            max_kmeans_iterations: default_max_kmeans_iterations(),
        }
    }
}

// ============================================================================
// Index mode
// ============================================================================

/// Search strategy the index is currently using.
///
/// Every index starts in `BruteForce` (exact scan over all vectors) and
/// transitions to `Trained` (inverted-list probing) once k-means training
/// succeeds. The transition is explicit state, never inferred from errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexMode {
    /// Exact exhaustive scan. Ground truth for small corpora.
    BruteForce,
    /// Approximate search probing the nearest clusters' inverted lists.
    Trained,
}

impl IndexMode {
    /// Short lowercase label for logs and stats output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BruteForce => "brute-force",
            Self::Trained => "trained",
        }
    }
}

impl std::fmt::Display for IndexMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Search matches
// ============================================================================

/// A single index match: the vector's position and its distance to the query.
///
/// Distance is `1.0 − dot` over L2-normalized vectors, clamped to
/// `[0.0, 2.0]`; `0.0` means identical direction, `2.0` means opposite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchMatch {
    /// Position assigned when the vector was added.
    pub position: usize,

    /// Distance from the query vector.
    pub distance: f32,
}

impl SearchMatch {
    /// Cosine similarity implied by the distance, in `[-1.0, 1.0]`.
    pub fn similarity(&self) -> f32 {
        1.0 - self.distance
    }
}

// ============================================================================
// Index statistics
// ============================================================================

/// Statistics snapshot of a vector index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of vectors in the index.
    pub ntotal: usize,

    /// Embedding dimension.
    pub dimension: usize,

    /// Current search strategy.
    pub mode: IndexMode,

    /// Number of trained clusters (0 while brute-force).
    pub num_clusters: usize,
}

// ============================================================================
// Tests
// ============================================================================
