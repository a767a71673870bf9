//! Common types for the semantic index service.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use sakbe_core::{Error, Result};
use sakbe_index::{IndexConfig, IndexStats};

// ============================================================================
// Service configuration
// ============================================================================

/// Configuration for [`crate::SemanticIndexService`].
///
/// Snapshots are written only when `snapshot_dir` is set; without it the
/// service is purely in-memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Embedding dimension for a freshly created index.
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Vector index tuning.
    #[serde(default)]
    pub index: IndexConfig,

    /// Maximum embedding cache entries.
    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: usize,

    /// Directory holding the snapshot artifacts.
    pub snapshot_dir: Option<PathBuf>,

    /// Accepted insertions between automatic snapshots.
    #[serde(default = "default_snapshot_every_insertions")]
    pub snapshot_every_insertions: usize,

    /// Retry attempts for transient embedding failures during ingestion.
    #[serde(default = "default_retry_max_attempts")]
    pub retry_max_attempts: u32,

    /// Initial retry delay in milliseconds.
    #[serde(default = "default_retry_initial_delay_ms")]
    pub retry_initial_delay_ms: u64,

    /// Maximum retry delay in milliseconds.
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

fn default_dimension() -> usize {
    768
}

fn default_cache_max_entries() -> usize {
    10_000
}

fn default_snapshot_every_insertions() -> usize {
    100
}

fn default_retry_max_attempts() -> u32 {
    3
}

fn default_retry_initial_delay_ms() -> u64 {
    250
}

fn default_retry_max_delay_ms() -> u64 {
    2_000
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            dimension: default_dimension(),
            index: IndexConfig::default(),
            cache_max_entries: default_cache_max_entries(),
            snapshot_dir: None,
            snapshot_every_insertions: default_snapshot_every_insertions(),
            retry_max_attempts: default_retry_max_attempts(),
            retry_initial_delay_ms: default_retry_initial_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl ServiceConfig {
    /// Set the snapshot directory.
    pub fn with_snapshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.snapshot_dir = Some(dir.into());
        self
    }

    /// Set the embedding dimension.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }
}

// ============================================================================
// Ingestion types
// ============================================================================

/// A document submitted for ingestion.
///
/// Matches the JSONL record shape accepted by batch ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDocument {
    /// Text to embed and store.
    pub text: String,

    /// Language code of the text.
    pub language: String,

    /// Arbitrary metadata key-value pairs.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl NewDocument {
    /// Create a record with no metadata.
    pub fn new(text: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: language.into(),
            metadata: HashMap::new(),
        }
    }

    /// Add a metadata key-value pair.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

// ============================================================================
// Search types
// ============================================================================

/// Largest additive boost either tag overlap may contribute.
pub const MAX_BOOST: f32 = 0.1;

/// Parameters for a similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Maximum hits to return.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Minimum raw similarity for a hit.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Whether documents in other languages may be returned.
    #[serde(default = "default_cross_lingual")]
    pub cross_lingual: bool,

    /// Additive boost when cultural tags overlap the query's.
    #[serde(default = "default_cultural_boost")]
    pub cultural_boost: f32,

    /// Additive boost when phonetic tags overlap the query's.
    #[serde(default = "default_phonetic_boost")]
    pub phonetic_boost: f32,

    /// Candidate multiplier: the index is asked for `top_k × factor`
    /// candidates so threshold and language filtering still leave enough.
    #[serde(default = "default_oversample_factor")]
    pub oversample_factor: usize,
}

fn default_top_k() -> usize {
    10
}

fn default_similarity_threshold() -> f32 {
    0.7
}

fn default_cross_lingual() -> bool {
    true
}

fn default_cultural_boost() -> f32 {
    0.1
}

fn default_phonetic_boost() -> f32 {
    0.05
}

fn default_oversample_factor() -> usize {
    2
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            similarity_threshold: default_similarity_threshold(),
            cross_lingual: default_cross_lingual(),
            cultural_boost: default_cultural_boost(),
            phonetic_boost: default_phonetic_boost(),
            oversample_factor: default_oversample_factor(),
        }
    }
}

impl SearchOptions {
    /// Set the number of hits to return.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set the similarity threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    /// Restrict results to the query language.
    pub fn same_language_only(mut self) -> Self {
        self.cross_lingual = false;
        self
    }

    /// Set the cultural boost.
    pub fn with_cultural_boost(mut self, boost: f32) -> Self {
        self.cultural_boost = boost;
        self
    }

    /// Set the phonetic boost.
    pub fn with_phonetic_boost(mut self, boost: f32) -> Self {
        self.phonetic_boost = boost;
        self
    }

    /// Check that boosts are small, bounded, non-negative adjustments.
    ///
    /// Out-of-range boosts are rejected rather than clamped, so a
    /// misconfigured caller learns immediately instead of silently getting
    /// different ranking behavior.
    pub fn validate(&self) -> Result<()> {
        for (name, boost) in [
            ("cultural_boost", self.cultural_boost),
            ("phonetic_boost", self.phonetic_boost),
        ] {
            if !boost.is_finite() || !(0.0..=MAX_BOOST).contains(&boost) {
                return Err(Error::validation(format!(
                    "{name} must be within [0.0, {MAX_BOOST}], got {boost}"
                )));
            }
        }
        if !self.similarity_threshold.is_finite() {
            return Err(Error::validation("similarity_threshold must be finite"));
        }
        Ok(())
    }
}

/// A ranked search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// Matched document ID.
    pub document_id: String,

    /// Matched document text.
    pub text: String,

    /// Matched document language.
    pub language: String,

    /// Raw cosine similarity to the query, in `[-1.0, 1.0]`.
    pub similarity: f32,

    /// Similarity plus tag boosts, capped at 1.0. Ranking key.
    pub adjusted_score: f32,

    /// Whether the document's cultural tags overlap the query's.
    pub cultural_match: bool,

    /// Whether the document's phonetic tags overlap the query's.
    pub phonetic_match: bool,

    /// Metadata stored with the document.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

// ============================================================================
// Statistics
// ============================================================================

/// Point-in-time service statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStats {
    /// Number of stored documents.
    pub document_count: usize,

    /// Documents per language, sorted by language code.
    pub languages: BTreeMap<String, usize>,

    /// Vector index state.
    pub index: IndexStats,

    /// Embedding cache entries currently held.
    pub cache_entries: usize,

    /// Cache lookups served without a backend call.
    pub cache_hits: u64,

    /// Cache lookups that required a backend call.
    pub cache_misses: u64,

    /// Accepted insertions since the last snapshot was triggered.
    pub insertions_since_snapshot: usize,
}

// ============================================================================
// Tests
// ============================================================================
