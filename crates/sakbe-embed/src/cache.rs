//! Embedding cache keyed by backend, language, and normalized text.
//!
//! Embedding is the expensive step of both ingestion and query, so computed
//! vectors are cached and persisted alongside the index snapshots. The cache
//! key includes the backend name, which means a model swap or version bump
//! silently invalidates every entry the previous model produced.
//!
//! # Concurrency
//!
//! Lookups take a read lock; computation happens with no lock held; inserts
//! take a write lock. Two tasks missing on the same key may both compute the
//! embedding. The last insert wins and both callers receive a valid vector,
//! which is acceptable because backends are deterministic for a given input.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use sakbe_core::{Error, Result, normalize_language, normalize_text};

use crate::backend::EmbeddingBackend;

/// Default maximum number of cached embeddings.
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// File name of the persisted cache artifact.
pub const EMBEDDING_CACHE_FILE: &str = "embedding.cache";

/// Map plus insertion order, guarded together by one lock.
#[derive(Default)]
struct CacheState {
    map: HashMap<String, Vec<f32>>,
    order: VecDeque<String>,
}

/// On-disk form of the cache: entries in insertion order.
#[derive(Serialize, Deserialize)]
struct CacheFile {
    entries: Vec<(String, Vec<f32>)>,
}

/// Bounded cache of computed embeddings.
///
/// When the cache reaches capacity, the oldest tenth of the entries is
/// evicted before the new entry is inserted, so sustained ingestion does not
/// thrash one slot at a time.
pub struct EmbeddingCache {
    state: RwLock<CacheState>,
    max_entries: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl EmbeddingCache {
    /// Create a cache holding at most `max_entries` embeddings.
    pub fn new(max_entries: usize) -> Self {
        Self {
            state: RwLock::new(CacheState::default()),
            max_entries: max_entries.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Return the cached embedding for `(text, language)` under `backend`,
    /// computing and caching it on a miss.
    pub async fn get_or_compute(
        &self,
        backend: &dyn EmbeddingBackend,
        text: &str,
        language: &str,
    ) -> Result<Vec<f32>> {
        let key = cache_key(backend.name(), language, text);

        {
            let state = self.state.read().await;
            if let Some(vector) = state.map.get(&key) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(vector.clone());
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);

        // Compute with no lock held. Concurrent misses on the same key may
        // both reach this point; last insert wins.
        let vector = backend.embed(text).await?;

        let mut state = self.state.write().await;
        if !state.map.contains_key(&key) {
            if state.map.len() >= self.max_entries {
                evict_oldest(&mut state, self.max_entries / 10);
            }
            state.order.push_back(key.clone());
        }
        state.map.insert(key, vector.clone());
        Ok(vector)
    }

    /// Write the cache to `path` as JSON, preserving insertion order.
    ///
    /// Writes to a temporary sibling file and renames it into place.
    pub async fn flush(&self, path: &Path) -> Result<()> {
        let entries: Vec<(String, Vec<f32>)> = {
            let state = self.state.read().await;
            state
                .order
                .iter()
                .filter_map(|k| state.map.get(k).map(|v| (k.clone(), v.clone())))
                .collect()
        };

        let json = serde_json::to_string(&CacheFile { entries })?;
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| Error::io_with_path(e, &tmp))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| Error::io_with_path(e, path))?;

        log::debug!("flushed embedding cache to {}", path.display());
        Ok(())
    }

    /// Load cache entries from `path`, replacing current contents.
    ///
    /// A missing file leaves the cache empty. A file that exists but cannot
    /// be parsed is a `Persistence` error.
    pub async fn load(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }

        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::io_with_path(e, path))?;
        let file: CacheFile = serde_json::from_str(&json).map_err(|e| {
            Error::persistence(format!(
                "corrupt embedding cache at {}: {e}",
                path.display()
            ))
        })?;

        let mut state = self.state.write().await;
        state.map.clear();
        state.order.clear();
        for (key, vector) in file.entries {
            if state.map.insert(key.clone(), vector).is_none() {
                state.order.push_back(key);
            }
        }

        log::debug!(
            "loaded {} cached embeddings from {}",
            state.map.len(),
            path.display()
        );
        Ok(())
    }

    /// Number of cached embeddings.
    pub async fn len(&self) -> usize {
        self.state.read().await.map.len()
    }

    /// Whether the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Lookups served from the cache since construction.
    pub fn hit_count(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Lookups that required a backend call since construction.
    pub fn miss_count(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

impl Default for EmbeddingCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

/// Cache key: backend name, normalized language, hash of normalized text.
fn cache_key(backend_name: &str, language: &str, text: &str) -> String {
    let text_hash = blake3::hash(normalize_text(text).as_bytes()).to_hex();
    format!(
        "{}:{}:{}",
        backend_name,
        normalize_language(language),
        text_hash
    )
}

/// Drop the `count` oldest entries (at least one).
fn evict_oldest(state: &mut CacheState, count: usize) {
    for _ in 0..count.max(1) {
        match state.order.pop_front() {
            Some(oldest) => {
                state.map.remove(&oldest);
            }
            None => break,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
