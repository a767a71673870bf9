//! Embedding backend trait and mock implementation.
//!
//! This module defines the `EmbeddingBackend` trait that abstracts over
//! different embedding generation backends (fastembed, remote services, etc.).
//!
//! # Backends
//!
//! - `MockEmbeddingBackend`: Deterministic fixed-dimension vectors for testing
//! - `RetryingBackend`: Wraps any backend with exponential backoff (see [`crate::retry`])
//! - `FastEmbedBackend`: Local embedding via fastembed (requires `embed-fastembed` feature)

use std::fmt;

use async_trait::async_trait;
use sakbe_core::Result;

/// Trait for generating text embeddings.
///
/// Implementations wrap specific embedding libraries or services and provide
/// a uniform async interface. The trait requires `Send + Sync` to allow safe
/// sharing across async tasks.
///
/// # Thread Safety
///
/// Implementations should handle internal synchronization (e.g., `Arc<Mutex<>>`)
/// for thread-unsafe underlying libraries.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for a batch of texts.
    ///
    /// Default implementation calls `embed` for each text sequentially.
    /// Backends that support native batching should override this.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// The embedding dimension.
    fn dimension(&self) -> usize;

    /// Stable backend identifier, incorporating the model name or version.
    ///
    /// The identifier participates in embedding cache keys, so swapping a
    /// backend's model (or bumping its version) invalidates every cached
    /// vector the previous model produced.
    fn name(&self) -> &str;
}

impl fmt::Debug for dyn EmbeddingBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddingBackend")
            .field("name", &self.name())
            .field("dimension", &self.dimension())
            .finish()
    }
}

/// A mock embedding backend for testing.
///
/// Generates deterministic vectors based on the input text bytes, producing
/// consistent embeddings for the same input.
pub struct MockEmbeddingBackend {
    dimension: usize,
    name: String,
}

impl MockEmbeddingBackend {
    /// Create a new mock backend with the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            name: "mock".to_string(),
        }
    }

    /// Override the backend name. Distinct names behave as distinct models.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Generate a deterministic embedding from text.
    fn deterministic_embedding(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimension];
        let bytes = text.as_bytes();

        for (i, val) in embedding.iter_mut().enumerate() {
            // Use byte values to create deterministic but varied components
            let byte_idx = i % bytes.len().max(1);
            let byte_val = if bytes.is_empty() {
                0u8
            } else {
                bytes[byte_idx]
            };
            *val = ((byte_val as f32 + i as f32) % 256.0) / 256.0;
        }

        // Normalize to unit vector
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for val in &mut embedding {
                *val /= norm;
            }
        }

        embedding
    }
}

#[async_trait]
impl EmbeddingBackend for MockEmbeddingBackend {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.deterministic_embedding(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|t| self.deterministic_embedding(t))
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ============================================================================
// Tests
// ============================================================================
