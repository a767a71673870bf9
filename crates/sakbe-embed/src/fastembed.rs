//! FastEmbed embedding backend.
//!
//! Wraps the `fastembed` crate to provide local embedding generation
//! via pre-trained models (e.g., multilingual MiniLM, BGE).
//!
//! # Thread Safety
//!
//! `fastembed::TextEmbedding` is not `Send + Sync`, so we wrap it in
//! `Arc<Mutex<>>` and use `tokio::task::spawn_blocking` for embedding calls.
//!
//! # Feature Gate
//!
//! This module requires the `embed-fastembed` feature.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sakbe_core::{Error, Result};

use crate::backend::EmbeddingBackend;

/// Map a model name string to a fastembed `EmbeddingModel` enum variant.
fn resolve_model(name: &str) -> Result<fastembed::EmbeddingModel> {
    match name {
        "multilingual-e5-small" | "MultilingualE5Small" => {
            Ok(fastembed::EmbeddingModel::MultilingualE5Small)
        }
        "multilingual-e5-base" | "MultilingualE5Base" => {
            Ok(fastembed::EmbeddingModel::MultilingualE5Base)
        }
        "bge-small-en-v1.5" | "BGESmallENV15" => Ok(fastembed::EmbeddingModel::BGESmallENV15),
        "all-minilm-l6-v2" | "AllMiniLML6V2" => Ok(fastembed::EmbeddingModel::AllMiniLML6V2),
        other => Err(Error::config(format!(
            "Unknown embedding model: '{other}'. Supported: multilingual-e5-small, multilingual-e5-base, bge-small-en-v1.5, all-minilm-l6-v2"
        ))),
    }
}

/// FastEmbed-based embedding backend.
///
/// Uses locally-downloaded transformer models for embedding generation.
/// The model is loaded once and reused for all subsequent calls.
///
/// # Supported Models
///
/// | Name | Dimension | Size |
/// |------|-----------|------|
/// | `multilingual-e5-small` | 384 | ~120MB |
/// | `multilingual-e5-base` | 768 | ~280MB |
/// | `bge-small-en-v1.5` | 384 | ~50MB |
/// | `all-minilm-l6-v2` | 384 | ~80MB |
pub struct FastEmbedBackend {
    model: Arc<Mutex<fastembed::TextEmbedding>>,
    dimension: usize,
    model_name: String,
}

impl FastEmbedBackend {
    /// Create a new FastEmbed backend with the given model name.
    ///
    /// Downloads the model if not cached locally. The cache directory
    /// can be configured via the `cache_path` parameter.
    ///
    /// # Arguments
    ///
    /// * `model_name` - Model identifier (e.g., "multilingual-e5-small")
    /// * `cache_path` - Optional directory for model file caching
    pub fn new(model_name: &str, cache_path: Option<&str>) -> Result<Self> {
        let model_enum = resolve_model(model_name)?;

        let mut init = fastembed::InitOptions::new(model_enum);
        if let Some(path) = cache_path {
            init = init.with_cache_dir(std::path::PathBuf::from(path));
        }

        let text_embedding = fastembed::TextEmbedding::try_new(init).map_err(|e| {
            Error::backend_unavailable(format!("Failed to initialize fastembed model: {e}"))
        })?;

        // Probe dimension via a test embedding
        let probe = text_embedding.embed(vec!["dimension probe"], None).map_err(|e| {
            Error::backend_unavailable(format!("Failed to probe embedding dimension: {e}"))
        })?;

        let dimension = probe
            .first()
            .map(|v| v.len())
            .ok_or_else(|| Error::backend_unavailable("Empty probe embedding"))?;

        Ok(Self {
            model: Arc::new(Mutex::new(text_embedding)),
            dimension,
            model_name: model_name.to_string(),
        })
    }
}

#[async_trait]
impl EmbeddingBackend for FastEmbedBackend {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let model = self.model.clone();
        let text = text.to_string();

        tokio::task::spawn_blocking(move || {
            let model = model
                .lock()
                .map_err(|e| Error::backend_unavailable(format!("Mutex poisoned: {e}")))?;
            let results = model
                .embed(vec![text], None)
                .map_err(|e| Error::backend_unavailable(format!("Embedding failed: {e}")))?;
            results
                .into_iter()
                .next()
                .ok_or_else(|| Error::backend_unavailable("No embedding returned"))
        })
        .await
        .map_err(|e| Error::backend_unavailable(format!("spawn_blocking failed: {e}")))?
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let model = self.model.clone();
        let texts: Vec<String> = texts.iter().map(|t| t.to_string()).collect();

        tokio::task::spawn_blocking(move || {
            let model = model
                .lock()
                .map_err(|e| Error::backend_unavailable(format!("Mutex poisoned: {e}")))?;
            model
                .embed(texts, None)
                .map_err(|e| Error::backend_unavailable(format!("Batch embedding failed: {e}")))
        })
        .await
        .map_err(|e| Error::backend_unavailable(format!("spawn_blocking failed: {e}")))?
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        &self.model_name
    }
}

impl std::fmt::Debug for FastEmbedBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedBackend")
            .field("model", &self.model_name)
            .field("dimension", &self.dimension)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
