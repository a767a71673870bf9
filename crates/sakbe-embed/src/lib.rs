//! Embedding infrastructure for Sakbe.
//!
//! This crate provides the embedding side of the semantic index: pluggable
//! backends, per-language routing with a multilingual fallback, a bounded
//! persistent cache, and a retry wrapper for transient backend failures.
//!
//! # Features
//!
//! - `embed-fastembed`: Enable local embedding generation via fastembed
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       sakbe-embed                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  EmbeddingBackend trait                                     │
//! │  ├── MockEmbeddingBackend (always available)                │
//! │  ├── RetryingBackend (exponential backoff wrapper)          │
//! │  └── FastEmbedBackend (feature: embed-fastembed)            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  EmbeddingBackendRegistry (language → backend routing)      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  EmbeddingCache (backend + language + text keyed,           │
//! │                  bounded, flushed to embedding.cache)       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sakbe_embed::{EmbeddingBackendRegistry, EmbeddingCache, MockEmbeddingBackend};
//!
//! let registry =
//!     EmbeddingBackendRegistry::with_fallback(Arc::new(MockEmbeddingBackend::new(384)));
//! let cache = EmbeddingCache::default();
//!
//! let backend = registry.resolve("yua")?;
//! let vector = cache.get_or_compute(backend.as_ref(), "ha'", "yua").await?;
//! ```

// Core modules (always available)
pub mod backend;
pub mod cache;
pub mod registry;
pub mod retry;

// Feature-gated backend modules
#[cfg(feature = "embed-fastembed")]
pub mod fastembed;

// Re-exports — trait and mock
pub use backend::{EmbeddingBackend, MockEmbeddingBackend};

// Re-exports — routing and caching
pub use cache::{DEFAULT_MAX_ENTRIES, EMBEDDING_CACHE_FILE, EmbeddingCache};
pub use registry::EmbeddingBackendRegistry;

// Re-exports — retry
pub use retry::RetryingBackend;

// Feature-gated re-exports
#[cfg(feature = "embed-fastembed")]
pub use fastembed::FastEmbedBackend;
