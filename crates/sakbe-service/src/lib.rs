//! Sakbe Service — the semantic index facade.
//!
//! This crate ties the embedding layer (`sakbe-embed`) and the retrieval
//! layer (`sakbe-index`) into one service with a small surface: add
//! documents, search across languages, snapshot state.
//!
//! # Data flow
//!
//! ```text
//!   add_document ──► registry ──► retry ──► cache ──► backend
//!                                              │
//!                                              ▼
//!                    extractor ──► tags    vector ──► index ──► store
//!
//!   search_similar ──► cache ──► index.search ──► threshold / language
//!                                                        │
//!                                          tag boosts ──►│──► ranked hits
//! ```
//!
//! Ingestion embeds through the cache with bounded retries, extracts
//! cultural and phonetic tags, and stores the document next to its vector.
//! Queries embed the same way, oversample the index, then filter and re-rank
//! candidates with tag boosts. Snapshots persist the index, documents, and
//! embedding cache as one causally consistent set.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sakbe_embed::{EmbeddingBackendRegistry, MockEmbeddingBackend};
//! use sakbe_service::{
//!     MesoamericanTagExtractor, SearchOptions, SemanticIndexService, ServiceConfig,
//! };
//!
//! let registry =
//!     EmbeddingBackendRegistry::with_fallback(Arc::new(MockEmbeddingBackend::new(768)));
//! let service = SemanticIndexService::open(
//!     ServiceConfig::default(),
//!     registry,
//!     Arc::new(MesoamericanTagExtractor::new()),
//! )
//! .await?;
//!
//! service.add_document("ha' chaac", "yua", Default::default()).await?;
//! let hits = service
//!     .search_similar("water", "en", &SearchOptions::default())
//!     .await?;
//! ```

pub mod extractor;
pub mod service;
pub mod types;

// Re-export the service surface at crate root
pub use extractor::{MesoamericanTagExtractor, NullTagExtractor, TagExtractor};
pub use service::SemanticIndexService;
pub use types::{
    MAX_BOOST, NewDocument, SearchHit, SearchOptions, ServiceConfig, ServiceStats,
};
