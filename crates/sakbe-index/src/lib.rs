//! Vector index and document storage for Sakbe.
//!
//! This crate provides the retrieval side of the semantic index: an
//! inverted-file ANN index with an exact brute-force fallback, the document
//! store that maps vector positions back to text, and the snapshot
//! persistence both are restored from.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       sakbe-index                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  VectorIndex                                                │
//! │  ├── IndexMode::BruteForce (exact scan, small corpora)      │
//! │  └── IndexMode::Trained (k-means inverted lists, probing)   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  DocumentStore (id → Document, position → id, language      │
//! │                 counts)                                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Snapshots (index.snapshot, documents.snapshot; JSON with   │
//! │             built_at / builder_version headers)             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use sakbe_index::{Document, DocumentStore, IndexConfig, VectorIndex};
//!
//! let mut index = VectorIndex::new(384, IndexConfig::default())?;
//! let mut store = DocumentStore::new();
//!
//! let position = index.add(&embedding)?;
//! store.put(Document::new("doc_en_abc", "water", "en", position));
//!
//! for m in index.search(&query, 10)? {
//!     if let Some(doc) = store.get_by_vector_position(m.position) {
//!         println!("{}: {:.3}", doc.id, m.similarity());
//!     }
//! }
//! ```

pub mod index;
pub mod snapshot;
pub mod store;
pub mod types;

// Re-exports — core types
pub use types::{IndexConfig, IndexMode, IndexStats, SearchMatch};

// Re-exports — index and store
pub use index::VectorIndex;
pub use store::{Document, DocumentStore};

// Re-exports — persistence
pub use snapshot::{
    DOCUMENTS_SNAPSHOT_FILE, INDEX_SNAPSHOT_FILE, SnapshotMetadata, load_documents, load_index,
    save_documents, save_index,
};
