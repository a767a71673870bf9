//! Snapshot persistence for the index and the document store.
//!
//! Two JSON artifacts, each stamped with a metadata header:
//!
//! - `index.snapshot` — vectors, dimension, and training state
//! - `documents.snapshot` — documents in vector-position order
//!
//! The pair is causally linked: a document references a vector position, so
//! loading one without the other would produce dangling references. Callers
//! enforce that both-or-neither exist; this module only reads and writes the
//! individual files.
//!
//! Writes go to a temporary sibling file and rename into place, so a crash
//! mid-write never leaves a truncated artifact behind.

use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use sakbe_core::{Error, Result};

use crate::index::VectorIndex;
use crate::store::{Document, DocumentStore};

/// File name of the vector index snapshot artifact.
pub const INDEX_SNAPSHOT_FILE: &str = "index.snapshot";

/// File name of the document store snapshot artifact.
pub const DOCUMENTS_SNAPSHOT_FILE: &str = "documents.snapshot";

// ============================================================================
// Serializable types
// ============================================================================

/// Header stamped into every snapshot artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    /// When the snapshot was written (RFC 3339).
    pub built_at: String,

    /// Version of the crate that wrote it.
    pub builder_version: String,

    /// Number of entries in the artifact (vectors or documents).
    pub entry_count: usize,
}

impl SnapshotMetadata {
    /// Metadata stamped with the current time and crate version.
    pub fn new(entry_count: usize) -> Self {
        Self {
            built_at: Utc::now().to_rfc3339(),
            builder_version: env!("CARGO_PKG_VERSION").to_string(),
            entry_count,
        }
    }
}

/// On-disk form of `index.snapshot`.
#[derive(Serialize, Deserialize)]
struct IndexSnapshot {
    metadata: SnapshotMetadata,
    index: VectorIndex,
}

/// On-disk form of `documents.snapshot`.
#[derive(Serialize, Deserialize)]
struct DocumentsSnapshot {
    metadata: SnapshotMetadata,
    documents: Vec<Document>,
}

// ============================================================================
// Save / Load
// ============================================================================

/// Write the index to `path`.
pub async fn save_index(index: &VectorIndex, path: &Path) -> Result<()> {
    let snapshot = IndexSnapshot {
        metadata: SnapshotMetadata::new(index.ntotal()),
        index: index.clone(),
    };
    let json = serde_json::to_string(&snapshot)?;
    write_atomic(path, json).await?;

    log::debug!(
        "saved index snapshot ({} vectors) to {}",
        index.ntotal(),
        path.display()
    );
    Ok(())
}

/// Load an index from `path`.
///
/// A file that cannot be read is an I/O error; a file that cannot be parsed
/// is a `Persistence` error. Callers check existence beforehand when a
/// missing artifact is not an error.
pub async fn load_index(path: &Path) -> Result<VectorIndex> {
    let json = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::io_with_path(e, path))?;
    let snapshot: IndexSnapshot = serde_json::from_str(&json).map_err(|e| {
        Error::persistence(format!("corrupt index snapshot at {}: {e}", path.display()))
    })?;

    log::debug!(
        "loaded index snapshot ({} vectors, built {} by v{})",
        snapshot.index.ntotal(),
        snapshot.metadata.built_at,
        snapshot.metadata.builder_version
    );
    Ok(snapshot.index)
}

/// Write the document store to `path`, documents in vector-position order.
pub async fn save_documents(store: &DocumentStore, path: &Path) -> Result<()> {
    let mut documents: Vec<Document> = store.iter().cloned().collect();
    documents.sort_by_key(|d| d.vector_position);

    let snapshot = DocumentsSnapshot {
        metadata: SnapshotMetadata::new(documents.len()),
        documents,
    };
    let json = serde_json::to_string(&snapshot)?;
    write_atomic(path, json).await?;

    log::debug!(
        "saved documents snapshot ({} documents) to {}",
        store.len(),
        path.display()
    );
    Ok(())
}

/// Load a document store from `path`.
///
/// The position and language maps are derived state and are rebuilt here
/// rather than persisted.
pub async fn load_documents(path: &Path) -> Result<DocumentStore> {
    let json = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::io_with_path(e, path))?;
    let snapshot: DocumentsSnapshot = serde_json::from_str(&json).map_err(|e| {
        Error::persistence(format!(
            "corrupt documents snapshot at {}: {e}",
            path.display()
        ))
    })?;

    let mut store = DocumentStore::new();
    for document in snapshot.documents {
        store.put(document);
    }

    log::debug!(
        "loaded documents snapshot ({} documents) from {}",
        store.len(),
        path.display()
    );
    Ok(store)
}

/// Write `contents` to a temporary sibling of `path`, then rename into place.
async fn write_atomic(path: &Path, contents: String) -> Result<()> {
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, contents)
        .await
        .map_err(|e| Error::io_with_path(e, &tmp))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| Error::io_with_path(e, path))?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
