//! Document storage with O(1) lookup by ID or vector position.
//!
//! The store is the metadata side of the index: every accepted vector has a
//! document describing the text it embeds, its language, and the tags the
//! feature extractor found. A secondary `position → id` map resolves search
//! matches without scanning.
//!
//! Replacing a document (same ID, new vector) unmaps the old position. The
//! old vector stays in the index but nothing references it, so the query
//! path skips it.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// A stored document: the text behind a vector position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Deterministic identifier (`doc_{language}_{hash12}`).
    pub id: String,

    /// Original text as ingested.
    pub text: String,

    /// Normalized language code.
    pub language: String,

    /// Cultural tags found by the feature extractor.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub cultural_tags: BTreeSet<String>,

    /// Phonetic tags found by the feature extractor.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub phonetic_tags: BTreeSet<String>,

    /// Position of this document's vector in the index.
    pub vector_position: usize,

    /// Ingestion timestamp (RFC 3339).
    pub added_at: String,

    /// Arbitrary metadata key-value pairs.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl Document {
    /// Create a document with the current timestamp and no tags.
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        language: impl Into<String>,
        vector_position: usize,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            language: language.into(),
            cultural_tags: BTreeSet::new(),
            phonetic_tags: BTreeSet::new(),
            vector_position,
            added_at: Utc::now().to_rfc3339(),
            metadata: HashMap::new(),
        }
    }

    /// Set the cultural tags.
    pub fn with_cultural_tags(mut self, tags: BTreeSet<String>) -> Self {
        self.cultural_tags = tags;
        self
    }

    /// Set the phonetic tags.
    pub fn with_phonetic_tags(mut self, tags: BTreeSet<String>) -> Self {
        self.phonetic_tags = tags;
        self
    }

    /// Add a metadata key-value pair.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Replace the whole metadata map.
    pub fn with_metadata_map(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// In-memory document store.
///
/// Three maps kept consistent by `put`: documents by ID, IDs by vector
/// position, and per-language counts. The position and language maps are
/// derived state and are rebuilt when a snapshot is loaded.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    documents: HashMap<String, Document>,
    by_position: HashMap<usize, String>,
    language_counts: BTreeMap<String, usize>,
}

impl DocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document, replacing any existing document with the same ID.
    ///
    /// On replacement the previous vector position is unmapped and the
    /// previous language count decremented; the superseded vector itself is
    /// not touched.
    pub fn put(&mut self, document: Document) {
        if let Some(previous) = self.documents.get(&document.id) {
            self.by_position.remove(&previous.vector_position);
            if let Some(count) = self.language_counts.get_mut(&previous.language) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    self.language_counts.remove(&previous.language);
                }
            }
        }

        self.by_position
            .insert(document.vector_position, document.id.clone());
        *self
            .language_counts
            .entry(document.language.clone())
            .or_insert(0) += 1;
        self.documents.insert(document.id.clone(), document);
    }

    /// Look up a document by ID.
    pub fn get(&self, id: &str) -> Option<&Document> {
        self.documents.get(id)
    }

    /// Resolve a vector position to its document, if one references it.
    pub fn get_by_vector_position(&self, position: usize) -> Option<&Document> {
        self.by_position
            .get(&position)
            .and_then(|id| self.documents.get(id))
    }

    /// Distinct languages with document counts, sorted by language code.
    pub fn list_languages(&self) -> Vec<(String, usize)> {
        self.language_counts
            .iter()
            .map(|(language, count)| (language.clone(), *count))
            .collect()
    }

    /// Number of documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the store holds no documents.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Iterate over all documents in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.values()
    }
}

// ============================================================================
// Tests
// ============================================================================
