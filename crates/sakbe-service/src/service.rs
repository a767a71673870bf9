//! The semantic index service facade.
//!
//! `SemanticIndexService` ties the embedding layer and the retrieval layer
//! together: ingestion embeds through the cache with retries, indexes the
//! vector, and stores the document with its extracted tags; queries embed the
//! same way, search the index, and rank candidates with cultural and phonetic
//! boosts.
//!
//! # Concurrency
//!
//! One `RwLock` guards the index/store pair. Writers (ingestion, training)
//! serialize through it; readers (queries, stats) share it and always observe
//! a vector together with its document. Snapshots clone the in-memory state
//! under the lock that triggered them and serialize on a spawned task, so the
//! lock is never held across file I/O.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use sakbe_core::{Error, Result, document_id, normalize_language};
use sakbe_embed::{EMBEDDING_CACHE_FILE, EmbeddingBackendRegistry, EmbeddingCache, RetryingBackend};
use sakbe_index::{
    DOCUMENTS_SNAPSHOT_FILE, Document, DocumentStore, INDEX_SNAPSHOT_FILE, VectorIndex,
    load_documents, load_index, save_documents, save_index,
};

use crate::extractor::TagExtractor;
use crate::types::{NewDocument, SearchHit, SearchOptions, ServiceConfig, ServiceStats};

/// Index and store guarded as one unit, so no reader ever sees a vector
/// without its document.
struct Corpus {
    index: VectorIndex,
    store: DocumentStore,
    inserts_since_snapshot: usize,
}

impl Corpus {
    fn fresh(config: &ServiceConfig) -> Result<Self> {
        Ok(Self {
            index: VectorIndex::new(config.dimension, config.index.clone())?,
            store: DocumentStore::new(),
            inserts_since_snapshot: 0,
        })
    }
}

/// Cross-lingual semantic index over documents in many languages.
///
/// Construct with [`SemanticIndexService::open`]; call
/// [`SemanticIndexService::close`] for a final durable snapshot. All methods
/// take `&self`, so the service can be shared behind an `Arc` across tasks.
pub struct SemanticIndexService {
    config: ServiceConfig,
    registry: EmbeddingBackendRegistry,
    extractor: Arc<dyn TagExtractor>,
    cache: Arc<EmbeddingCache>,
    corpus: Arc<RwLock<Corpus>>,
}

impl SemanticIndexService {
    /// Open the service, restoring state from the snapshot directory.
    ///
    /// The index and documents snapshots are a causally linked pair: both
    /// absent starts fresh, both present restores, one without the other is
    /// a `Persistence` error, as is any artifact that exists but cannot be
    /// parsed. A missing embedding cache simply starts empty.
    pub async fn open(
        config: ServiceConfig,
        registry: EmbeddingBackendRegistry,
        extractor: Arc<dyn TagExtractor>,
    ) -> Result<Self> {
        let cache = Arc::new(EmbeddingCache::new(config.cache_max_entries));

        let corpus = match &config.snapshot_dir {
            Some(dir) => {
                let index_path = dir.join(INDEX_SNAPSHOT_FILE);
                let documents_path = dir.join(DOCUMENTS_SNAPSHOT_FILE);
                match (index_path.exists(), documents_path.exists()) {
                    (false, false) => {
                        log::info!("no snapshots under {}; starting fresh", dir.display());
                        Corpus::fresh(&config)?
                    }
                    (true, true) => {
                        let index = load_index(&index_path).await?;
                        let store = load_documents(&documents_path).await?;
                        log::info!(
                            "restored {} documents ({} vectors, {} mode) from {}",
                            store.len(),
                            index.ntotal(),
                            index.mode(),
                            dir.display()
                        );
                        Corpus {
                            index,
                            store,
                            inserts_since_snapshot: 0,
                        }
                    }
                    (have_index, _) => {
                        let missing = if have_index {
                            DOCUMENTS_SNAPSHOT_FILE
                        } else {
                            INDEX_SNAPSHOT_FILE
                        };
                        return Err(Error::persistence(format!(
                            "snapshot pair incomplete under {}: {missing} is missing",
                            dir.display()
                        )));
                    }
                }
            }
            None => Corpus::fresh(&config)?,
        };

        if let Some(dir) = &config.snapshot_dir {
            cache.load(&dir.join(EMBEDDING_CACHE_FILE)).await?;
        }

        Ok(Self {
            config,
            registry,
            extractor,
            cache,
            corpus: Arc::new(RwLock::new(corpus)),
        })
    }

    /// Flush a final snapshot and return once it is durable.
    ///
    /// A no-op when no snapshot directory is configured.
    pub async fn close(&self) -> Result<()> {
        let Some(dir) = self.config.snapshot_dir.clone() else {
            return Ok(());
        };

        let (index, store) = {
            let corpus = self.corpus.read().await;
            (corpus.index.clone(), corpus.store.clone())
        };
        write_snapshot(&dir, &index, &store, &self.cache).await?;
        log::info!("closed with final snapshot under {}", dir.display());
        Ok(())
    }

    /// Ingest one document and return its deterministic ID.
    ///
    /// Re-ingesting the same (text, language) pair yields the same ID and
    /// replaces the earlier document. The superseded vector stays in the
    /// index unreferenced and is skipped at query time.
    ///
    /// # Errors
    ///
    /// Blank text or a language no backend can serve is `Validation`. A
    /// backend outage that survives the bounded retries is
    /// `BackendUnavailable`. A backend that produces an unusable vector is
    /// `InvalidVector`, leaving no partial state.
    pub async fn add_document(
        &self,
        text: &str,
        language: &str,
        metadata: HashMap<String, String>,
    ) -> Result<String> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::validation("document text must not be empty"));
        }
        let language = normalize_language(language);
        if language.is_empty() {
            return Err(Error::validation("document language must not be empty"));
        }
        let backend = self.registry.resolve(&language).map_err(|e| match e {
            Error::UnsupportedLanguage(lang) => {
                Error::validation(format!("no embedding backend for language '{lang}'"))
            }
            other => other,
        })?;

        // The retry wrapper reports the inner backend's name, so ingestion
        // and queries share cache entries.
        let retrying = RetryingBackend::new(backend)
            .with_max_attempts(self.config.retry_max_attempts)
            .with_initial_delay(Duration::from_millis(self.config.retry_initial_delay_ms))
            .with_max_delay(Duration::from_millis(self.config.retry_max_delay_ms));
        let vector = self.cache.get_or_compute(&retrying, text, &language).await?;

        // Tags are pure functions of the input; extract before taking the
        // write lock.
        let cultural_tags = self.extractor.cultural_tags(text, &language);
        let phonetic_tags = self.extractor.phonetic_tags(text);
        let id = document_id(text, &language);

        let (position, snapshot_state) = {
            let mut corpus = self.corpus.write().await;
            let position = corpus.index.add(&vector)?;
            let document = Document::new(id.as_str(), text, &language, position)
                .with_cultural_tags(cultural_tags)
                .with_phonetic_tags(phonetic_tags)
                .with_metadata_map(metadata);
            corpus.store.put(document);

            corpus.inserts_since_snapshot += 1;
            let due = self.config.snapshot_dir.is_some()
                && corpus.inserts_since_snapshot >= self.config.snapshot_every_insertions;
            let state = if due {
                corpus.inserts_since_snapshot = 0;
                // Clone under the lock: cheap compared to serialization,
                // and the pair stays causally consistent.
                Some((corpus.index.clone(), corpus.store.clone()))
            } else {
                None
            };
            (position, state)
        };

        if let Some((index, store)) = snapshot_state {
            self.spawn_snapshot(index, store);
        }

        log::debug!("added document {id} at position {position}");
        Ok(id)
    }

    /// Ingest a batch of documents sequentially, returning their IDs in
    /// input order. The first failing record aborts the batch; records
    /// before it remain ingested.
    pub async fn add_documents(&self, batch: &[NewDocument]) -> Result<Vec<String>> {
        let mut ids = Vec::with_capacity(batch.len());
        for record in batch {
            ids.push(
                self.add_document(&record.text, &record.language, record.metadata.clone())
                    .await?,
            );
        }
        Ok(ids)
    }

    /// Search for documents semantically similar to `query`.
    ///
    /// The query is embedded with the backend for `language` (falling back
    /// to the multilingual backend), the index is probed for an oversampled
    /// candidate set, and candidates are filtered by similarity threshold
    /// and language before tag boosts rank them.
    ///
    /// A backend outage on this path degrades to an empty result list with
    /// a warning rather than an error.
    pub async fn search_similar(
        &self,
        query: &str,
        language: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchHit>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::validation("query must not be empty"));
        }
        options.validate()?;
        let language = normalize_language(language);

        let backend = self.registry.resolve(&language)?;
        let vector = match self.cache.get_or_compute(backend.as_ref(), query, &language).await {
            Ok(vector) => vector,
            Err(Error::BackendUnavailable(msg)) => {
                log::warn!("embedding backend unavailable for query, returning no results: {msg}");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        // Query tags are extracted once and compared against every candidate.
        let query_cultural = self.extractor.cultural_tags(query, &language);
        let query_phonetic = self.extractor.phonetic_tags(query);

        let candidates = options
            .top_k
            .saturating_mul(options.oversample_factor.max(2));

        let corpus = self.corpus.read().await;
        if corpus.store.is_empty() {
            return Ok(Vec::new());
        }
        let matches = corpus.index.search(&vector, candidates)?;

        let mut ranked: Vec<(SearchHit, usize)> = Vec::with_capacity(matches.len());
        for m in matches {
            // Positions orphaned by document replacement resolve to nothing.
            let Some(doc) = corpus.store.get_by_vector_position(m.position) else {
                continue;
            };
            let similarity = m.similarity();
            if similarity < options.similarity_threshold {
                continue;
            }
            if !options.cross_lingual && doc.language != language {
                continue;
            }

            let cultural_match = !query_cultural.is_disjoint(&doc.cultural_tags);
            let phonetic_match = !query_phonetic.is_disjoint(&doc.phonetic_tags);
            let mut adjusted = similarity;
            if cultural_match {
                adjusted += options.cultural_boost;
            }
            if phonetic_match {
                adjusted += options.phonetic_boost;
            }

            ranked.push((
                SearchHit {
                    document_id: doc.id.clone(),
                    text: doc.text.clone(),
                    language: doc.language.clone(),
                    similarity,
                    adjusted_score: adjusted.min(1.0),
                    cultural_match,
                    phonetic_match,
                    metadata: doc.metadata.clone(),
                },
                m.position,
            ));
        }
        drop(corpus);

        ranked.sort_by(|a, b| {
            b.0.adjusted_score
                .partial_cmp(&a.0.adjusted_score)
                .unwrap_or(Ordering::Equal)
                .then(
                    b.0.similarity
                        .partial_cmp(&a.0.similarity)
                        .unwrap_or(Ordering::Equal),
                )
                .then(a.1.cmp(&b.1))
        });
        ranked.truncate(options.top_k);

        log::debug!(
            "query in '{language}' matched {} documents (top_k {})",
            ranked.len(),
            options.top_k
        );
        Ok(ranked.into_iter().map(|(hit, _)| hit).collect())
    }

    /// Point-in-time statistics.
    pub async fn stats(&self) -> ServiceStats {
        let corpus = self.corpus.read().await;
        ServiceStats {
            document_count: corpus.store.len(),
            languages: corpus.store.list_languages().into_iter().collect(),
            index: corpus.index.stats(),
            cache_entries: self.cache.len().await,
            cache_hits: self.cache.hit_count(),
            cache_misses: self.cache.miss_count(),
            insertions_since_snapshot: corpus.inserts_since_snapshot,
        }
    }

    /// Serialize and write a snapshot on a background task.
    ///
    /// Failures are logged and the ingestion that triggered the snapshot
    /// succeeds regardless; the next interval retries.
    fn spawn_snapshot(&self, index: VectorIndex, store: DocumentStore) {
        let Some(dir) = self.config.snapshot_dir.clone() else {
            return;
        };
        let cache = Arc::clone(&self.cache);
        tokio::spawn(async move {
            if let Err(e) = write_snapshot(&dir, &index, &store, &cache).await {
                log::warn!("snapshot write failed: {e}");
            }
        });
    }
}

impl fmt::Debug for SemanticIndexService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SemanticIndexService")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// Write all three snapshot artifacts under `dir`.
async fn write_snapshot(
    dir: &Path,
    index: &VectorIndex,
    store: &DocumentStore,
    cache: &EmbeddingCache,
) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| Error::io_with_path(e, dir))?;
    save_index(index, &dir.join(INDEX_SNAPSHOT_FILE)).await?;
    save_documents(store, &dir.join(DOCUMENTS_SNAPSHOT_FILE)).await?;
    cache.flush(&dir.join(EMBEDDING_CACHE_FILE)).await?;
    log::info!(
        "snapshot written: {} documents, {} vectors, {}",
        store.len(),
        index.ntotal(),
        dir.display()
    );
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
