//! Sakbe application: logging, service wiring, and command dispatch.
//!
//! [`SakbeApp`] owns the loaded [`SakbeConfig`] and maps each parsed
//! [`Command`] to a handler. Mutating commands (`add`, `ingest`) close the
//! service before returning so the snapshot pair and embedding cache land on
//! disk for the next invocation.

use std::collections::HashMap;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::cli::{Command, SakbeArgs};
use crate::config::{EmbeddingConfig, SakbeConfig};
use crate::config_handlers;
use sakbe_core::traits::ConfigProvider;
use sakbe_core::{Error, Result};
use sakbe_embed::{EmbeddingBackendRegistry, MockEmbeddingBackend};
use sakbe_index::{DOCUMENTS_SNAPSHOT_FILE, INDEX_SNAPSHOT_FILE};
use sakbe_service::{
    MesoamericanTagExtractor, NewDocument, SearchHit, SearchOptions, SemanticIndexService,
    TagExtractor,
};

#[cfg(feature = "embed-fastembed")]
use sakbe_embed::{EmbeddingBackend, FastEmbedBackend};

// ============================================================================
// SakbeApp
// ============================================================================

/// The sakbe command-line application.
pub struct SakbeApp {
    config: SakbeConfig,
    version: String,
}

impl SakbeApp {
    /// Create from CLI args, loading config from file/env.
    pub fn from_args(args: &SakbeArgs) -> Result<Self> {
        let config = SakbeConfig::load(args.config.as_deref())?;
        Ok(Self::new(config))
    }

    /// Create from an already loaded configuration.
    pub fn new(config: SakbeConfig) -> Self {
        Self {
            config,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Get a reference to the loaded configuration.
    pub fn config(&self) -> &SakbeConfig {
        &self.config
    }

    /// Initialise tracing-based logging.
    ///
    /// Uses `RUST_LOG` env var if set, otherwise defaults based on verbosity flags.
    pub fn init_logging(&self, verbose: bool, quiet: bool) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if quiet {
            EnvFilter::new("warn")
        } else if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        };

        // Ignore error if a subscriber is already set (e.g. in tests).
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    }

    /// Run the CLI with the given arguments.
    pub async fn run(&self, args: SakbeArgs) -> Result<()> {
        self.init_logging(args.verbose, args.quiet);

        match args.command {
            Some(Command::Add {
                text,
                language,
                meta,
            }) => self.cmd_add(&text, &language, &meta).await,
            Some(Command::Ingest { file }) => self.cmd_ingest(&file).await,
            Some(Command::Search {
                query,
                language,
                top_k,
                threshold,
                same_language,
                cultural_boost,
                phonetic_boost,
            }) => {
                let options = apply_search_flags(
                    self.config.search.to_options(),
                    top_k,
                    threshold,
                    same_language,
                    cultural_boost,
                    phonetic_boost,
                );
                self.cmd_search(&query, &language, &options).await
            }
            Some(Command::Stats) => self.cmd_stats().await,
            Some(Command::Config(config_cmd)) => {
                config_handlers::handle_config_command(args.config.as_deref(), config_cmd.command)
            }
            Some(Command::Version) => {
                println!("sakbe {}", self.version);
                Ok(())
            }
            Some(Command::Health) => self.cmd_health(args.config.as_deref()).await,
            None => {
                println!("sakbe {} (use --help to list commands)", self.version);
                Ok(())
            }
        }
    }

    /// Open the semantic index service described by the loaded config.
    ///
    /// The embedding provider decides the effective dimension: the mock
    /// backend takes it from config, fastembed probes the model.
    pub async fn open_service(&self) -> Result<SemanticIndexService> {
        let (registry, dimension) = build_registry(&self.config.embedding)?;
        let mut service_config = self.config.service_config()?;
        service_config.dimension = dimension;
        let extractor: Arc<dyn TagExtractor> = Arc::new(MesoamericanTagExtractor::new());
        SemanticIndexService::open(service_config, registry, extractor).await
    }

    // ------------------------------------------------------------------------
    // Command handlers
    // ------------------------------------------------------------------------

    /// Add a single document and print its identifier.
    async fn cmd_add(&self, text: &str, language: &str, meta: &[String]) -> Result<()> {
        let metadata = parse_meta_pairs(meta)?;
        let service = self.open_service().await?;
        let id = service.add_document(text, language, metadata).await?;
        service.close().await?;
        println!("{id}");
        Ok(())
    }

    /// Ingest newline-delimited JSON documents from a file.
    async fn cmd_ingest(&self, file: &str) -> Result<()> {
        let content = tokio::fs::read_to_string(file)
            .await
            .map_err(|e| Error::io_with_path(e, file))?;

        let mut batch = Vec::new();
        for (number, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let doc: NewDocument = serde_json::from_str(line).map_err(|e| {
                Error::validation(format!("{file}:{}: invalid document: {e}", number + 1))
            })?;
            batch.push(doc);
        }

        if batch.is_empty() {
            println!("No documents in {file}.");
            return Ok(());
        }

        let service = self.open_service().await?;
        let ids = service.add_documents(&batch).await?;
        service.close().await?;
        println!("Ingested {} documents", ids.len());
        Ok(())
    }

    /// Search the index and print ranked hits.
    async fn cmd_search(&self, query: &str, language: &str, options: &SearchOptions) -> Result<()> {
        let service = self.open_service().await?;
        let hits = service.search_similar(query, language, options).await?;

        if hits.is_empty() {
            println!("No matches.");
            return Ok(());
        }
        for (i, hit) in hits.iter().enumerate() {
            print_hit(i + 1, hit);
        }
        Ok(())
    }

    /// Print corpus, index, and cache statistics.
    async fn cmd_stats(&self) -> Result<()> {
        let service = self.open_service().await?;
        let stats = service.stats().await;

        println!("documents: {}", stats.document_count);
        if !stats.languages.is_empty() {
            let langs: Vec<String> = stats
                .languages
                .iter()
                .map(|(lang, count)| format!("{lang}={count}"))
                .collect();
            println!("languages: {}", langs.join(" "));
        }
        println!(
            "index: {} vectors, dimension {}, {} mode, {} clusters",
            stats.index.ntotal, stats.index.dimension, stats.index.mode, stats.index.num_clusters
        );
        println!(
            "cache: {} entries ({} hits, {} misses)",
            stats.cache_entries, stats.cache_hits, stats.cache_misses
        );
        println!(
            "insertions since snapshot: {}",
            stats.insertions_since_snapshot
        );
        Ok(())
    }

    /// Check configuration, provider, and snapshot state.
    async fn cmd_health(&self, config_path: Option<&str>) -> Result<()> {
        match SakbeConfig::resolve_config_path(config_path) {
            Some(path) if path.exists() => println!("config: {}", path.display()),
            Some(path) => println!("config: {} (not found, using defaults)", path.display()),
            None => println!("config: built-in defaults"),
        }

        let provider = &self.config.embedding.provider;
        if provider != "mock" && provider != "fastembed" {
            return Err(Error::config(format!(
                "unknown embedding provider '{provider}'"
            )));
        }
        println!("provider: {provider}");

        let dir = self.config.data_path("snapshots")?;
        let have_index = dir.join(INDEX_SNAPSHOT_FILE).exists();
        let have_documents = dir.join(DOCUMENTS_SNAPSHOT_FILE).exists();
        match (have_index, have_documents) {
            (true, true) => println!("snapshots: present under {}", dir.display()),
            (false, false) => println!("snapshots: none under {} (fresh start)", dir.display()),
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

        println!("sakbe: healthy");
        Ok(())
    }
}

// ============================================================================
// Wiring helpers
// ============================================================================

/// Build the embedding backend registry for the configured provider.
///
/// Returns the registry together with the effective embedding dimension.
fn build_registry(embedding: &EmbeddingConfig) -> Result<(EmbeddingBackendRegistry, usize)> {
    match embedding.provider.as_str() {
        "mock" => {
            let backend = Arc::new(MockEmbeddingBackend::new(embedding.dimension));
            Ok((
                EmbeddingBackendRegistry::with_fallback(backend),
                embedding.dimension,
            ))
        }
        #[cfg(feature = "embed-fastembed")]
        "fastembed" => {
            let backend =
                FastEmbedBackend::new(&embedding.model, embedding.cache_dir.as_deref())?;
            let dimension = backend.dimension();
            Ok((
                EmbeddingBackendRegistry::with_fallback(Arc::new(backend)),
                dimension,
            ))
        }
        #[cfg(not(feature = "embed-fastembed"))]
        "fastembed" => Err(Error::config(
            "provider 'fastembed' requires a build with the embed-fastembed feature",
        )),
        other => Err(Error::config(format!(
            "unknown embedding provider '{other}'"
        ))),
    }
}

/// Apply CLI flag overrides on top of the configured search defaults.
fn apply_search_flags(
    mut options: SearchOptions,
    top_k: Option<usize>,
    threshold: Option<f32>,
    same_language: bool,
    cultural_boost: Option<f32>,
    phonetic_boost: Option<f32>,
) -> SearchOptions {
    if let Some(k) = top_k {
        options.top_k = k;
    }
    if let Some(t) = threshold {
        options.similarity_threshold = t;
    }
    if same_language {
        options.cross_lingual = false;
    }
    if let Some(b) = cultural_boost {
        options.cultural_boost = b;
    }
    if let Some(b) = phonetic_boost {
        options.phonetic_boost = b;
    }
    options
}

/// Parse repeated `KEY=VALUE` pairs into a metadata map.
fn parse_meta_pairs(pairs: &[String]) -> Result<HashMap<String, String>> {
    let mut metadata = HashMap::new();
    for pair in pairs {
        match pair.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                metadata.insert(key.to_string(), value.to_string());
            }
            _ => {
                return Err(Error::validation(format!(
                    "invalid metadata pair '{pair}', expected KEY=VALUE"
                )));
            }
        }
    }
    Ok(metadata)
}

/// Print one ranked hit with a short text preview.
fn print_hit(rank: usize, hit: &SearchHit) {
    let mut line = format!(
        "{rank}. {} [{}] similarity {:.3} score {:.3}",
        hit.document_id, hit.language, hit.similarity, hit.adjusted_score
    );
    if hit.cultural_match {
        line.push_str(" [cultural]");
    }
    if hit.phonetic_match {
        line.push_str(" [phonetic]");
    }
    println!("{line}");
    println!("   {}", preview(&hit.text, 80));
}

/// Truncate text to a fixed number of characters for display.
fn preview(text: &str, max_chars: usize) -> String {
    let mut out: String = text.chars().take(max_chars).collect();
    if text.chars().count() > max_chars {
        out.push_str("...");
    }
    out
}

// ============================================================================
// Tests
// ============================================================================
