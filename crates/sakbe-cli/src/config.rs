//! Configuration for the `sakbe` binary.
//!
//! Provides the [`SakbeConfig`] struct that loads from TOML files,
//! environment variables, and defaults using the `confyg` crate.
//!
//! # Loading Priority
//!
//! 1. Explicit `--config <path>` flag
//! 2. `SAKBE_CONFIG` environment variable
//! 3. XDG default: `~/.config/sakbe/config.toml`
//! 4. Built-in defaults

use std::path::PathBuf;

use confyg::{Confygery, env};
use serde::{Deserialize, Serialize};

use sakbe_core::traits::ConfigProvider;
use sakbe_core::{Error, Result};
use sakbe_index::IndexConfig;
use sakbe_service::{SearchOptions, ServiceConfig};

// ============================================================================
// Configuration structs
// ============================================================================

/// Main configuration for the `sakbe` binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SakbeConfig {
    /// Project name, used for env var prefixes and default paths.
    pub project_name: String,

    /// Base path for all project data.
    pub base_path: Option<String>,

    /// Embedding backend configuration.
    pub embedding: EmbeddingConfig,

    /// Vector index tuning.
    pub index: IndexConfig,

    /// Default search options, overridable per query by CLI flags.
    pub search: SearchConfig,

    /// Embedding cache configuration.
    pub cache: CacheConfig,

    /// Snapshot persistence configuration.
    pub snapshot: SnapshotConfig,

    /// Retry policy for ingestion-path embedding calls.
    pub retry: RetryConfig,
}

/// Embedding backend selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Backend provider: "mock" or "fastembed".
    pub provider: String,

    /// Model name for the fastembed provider.
    pub model: String,

    /// Embedding dimension. The fastembed provider probes the model and
    /// overrides this value.
    pub dimension: usize,

    /// Directory for downloaded model files.
    pub cache_dir: Option<String>,
}

/// Default search behaviour.
///
/// Thresholds and boosts are `f64` here so generated TOML stays readable;
/// [`SearchConfig::to_options`] narrows them at the service boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum number of results.
    pub top_k: usize,

    /// Minimum similarity for a result to qualify.
    pub similarity_threshold: f64,

    /// Whether results may come from other languages.
    pub cross_lingual: bool,

    /// Score boost for shared cultural tags.
    pub cultural_boost: f64,

    /// Score boost for shared phonetic tags.
    pub phonetic_boost: f64,

    /// Candidate oversampling multiplier before filtering.
    pub oversample_factor: usize,
}

/// Embedding cache bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of cached embeddings.
    pub max_entries: usize,
}

/// Snapshot persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Snapshot directory. Defaults to `<base_path>/snapshots`.
    pub dir: Option<String>,

    /// Write a snapshot after this many insertions.
    pub every_insertions: usize,
}

/// Retry policy for transient embedding failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum retry attempts after the initial call.
    pub max_attempts: u32,

    /// Initial backoff delay in milliseconds.
    pub initial_delay_ms: u64,

    /// Maximum backoff delay in milliseconds.
    pub max_delay_ms: u64,
}

// ============================================================================
// Default implementations
// ============================================================================

impl Default for SakbeConfig {
    fn default() -> Self {
        Self {
            project_name: "sakbe".to_string(),
            base_path: None,
            embedding: EmbeddingConfig::default(),
            index: IndexConfig::default(),
            search: SearchConfig::default(),
            cache: CacheConfig::default(),
            snapshot: SnapshotConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "mock".to_string(),
            model: "multilingual-e5-base".to_string(),
            dimension: 768,
            cache_dir: None,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        let options = SearchOptions::default();
        Self {
            top_k: options.top_k,
            similarity_threshold: options.similarity_threshold as f64,
            cross_lingual: options.cross_lingual,
            cultural_boost: options.cultural_boost as f64,
            phonetic_boost: options.phonetic_boost as f64,
            oversample_factor: options.oversample_factor,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_entries: 10_000 }
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            dir: None,
            every_insertions: 100,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 250,
            max_delay_ms: 2_000,
        }
    }
}

// ============================================================================
// Config loading
// ============================================================================

impl SakbeConfig {
    /// Load configuration from file, environment, and defaults.
    ///
    /// Loading priority:
    /// 1. Explicit `config_path` (from `--config` flag)
    /// 2. `SAKBE_CONFIG` env var
    /// 3. XDG default: `~/.config/sakbe/config.toml`
    /// 4. Built-in defaults
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder =
            Confygery::new().map_err(|e| Error::config(format!("config init: {e}")))?;

        if let Some(path) = Self::resolve_config_path(config_path) {
            if path.exists() {
                builder
                    .add_file(&path.to_string_lossy())
                    .map_err(|e| Error::config(format!("config file: {e}")))?;
            }
        }

        let mut env_opts = env::Options::with_top_level("SAKBE");
        env_opts.add_section("embedding");
        env_opts.add_section("index");
        env_opts.add_section("search");
        env_opts.add_section("cache");
        env_opts.add_section("snapshot");
        env_opts.add_section("retry");
        builder
            .add_env(env_opts)
            .map_err(|e| Error::config(format!("config env: {e}")))?;

        let config: Self = builder
            .build()
            .map_err(|e| Error::config(format!("config build: {e}")))?;

        Ok(config)
    }

    /// Resolve the config file path from explicit flag, env var, or XDG default.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        // 1. Explicit --config flag
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }

        // 2. SAKBE_CONFIG env var
        if let Ok(path) = std::env::var("SAKBE_CONFIG") {
            return Some(PathBuf::from(path));
        }

        // 3. XDG default
        Self::default_config_path()
    }

    /// Return the XDG default config path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("sakbe").join("config.toml"))
    }

    /// Serialize this config to a pretty-printed TOML string.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Flatten this config into environment variable pairs with `SAKBE_` prefix.
    pub fn to_env_vars(&self) -> Result<Vec<(String, String)>> {
        let value: toml::Value =
            toml::Value::try_from(self).map_err(|e| Error::config(e.to_string()))?;
        let mut vars = Vec::new();
        flatten_toml_value(&value, "SAKBE", &mut vars);
        Ok(vars)
    }

    /// Build the service configuration from the loaded sections.
    ///
    /// The snapshot directory always resolves to a concrete path, so every
    /// `sakbe` invocation persists its state for the next one.
    pub fn service_config(&self) -> Result<ServiceConfig> {
        Ok(ServiceConfig {
            dimension: self.embedding.dimension,
            index: self.index.clone(),
            cache_max_entries: self.cache.max_entries,
            snapshot_dir: Some(self.data_path("snapshots")?),
            snapshot_every_insertions: self.snapshot.every_insertions,
            retry_max_attempts: self.retry.max_attempts,
            retry_initial_delay_ms: self.retry.initial_delay_ms,
            retry_max_delay_ms: self.retry.max_delay_ms,
        })
    }
}

impl SearchConfig {
    /// Convert the configured defaults into per-query search options.
    pub fn to_options(&self) -> SearchOptions {
        SearchOptions {
            top_k: self.top_k,
            similarity_threshold: self.similarity_threshold as f32,
            cross_lingual: self.cross_lingual,
            cultural_boost: self.cultural_boost as f32,
            phonetic_boost: self.phonetic_boost as f32,
            oversample_factor: self.oversample_factor,
        }
    }
}

// ============================================================================
// ConfigProvider implementation
// ============================================================================

impl ConfigProvider for SakbeConfig {
    fn project_name(&self) -> &str {
        &self.project_name
    }

    fn base_path(&self) -> Result<PathBuf> {
        match &self.base_path {
            Some(p) => Ok(PathBuf::from(p)),
            None => std::env::current_dir()
                .map_err(|e| Error::config(format!("Could not determine base path: {e}"))),
        }
    }

    fn data_path(&self, kind: &str) -> Result<PathBuf> {
        if kind == "snapshots" {
            if let Some(dir) = &self.snapshot.dir {
                return Ok(PathBuf::from(dir));
            }
        }
        Ok(self.base_path()?.join(kind))
    }
}

// ============================================================================
// Helper: flatten TOML to env vars
// ============================================================================

/// Recursively flatten a TOML value into `KEY=value` pairs.
fn flatten_toml_value(value: &toml::Value, prefix: &str, out: &mut Vec<(String, String)>) {
    match value {
        toml::Value::Table(table) => {
            for (key, val) in table {
                let env_key = format!("{}_{}", prefix, key.to_uppercase());
                flatten_toml_value(val, &env_key, out);
            }
        }
        toml::Value::Array(arr) => {
            if let Ok(json) = serde_json::to_string(arr) {
                out.push((prefix.to_string(), json));
            }
        }
        toml::Value::String(s) => {
            out.push((prefix.to_string(), s.clone()));
        }
        toml::Value::Integer(i) => {
            out.push((prefix.to_string(), i.to_string()));
        }
        toml::Value::Float(f) => {
            out.push((prefix.to_string(), f.to_string()));
        }
        toml::Value::Boolean(b) => {
            out.push((prefix.to_string(), b.to_string()));
        }
        toml::Value::Datetime(dt) => {
            out.push((prefix.to_string(), dt.to_string()));
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Mutex, MutexGuard, OnceLock};

    /// Serializes tests that read or mutate process environment variables.
    fn env_lock() -> MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(Mutex::default)
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    /// RAII guard for env var manipulation in tests.
    struct EnvGuard {
        key: String,
        prev: Option<String>,
    }

    impl EnvGuard {
        fn new(key: &str, value: &str) -> Self {
            let prev = std::env::var(key).ok();
            unsafe { std::env::set_var(key, value) };
            Self {
                key: key.to_string(),
                prev,
            }
        }

        fn remove(key: &str) -> Self {
            let prev = std::env::var(key).ok();
            unsafe { std::env::remove_var(key) };
            Self {
                key: key.to_string(),
                prev,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.prev {
                Some(val) => unsafe { std::env::set_var(&self.key, val) },
                None => unsafe { std::env::remove_var(&self.key) },
            }
        }
    }

    // ------------------------------------------------------------------------
    // Default tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_sakbe_config_default() {
        let config = SakbeConfig::default();
        assert_eq!(config.project_name, "sakbe");
        assert!(config.base_path.is_none());
        assert_eq!(config.embedding.provider, "mock");
        assert_eq!(config.embedding.dimension, 768);
        assert_eq!(config.index.train_threshold, 10_000);
        assert_eq!(config.search.top_k, 10);
        assert!(config.search.cross_lingual);
        assert_eq!(config.cache.max_entries, 10_000);
        assert!(config.snapshot.dir.is_none());
        assert_eq!(config.snapshot.every_insertions, 100);
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn test_search_config_matches_service_defaults() {
        let options = SearchConfig::default().to_options();
        let reference = SearchOptions::default();
        assert_eq!(options.top_k, reference.top_k);
        assert_eq!(options.similarity_threshold, reference.similarity_threshold);
        assert_eq!(options.cultural_boost, reference.cultural_boost);
        assert_eq!(options.phonetic_boost, reference.phonetic_boost);
        assert_eq!(options.oversample_factor, reference.oversample_factor);
    }

    // ------------------------------------------------------------------------
    // Serialization tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_sakbe_config_from_toml() {
        let toml_str = r#"
            project_name = "dictionary"
            base_path = "/data"

            [embedding]
            provider = "fastembed"
            model = "multilingual-e5-small"
            dimension = 384

            [index]
            train_threshold = 5000
            num_clusters = 256

            [search]
            top_k = 20
            similarity_threshold = 0.6

            [snapshot]
            dir = "/data/snapshots"
            every_insertions = 50
        "#;

        let config: SakbeConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.project_name, "dictionary");
        assert_eq!(config.base_path.as_deref(), Some("/data"));
        assert_eq!(config.embedding.provider, "fastembed");
        assert_eq!(config.embedding.dimension, 384);
        assert_eq!(config.index.train_threshold, 5000);
        assert_eq!(config.index.num_clusters, 256);
        // Unspecified section fields keep their defaults.
        assert_eq!(config.index.num_probes, IndexConfig::default().num_probes);
        assert_eq!(config.search.top_k, 20);
        assert_eq!(config.search.similarity_threshold, 0.6);
        assert_eq!(config.snapshot.dir.as_deref(), Some("/data/snapshots"));
        assert_eq!(config.snapshot.every_insertions, 50);
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn test_sakbe_config_to_toml() {
        let config = SakbeConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        assert!(toml_str.contains("project_name = \"sakbe\""));
        assert!(toml_str.contains("[embedding]"));
        assert!(toml_str.contains("provider = \"mock\""));
        assert!(toml_str.contains("[search]"));
        assert!(toml_str.contains("similarity_threshold = 0.7"));

        // Round-trip
        let parsed: SakbeConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.project_name, config.project_name);
        assert_eq!(parsed.embedding.dimension, config.embedding.dimension);
        assert_eq!(parsed.search.top_k, config.search.top_k);
    }

    // ------------------------------------------------------------------------
    // Loading tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_sakbe_config_load_from_file() {
        let _lock = env_lock();
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
                project_name = "loaded-app"
                [embedding]
                dimension = 128
            "#,
        )
        .unwrap();

        let config = SakbeConfig::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.project_name, "loaded-app");
        assert_eq!(config.embedding.dimension, 128);
    }

    #[test]
    fn test_sakbe_config_load_defaults() {
        let _lock = env_lock();
        // Load with a nonexistent file falls back to defaults
        let config = SakbeConfig::load(Some("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.project_name, "sakbe");
        assert_eq!(config.embedding.provider, "mock");
    }

    #[test]
    fn test_sakbe_config_load_env_overlay() {
        let _lock = env_lock();
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
                [embedding]
                provider = "mock"
            "#,
        )
        .unwrap();

        // Env vars override file values (confyg passes env values as strings,
        // so string fields are what the overlay can express).
        let _guard = EnvGuard::new("SAKBE_EMBEDDING_PROVIDER", "fastembed");
        let config = SakbeConfig::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.embedding.provider, "fastembed");
    }

    // ------------------------------------------------------------------------
    // resolve_config_path tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_resolve_config_path_explicit() {
        let path = SakbeConfig::resolve_config_path(Some("/explicit/config.toml"));
        assert_eq!(path, Some(PathBuf::from("/explicit/config.toml")));
    }

    #[test]
    fn test_resolve_config_path_env() {
        let _lock = env_lock();
        let _guard = EnvGuard::new("SAKBE_CONFIG", "/env/config.toml");
        let path = SakbeConfig::resolve_config_path(None);
        assert_eq!(path, Some(PathBuf::from("/env/config.toml")));
    }

    #[test]
    fn test_resolve_config_path_default() {
        let _lock = env_lock();
        let _guard = EnvGuard::remove("SAKBE_CONFIG");
        let path = SakbeConfig::resolve_config_path(None);
        assert!(path.is_some());
        let p = path.unwrap();
        assert!(p.to_str().unwrap().contains("sakbe"));
        assert!(p.to_str().unwrap().ends_with("config.toml"));
    }

    // ------------------------------------------------------------------------
    // ConfigProvider tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_config_provider_project_name() {
        let config = SakbeConfig {
            project_name: "dictionary".into(),
            ..Default::default()
        };
        assert_eq!(config.project_name(), "dictionary");
    }

    #[test]
    fn test_config_provider_base_path() {
        let config = SakbeConfig {
            base_path: Some("/my/data".into()),
            ..Default::default()
        };
        assert_eq!(config.base_path().unwrap(), PathBuf::from("/my/data"));
    }

    #[test]
    fn test_config_provider_base_path_default() {
        let config = SakbeConfig::default();
        let base = config.base_path().unwrap();
        // Falls back to cwd
        assert_eq!(base, std::env::current_dir().unwrap());
    }

    #[test]
    fn test_config_provider_data_path() {
        let config = SakbeConfig {
            base_path: Some("/project".into()),
            ..Default::default()
        };
        let path = config.data_path("models").unwrap();
        assert_eq!(path, PathBuf::from("/project/models"));
    }

    #[test]
    fn test_config_provider_snapshot_dir_override() {
        let config = SakbeConfig {
            base_path: Some("/project".into()),
            snapshot: SnapshotConfig {
                dir: Some("/var/lib/sakbe".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(
            config.data_path("snapshots").unwrap(),
            PathBuf::from("/var/lib/sakbe")
        );
        // Other kinds still resolve under the base path.
        assert_eq!(
            config.data_path("models").unwrap(),
            PathBuf::from("/project/models")
        );
    }

    // ------------------------------------------------------------------------
    // service_config tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_service_config_mapping() {
        let config = SakbeConfig {
            base_path: Some("/project".into()),
            ..Default::default()
        };
        let service = config.service_config().unwrap();
        assert_eq!(service.dimension, 768);
        assert_eq!(service.index.train_threshold, 10_000);
        assert_eq!(service.cache_max_entries, 10_000);
        assert_eq!(
            service.snapshot_dir,
            Some(PathBuf::from("/project/snapshots"))
        );
        assert_eq!(service.snapshot_every_insertions, 100);
        assert_eq!(service.retry_max_attempts, 3);
        assert_eq!(service.retry_initial_delay_ms, 250);
        assert_eq!(service.retry_max_delay_ms, 2_000);
    }

    #[test]
    fn test_service_config_snapshot_dir_override() {
        let config = SakbeConfig {
            snapshot: SnapshotConfig {
                dir: Some("/var/lib/sakbe".into()),
                every_insertions: 25,
            },
            ..Default::default()
        };
        let service = config.service_config().unwrap();
        assert_eq!(service.snapshot_dir, Some(PathBuf::from("/var/lib/sakbe")));
        assert_eq!(service.snapshot_every_insertions, 25);
    }

    // ------------------------------------------------------------------------
    // to_env_vars tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_sakbe_config_to_env_vars() {
        let config = SakbeConfig::default();
        let vars = config.to_env_vars().unwrap();
        let map: HashMap<_, _> = vars.into_iter().collect();
        assert_eq!(map.get("SAKBE_PROJECT_NAME").unwrap(), "sakbe");
        assert_eq!(map.get("SAKBE_EMBEDDING_PROVIDER").unwrap(), "mock");
        assert_eq!(map.get("SAKBE_EMBEDDING_DIMENSION").unwrap(), "768");
        assert_eq!(map.get("SAKBE_INDEX_TRAIN_THRESHOLD").unwrap(), "10000");
        assert_eq!(map.get("SAKBE_SEARCH_TOP_K").unwrap(), "10");
        assert_eq!(map.get("SAKBE_SEARCH_CROSS_LINGUAL").unwrap(), "true");
        assert_eq!(map.get("SAKBE_RETRY_MAX_ATTEMPTS").unwrap(), "3");
    }

    // ------------------------------------------------------------------------
    // Clone + Send + Sync
    // ------------------------------------------------------------------------

    #[test]
    fn test_sakbe_config_is_clone() {
        let config = SakbeConfig::default();
        let cloned = config.clone();
        assert_eq!(config.project_name, cloned.project_name);
    }

    #[test]
    fn test_sakbe_config_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SakbeConfig>();
    }
}
