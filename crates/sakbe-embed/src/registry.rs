//! Language-to-backend routing.
//!
//! The registry maps language codes to embedding backends. Languages without
//! a dedicated backend resolve to the multilingual fallback, so cross-lingual
//! corpora work out of the box as long as one fallback model is configured.

use std::collections::HashMap;
use std::sync::Arc;

use sakbe_core::{Error, Result, normalize_language};

use crate::backend::EmbeddingBackend;

/// Routes language codes to embedding backends.
///
/// Language codes are matched case-insensitively and with surrounding
/// whitespace ignored. Resolution prefers a dedicated per-language backend
/// and falls back to the multilingual backend; it fails only when neither
/// exists.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use sakbe_embed::{EmbeddingBackendRegistry, MockEmbeddingBackend};
///
/// let mut registry =
///     EmbeddingBackendRegistry::with_fallback(Arc::new(MockEmbeddingBackend::new(8)));
/// registry.register("yua", Arc::new(MockEmbeddingBackend::new(8).with_name("maya")));
///
/// assert_eq!(registry.resolve("YUA").unwrap().name(), "maya");
/// assert_eq!(registry.resolve("fr").unwrap().name(), "mock");
/// ```
#[derive(Clone, Debug, Default)]
pub struct EmbeddingBackendRegistry {
    by_language: HashMap<String, Arc<dyn EmbeddingBackend>>,
    fallback: Option<Arc<dyn EmbeddingBackend>>,
}

impl EmbeddingBackendRegistry {
    /// Create an empty registry with no backends.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with only a multilingual fallback.
    pub fn with_fallback(backend: Arc<dyn EmbeddingBackend>) -> Self {
        Self {
            by_language: HashMap::new(),
            fallback: Some(backend),
        }
    }

    /// Register a dedicated backend for a language.
    ///
    /// Replaces any previous registration for the same language.
    pub fn register(&mut self, language: &str, backend: Arc<dyn EmbeddingBackend>) {
        self.by_language
            .insert(normalize_language(language), backend);
    }

    /// Register one backend for several languages at once.
    pub fn register_many(&mut self, languages: &[&str], backend: Arc<dyn EmbeddingBackend>) {
        for language in languages {
            self.register(language, Arc::clone(&backend));
        }
    }

    /// Set the multilingual fallback backend.
    pub fn set_fallback(&mut self, backend: Arc<dyn EmbeddingBackend>) {
        self.fallback = Some(backend);
    }

    /// Resolve the backend for a language.
    ///
    /// Returns the dedicated backend if one is registered, otherwise the
    /// multilingual fallback.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnsupportedLanguage` when the language has no
    /// dedicated backend and no fallback is configured.
    pub fn resolve(&self, language: &str) -> Result<Arc<dyn EmbeddingBackend>> {
        let key = normalize_language(language);
        if let Some(backend) = self.by_language.get(&key) {
            return Ok(Arc::clone(backend));
        }
        self.fallback
            .as_ref()
            .map(Arc::clone)
            .ok_or_else(|| Error::unsupported_language(key))
    }

    /// Languages with a dedicated backend, sorted.
    pub fn languages(&self) -> Vec<String> {
        let mut langs: Vec<String> = self.by_language.keys().cloned().collect();
        langs.sort();
        langs
    }

    /// Whether a multilingual fallback is configured.
    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

// ============================================================================
// Tests
// ============================================================================
