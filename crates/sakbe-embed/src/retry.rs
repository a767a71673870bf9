//! Retry wrapper for embedding backends.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};

use sakbe_core::{Error, Result};

use crate::backend::EmbeddingBackend;

/// Wraps an embedding backend with retry logic.
///
/// Only transient failures (`Error::is_retryable`) are retried; validation
/// and configuration errors surface immediately. The wrapper reports the
/// inner backend's name and dimension, so it is transparent to the
/// embedding cache.
pub struct RetryingBackend {
    inner: Arc<dyn EmbeddingBackend>,
    max_attempts: u32,
    initial_delay: Duration,
    max_delay: Duration,
}

impl RetryingBackend {
    /// Creates a new retry wrapper with default settings.
    ///
    /// Default settings:
    /// - Max attempts: 3
    /// - Initial delay: 250 milliseconds
    /// - Max delay: 2 seconds
    /// - Multiplier: 2.0 (exponential backoff)
    pub fn new(backend: Arc<dyn EmbeddingBackend>) -> Self {
        Self {
            inner: backend,
            max_attempts: 3,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(2),
        }
    }

    /// Sets the maximum number of retry attempts.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the initial delay between retries.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay between retries.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Determines if an error should be retried.
    fn should_retry(error: &Error) -> bool {
        error.is_retryable()
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.initial_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_attempts as usize)
    }
}

#[async_trait]
impl EmbeddingBackend for RetryingBackend {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let backend = self.inner.clone();
        let text = text.to_string();

        (|| async { backend.embed(&text).await })
            .retry(self.backoff())
            .when(Self::should_retry)
            .await
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let backend = self.inner.clone();
        let texts: Vec<String> = texts.iter().map(|t| t.to_string()).collect();

        (|| async {
            let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
            backend.embed_batch(&refs).await
        })
        .retry(self.backoff())
        .when(Self::should_retry)
        .await
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
