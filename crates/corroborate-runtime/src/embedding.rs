//! Embedding backend abstraction.
//!
//! A provider turns text into fixed-width vectors. The width is a property
//! of the provider instance and never changes during its lifetime.

use async_trait::async_trait;
use thiserror::Error;

use crate::providers::ProviderError;

/// A dense embedding vector.
pub type Embedding = Vec<f32>;

/// Errors from embedding backends.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Embedding backend failed: {0}")]
    Backend(#[from] ProviderError),

    #[error("Embedding backend returned {actual} vectors for {expected} inputs")]
    CountMismatch { expected: usize, actual: usize },

    #[error("Embedding backend returned width {actual}, expected {expected}")]
    WidthMismatch { expected: usize, actual: usize },
}

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts, one vector per input, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError>;

    /// Width of every vector this provider returns.
    fn dimension(&self) -> usize;

    /// Model name for logs.
    fn model_name(&self) -> &str;

    /// Embed a single text.
    async fn embed_one(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let vectors = self.embed(&[text.to_string()]).await?;
        let [vector]: [Embedding; 1] =
            vectors
                .try_into()
                .map_err(|rest: Vec<Embedding>| EmbeddingError::CountMismatch {
                    expected: 1,
                    actual: rest.len(),
                })?;
        Ok(vector)
    }
}

/// Check a batch returned by a backend against the request.
pub fn check_batch(
    vectors: &[Embedding],
    expected_count: usize,
    dimension: usize,
) -> Result<(), EmbeddingError> {
    if vectors.len() != expected_count {
        return Err(EmbeddingError::CountMismatch {
            expected: expected_count,
            actual: vectors.len(),
        });
    }
    if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
        return Err(EmbeddingError::WidthMismatch {
            expected: dimension,
            actual: bad.len(),
        });
    }
    Ok(())
}
