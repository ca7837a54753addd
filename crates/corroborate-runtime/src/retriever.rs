//! Question-driven evidence retrieval.
//!
//! Embeds the question text and asks the index for the closest chunks in
//! that question's partition. Only chunk texts are returned, in relevance
//! order, ready for prompting.

use std::sync::Arc;
use thiserror::Error;

use crate::cache::{EmbeddingCache, EmbeddingKey};
use crate::embedding::{Embedding, EmbeddingError, EmbeddingProvider};
use crate::index::{EvidenceIndex, EvidenceMatch, IndexError};

/// Number of chunks returned when the caller does not ask for a specific k.
pub const DEFAULT_TOP_K: usize = 3;

#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("Failed to embed question: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Index(#[from] IndexError),
}

impl RetrievalError {
    /// True when the question has no indexed evidence yet.
    pub fn is_partition_not_found(&self) -> bool {
        matches!(self, RetrievalError::Index(IndexError::PartitionNotFound(_)))
    }
}

/// Finds the evidence chunks most relevant to a question.
///
/// The question text is embedded with the injected [`EmbeddingProvider`] and
/// matched only against the partition stored for that question id.
pub struct EvidenceRetriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn EvidenceIndex>,
    cache: Option<EmbeddingCache>,
    default_k: usize,
}

impl EvidenceRetriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, index: Arc<dyn EvidenceIndex>) -> Self {
        Self {
            embedder,
            index,
            cache: None,
            default_k: DEFAULT_TOP_K,
        }
    }

    /// Reuse question embeddings across calls.
    pub fn with_cache(mut self, cache: EmbeddingCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// `k` used when a call passes `None`.
    pub fn with_default_k(mut self, k: usize) -> Self {
        self.default_k = k;
        self
    }

    pub fn default_k(&self) -> usize {
        self.default_k
    }

    /// Top-k chunk texts for a question, best first.
    ///
    /// `k = None` uses the configured default. Fails with
    /// `IndexError::PartitionNotFound` when no evidence was stored for
    /// `question_id`.
    pub async fn retrieve(
        &self,
        question_text: &str,
        question_id: &str,
        k: Option<usize>,
    ) -> Result<Vec<String>, RetrievalError> {
        let matches = self.retrieve_matches(question_text, question_id, k).await?;
        Ok(matches.into_iter().map(|m| m.chunk.text).collect())
    }

    /// Like [`retrieve`](Self::retrieve) but keeps scores and metadata.
    pub async fn retrieve_matches(
        &self,
        question_text: &str,
        question_id: &str,
        k: Option<usize>,
    ) -> Result<Vec<EvidenceMatch>, RetrievalError> {
        let k = k.unwrap_or(self.default_k);
        let embedding = self.question_embedding(question_text).await?;

        let matches = self.index.query(question_id, &embedding, k).await?;

        tracing::debug!(
            question_id,
            k,
            hits = matches.len(),
            top_score = matches.first().map(|m| m.score),
            "Retrieved evidence"
        );
        Ok(matches)
    }

    async fn question_embedding(&self, question_text: &str) -> Result<Arc<Embedding>, EmbeddingError> {
        let Some(cache) = &self.cache else {
            return Ok(Arc::new(self.embedder.embed_one(question_text).await?));
        };

        let key = EmbeddingKey::new(self.embedder.model_name(), question_text);
        if let Some(hit) = cache.get(&key).await {
            tracing::trace!("Question embedding cache hit");
            return Ok(hit);
        }

        let embedding = self.embedder.embed_one(question_text).await?;
        Ok(cache.insert(key, embedding).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::InMemoryEvidenceIndex;
    use crate::mock::HashEmbedder;
    use corroborate_core::{EvidenceChunk, Metadata};

    async fn seeded(embedder: Arc<HashEmbedder>) -> Arc<InMemoryEvidenceIndex> {
        let index = Arc::new(InMemoryEvidenceIndex::new());
        let texts = [
            "All staff wear hard hats and safety boots on site.",
            "Quarterly fire drills are logged in the facilities register.",
            "Visitors sign in at reception and receive a badge.",
            "The canteen menu changes every week.",
        ];
        let chunks: Vec<EvidenceChunk> = texts.iter().map(|t| EvidenceChunk::new(*t)).collect();
        let inputs: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
        let vectors = embedder.embed(&inputs).await.unwrap();

        index
            .store("q-fire", chunks, vectors, Metadata::new())
            .await
            .unwrap();
        index
    }

    #[tokio::test]
    async fn test_retrieve_returns_texts_in_rank_order() {
        let embedder = Arc::new(HashEmbedder::new(256));
        let index = seeded(Arc::clone(&embedder)).await;
        let retriever = EvidenceRetriever::new(embedder, index);

        let texts = retriever
            .retrieve("Are fire drills logged quarterly?", "q-fire", None)
            .await
            .unwrap();

        assert_eq!(texts.len(), DEFAULT_TOP_K);
        assert_eq!(
            texts[0],
            "Quarterly fire drills are logged in the facilities register."
        );
    }

    #[tokio::test]
    async fn test_retrieve_explicit_k() {
        let embedder = Arc::new(HashEmbedder::new(64));
        let index = seeded(Arc::clone(&embedder)).await;
        let retriever = EvidenceRetriever::new(embedder, index);

        let one = retriever.retrieve("badge", "q-fire", Some(1)).await.unwrap();
        assert_eq!(one.len(), 1);

        let all = retriever.retrieve("badge", "q-fire", Some(50)).await.unwrap();
        assert_eq!(all.len(), 4);
    }

    #[tokio::test]
    async fn test_partition_not_found_propagates() {
        let embedder = Arc::new(HashEmbedder::new(64));
        let index = seeded(Arc::clone(&embedder)).await;
        let retriever = EvidenceRetriever::new(embedder, index);

        let err = retriever
            .retrieve("Is PPE worn?", "q-ppe", None)
            .await
            .unwrap_err();

        assert!(err.is_partition_not_found());
        assert!(matches!(
            err,
            RetrievalError::Index(IndexError::PartitionNotFound(ref id)) if id == "q-ppe"
        ));
    }

    #[tokio::test]
    async fn test_cache_skips_repeat_embedding() {
        let embedder = Arc::new(HashEmbedder::new(64));
        let index = seeded(Arc::clone(&embedder)).await;
        let calls_after_seed = embedder.call_count();

        let retriever = EvidenceRetriever::new(embedder.clone(), index)
            .with_cache(EmbeddingCache::default());

        let first = retriever.retrieve("fire drills", "q-fire", None).await.unwrap();
        let second = retriever.retrieve("fire drills", "q-fire", None).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(embedder.call_count(), calls_after_seed + 1);
    }
}
