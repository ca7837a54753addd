//! Caching layer for query embeddings.
//!
//! Question texts repeat across validation runs, so their embeddings are
//! kept in memory to avoid paying for the same backend call twice.

use moka::future::Cache;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use crate::embedding::Embedding;

/// Cache key: the embedding model plus a hash of the input text.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EmbeddingKey {
    model: String,
    text_hash: u64,
    text_len: usize,
}

impl EmbeddingKey {
    pub fn new(model: &str, text: &str) -> Self {
        Self {
            model: model.to_string(),
            text_hash: hash_text(text),
            text_len: text.len(),
        }
    }
}

/// Embedding cache using moka.
#[derive(Clone)]
pub struct EmbeddingCache {
    cache: Cache<EmbeddingKey, Arc<Embedding>>,
}

impl std::fmt::Debug for EmbeddingCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingCache")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl EmbeddingCache {
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();

        Self { cache }
    }

    pub async fn get(&self, key: &EmbeddingKey) -> Option<Arc<Embedding>> {
        self.cache.get(key).await
    }

    pub async fn insert(&self, key: EmbeddingKey, embedding: Embedding) -> Arc<Embedding> {
        let embedding = Arc::new(embedding);
        self.cache.insert(key, Arc::clone(&embedding)).await;
        embedding
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Approximate; moka applies writes lazily.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    pub async fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks().await;
    }
}

impl Default for EmbeddingCache {
    fn default() -> Self {
        Self::new(10_000, Duration::from_secs(3600))
    }
}

fn hash_text(text: &str) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cache_operations() {
        let cache = EmbeddingCache::default();
        let key = EmbeddingKey::new("hash-embedder", "Is there a written PPE policy?");

        assert!(cache.get(&key).await.is_none());

        cache.insert(key.clone(), vec![0.5, 0.5]).await;
        let cached = cache.get(&key).await.unwrap();
        assert_eq!(*cached, vec![0.5, 0.5]);

        cache.invalidate_all();
        cache.run_pending_tasks().await;
        assert!(cache.get(&key).await.is_none());
    }

    #[test]
    fn test_key_includes_model() {
        let a = EmbeddingKey::new("model-a", "same text");
        let b = EmbeddingKey::new("model-b", "same text");
        assert_ne!(a, b);
        assert_eq!(a, EmbeddingKey::new("model-a", "same text"));
    }

    #[tokio::test]
    async fn test_ttl_expiry() {
        let cache = EmbeddingCache::new(16, Duration::from_millis(50));
        let key = EmbeddingKey::new("m", "question");
        cache.insert(key.clone(), vec![1.0]).await;
        assert!(cache.get(&key).await.is_some());

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(cache.get(&key).await.is_none());
    }
}
