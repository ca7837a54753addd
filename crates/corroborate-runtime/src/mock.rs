//! Deterministic backends for tests and offline runs.
//!
//! Enabled for this crate's own tests and, for downstream crates, with the
//! `mock` feature.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use corroborate_core::{ExtractError, FileType};

use crate::embedding::{Embedding, EmbeddingError, EmbeddingProvider};
use crate::extract::TextExtractor;
use crate::providers::{
    ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError, TokenUsage,
};

/// Bag-of-words embedder: each lowercase word is hashed into a bucket.
///
/// Texts sharing words land close under cosine similarity, which is enough
/// to exercise ranking without a model.
#[derive(Debug)]
pub struct HashEmbedder {
    dimension: usize,
    calls: AtomicUsize,
    fail: bool,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    /// Every `embed` call fails with a backend error.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Number of `embed` calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vector(&self, text: &str) -> Embedding {
        let mut vector = vec![0.0f32; self.dimension];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            let bucket = (hasher.finish() % self.dimension as u64) as usize;
            vector[bucket] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProviderError::HttpError("embedding backend unavailable".to_string()).into());
        }
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "hash-embedder"
    }
}

type Responder = Box<dyn Fn(&[ChatMessage]) -> Result<String, ProviderError> + Send + Sync>;

/// Judgment backend replaying canned payloads.
///
/// Queued responses are served first, in order. Once the queue is empty the
/// responder (if any) answers; otherwise the call fails.
pub struct ScriptedProvider {
    queue: Mutex<VecDeque<Result<String, ProviderError>>>,
    responder: Option<Responder>,
    usage: TokenUsage,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            responder: None,
            usage: TokenUsage {
                prompt_tokens: 100,
                completion_tokens: 50,
            },
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_response(self, payload: impl Into<String>) -> Self {
        self.queue.lock().push_back(Ok(payload.into()));
        self
    }

    pub fn with_error(self, error: ProviderError) -> Self {
        self.queue.lock().push_back(Err(error));
        self
    }

    /// Answer every call with the same payload.
    pub fn repeating(self, payload: impl Into<String>) -> Self {
        let payload = payload.into();
        self.with_responder(move |_| Ok(payload.clone()))
    }

    /// Compute the payload from the request messages.
    pub fn with_responder<F>(mut self, responder: F) -> Self
    where
        F: Fn(&[ChatMessage]) -> Result<String, ProviderError> + Send + Sync + 'static,
    {
        self.responder = Some(Box::new(responder));
        self
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = usage;
        self
    }

    /// Messages of every call made so far.
    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        let queued = self.queue.lock().pop_front();
        let content = match (queued, &self.responder) {
            (Some(scripted), _) => scripted,
            (None, Some(responder)) => responder(&messages),
            (None, None) => Err(ProviderError::NotConfigured(
                "scripted provider has no responses left".to_string(),
            )),
        };
        self.requests.lock().push(messages);

        Ok(CompletionResponse {
            content: content?,
            usage: self.usage,
            model: config.model.clone(),
            stop_reason: Some("end_turn".to_string()),
        })
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Extractor serving fixed text per path.
#[derive(Debug, Default)]
pub struct StaticExtractor {
    texts: HashMap<String, String>,
    calls: AtomicUsize,
}

impl StaticExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, path: impl Into<String>, text: impl Into<String>) -> Self {
        self.texts.insert(path.into(), text.into());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextExtractor for StaticExtractor {
    async fn extract(&self, path: &Path, _file_type: FileType) -> Result<String, ExtractError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let key = path.to_string_lossy();
        self.texts
            .get(key.as_ref())
            .cloned()
            .ok_or_else(|| ExtractError::Failed(format!("no text for {}", key)))
    }
}

/// A well-formed judgment payload with every sub-score equal to `confidence`.
pub fn sample_judgment(is_valid: bool, confidence: f64) -> String {
    serde_json::json!({
        "is_valid": is_valid,
        "confidence": confidence,
        "reasoning": "Excerpt [1] documents the procedure.",
        "suggested_score": confidence,
        "evidence_quality": {
            "relevance": confidence,
            "completeness": confidence,
            "currentness": confidence
        }
    })
    .to_string()
}
