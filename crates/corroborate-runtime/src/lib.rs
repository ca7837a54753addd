//! # corroborate-runtime
//!
//! Evidence retrieval and LLM-assisted answer validation for Corroborate.
//!
//! Everything that talks to a backend lives here: embedding providers, the
//! per-question evidence index, the retriever and the judge. Backends are
//! injected as trait objects so tests and offline runs can swap in the
//! deterministic fakes from [`mock`].
//!
//! Scoring a completed answer set needs none of this; see `corroborate-core`.
//!
//! ## Flow
//!
//! - Ingestion: text → [`EvidenceChunker`](corroborate_core::EvidenceChunker)
//!   → [`EmbeddingProvider`] → [`EvidenceIndex::store`]
//! - Validation: question → [`EvidenceRetriever`] → [`ValidationJudge`]
//!   → [`ValidationResult`](corroborate_core::ValidationResult)
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use corroborate_runtime::{
//!     EvidenceRetriever, InMemoryEvidenceIndex, QuestionRequest, ValidationJudge,
//!     ValidationPipeline,
//! };
//!
//! let index = Arc::new(InMemoryEvidenceIndex::new());
//! let retriever = EvidenceRetriever::new(embedder.clone(), index.clone());
//! let judge = ValidationJudge::new(provider);
//! let pipeline = ValidationPipeline::new(retriever, judge);
//!
//! let request = QuestionRequest::new("q-12", "Are fire drills logged?", "Implemented");
//! let validation = pipeline.validate_question(&request).await?;
//! println!("valid: {}", validation.result.is_valid);
//! ```

pub mod cache;
pub mod config;
pub mod embedding;
pub mod extract;
pub mod index;
pub mod ingest;
pub mod judge;
pub mod pipeline;
pub mod prompts;
pub mod providers;
pub mod retriever;
pub mod usage;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use cache::{EmbeddingCache, EmbeddingKey};
pub use config::{
    ConfigError, EmbeddingCacheConfig, JudgeConfig, PipelineConfig, RetrievalConfig,
    RuntimeConfig,
};
pub use embedding::{Embedding, EmbeddingError, EmbeddingProvider};
pub use extract::{extract_path, TextExtractor};
pub use index::{
    EvidenceIndex, EvidenceIndexEntry, EvidenceMatch, InMemoryEvidenceIndex, IndexError,
};
pub use ingest::{EvidenceIngestor, IngestError, IngestReport};
pub use judge::{JudgeError, Judgment, ValidationJudge};
pub use pipeline::{PipelineError, QuestionRequest, QuestionValidation, ValidationPipeline};
pub use providers::{
    ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError, Role,
    TokenUsage,
};
pub use retriever::{EvidenceRetriever, RetrievalError, DEFAULT_TOP_K};
pub use usage::{LlmUsage, UsageTracker};
