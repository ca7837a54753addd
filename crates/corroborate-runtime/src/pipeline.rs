//! Validation pipeline: retrieve evidence, then judge.
//!
//! Each question is independent. `validate_all` runs several at once and
//! returns one outcome per request, in request order, so a failure on one
//! question never hides the others.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use corroborate_core::{AnswerCategory, ValidationResult};

use crate::config::RuntimeConfig;
use crate::embedding::EmbeddingProvider;
use crate::index::EvidenceIndex;
use crate::judge::{JudgeError, ValidationJudge};
use crate::providers::{LlmProvider, TokenUsage};
use crate::retriever::{EvidenceRetriever, RetrievalError};
use crate::usage::{LlmUsage, UsageTracker};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error(transparent)]
    Judge(#[from] JudgeError),
}

/// One answered question to validate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRequest {
    pub question_id: String,
    pub question: String,

    /// The answer as stated by the assessed site
    pub answer: String,
}

impl QuestionRequest {
    pub fn new(
        question_id: impl Into<String>,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            question_id: question_id.into(),
            question: question.into(),
            answer: answer.into(),
        }
    }

    pub fn for_category(
        question_id: impl Into<String>,
        question: impl Into<String>,
        category: AnswerCategory,
    ) -> Self {
        Self::new(question_id, question, category.label())
    }
}

/// Outcome of validating one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionValidation {
    pub question_id: String,
    pub result: ValidationResult,

    /// Evidence shown to the judge, in relevance order
    pub evidence: Vec<String>,

    pub model: String,
    pub usage: TokenUsage,
    pub validated_at: DateTime<Utc>,
}

impl QuestionValidation {
    /// Suggested score scaled to a question worth `max_points`.
    pub fn suggested_points(&self, max_points: f64) -> f64 {
        self.result.suggested_score * max_points
    }
}

/// Retrieve-then-judge for one question or a whole answer set.
///
/// Token usage from every judgment is accumulated in a
/// [`UsageTracker`](crate::usage::UsageTracker).
pub struct ValidationPipeline {
    retriever: EvidenceRetriever,
    judge: ValidationJudge,
    concurrency: usize,
    usage: UsageTracker,
}

impl ValidationPipeline {
    pub fn new(retriever: EvidenceRetriever, judge: ValidationJudge) -> Self {
        Self {
            retriever,
            judge,
            concurrency: 4,
            usage: UsageTracker::new(),
        }
    }

    /// Wire backends according to `config`.
    pub fn from_config(
        config: &RuntimeConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn EvidenceIndex>,
        provider: Arc<dyn LlmProvider>,
    ) -> Self {
        let mut retriever =
            EvidenceRetriever::new(embedder, index).with_default_k(config.retrieval.top_k);
        if let Some(cache) = &config.retrieval.embedding_cache {
            retriever = retriever.with_cache(cache.build());
        }
        let judge = ValidationJudge::with_config(provider, config.judge.completion_config());

        Self::new(retriever, judge).with_concurrency(config.pipeline.concurrency)
    }

    /// Maximum questions in flight in `validate_all`; at least 1.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn retriever(&self) -> &EvidenceRetriever {
        &self.retriever
    }

    /// Usage accumulated over every successful judgment so far.
    pub fn usage(&self) -> LlmUsage {
        self.usage.snapshot()
    }

    pub async fn validate_question(
        &self,
        request: &QuestionRequest,
    ) -> Result<QuestionValidation, PipelineError> {
        let evidence = self
            .retriever
            .retrieve(&request.question, &request.question_id, None)
            .await?;

        let judgment = self
            .judge
            .evaluate_detailed(&request.question, &request.answer, &evidence)
            .await?;
        self.usage.record(&judgment.usage, &judgment.model);

        tracing::info!(
            question_id = %request.question_id,
            is_valid = judgment.result.is_valid,
            confidence = judgment.result.confidence,
            excerpts = evidence.len(),
            "Validated answer"
        );

        Ok(QuestionValidation {
            question_id: request.question_id.clone(),
            result: judgment.result,
            evidence,
            model: judgment.model,
            usage: judgment.usage,
            validated_at: Utc::now(),
        })
    }

    /// Validate many questions, at most `concurrency` in flight.
    pub async fn validate_all(
        &self,
        requests: &[QuestionRequest],
    ) -> Vec<Result<QuestionValidation, PipelineError>> {
        let outcomes: Vec<_> = stream::iter(requests)
            .map(|request| self.validate_question(request))
            .buffered(self.concurrency)
            .collect()
            .await;

        let failed = outcomes.iter().filter(|o| o.is_err()).count();
        if failed > 0 {
            tracing::warn!(
                total = outcomes.len(),
                failed,
                "Some questions could not be validated"
            );
        }
        outcomes
    }
}
