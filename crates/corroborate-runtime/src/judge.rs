//! Evidence-grounded judgment of one answer.
//!
//! The judge renders a prompt, makes exactly one backend call and parses the
//! reply strictly. It never retries: a malformed judgment or backend failure
//! is returned to the caller, who decides whether to ask again.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use corroborate_core::{parse_judgment, JudgmentError, ValidationResult};

use crate::prompts::{render_judgment_prompt, JUDGE_SYSTEM_PROMPT};
use crate::providers::{ChatMessage, CompletionConfig, LlmProvider, ProviderError, TokenUsage};

#[derive(Error, Debug)]
pub enum JudgeError {
    #[error("Judgment backend failed: {0}")]
    Backend(#[from] ProviderError),

    #[error("Malformed judgment: {0}")]
    MalformedJudgment(#[from] JudgmentError),
}

/// A parsed judgment with the backend details that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Judgment {
    pub result: ValidationResult,
    pub usage: TokenUsage,

    /// Model reported by the backend
    pub model: String,
}

/// Asks a language model whether retrieved evidence supports an answer.
///
/// One request per evaluation, no retries. A response that fails strict
/// parsing is a [`JudgeError::MalformedJudgment`], never a partial result.
pub struct ValidationJudge {
    provider: Arc<dyn LlmProvider>,
    config: CompletionConfig,
}

impl ValidationJudge {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self::with_config(provider, CompletionConfig::default())
    }

    /// # Arguments
    ///
    /// * `provider` - Backend that serves judgment requests
    /// * `config` - Model, token limit, temperature and timeout per request
    pub fn with_config(provider: Arc<dyn LlmProvider>, config: CompletionConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }

    /// Judge whether `evidence` supports `answer` to `question`.
    ///
    /// Evidence is presented to the backend in the order given.
    pub async fn evaluate(
        &self,
        question: &str,
        answer: &str,
        evidence: &[String],
    ) -> Result<ValidationResult, JudgeError> {
        Ok(self.evaluate_detailed(question, answer, evidence).await?.result)
    }

    /// Like [`evaluate`](Self::evaluate), also returning token usage.
    pub async fn evaluate_detailed(
        &self,
        question: &str,
        answer: &str,
        evidence: &[String],
    ) -> Result<Judgment, JudgeError> {
        let messages = vec![
            ChatMessage::system(JUDGE_SYSTEM_PROMPT),
            ChatMessage::user(render_judgment_prompt(question, answer, evidence)),
        ];

        let response = self.provider.complete(messages, &self.config).await?;

        tracing::debug!(
            provider = self.provider.name(),
            model = %response.model,
            prompt_tokens = response.usage.prompt_tokens,
            completion_tokens = response.usage.completion_tokens,
            excerpts = evidence.len(),
            "Judgment received"
        );

        let result = parse_judgment(&response.content).map_err(|e| {
            tracing::warn!(
                provider = self.provider.name(),
                model = %response.model,
                payload_chars = response.content.chars().count(),
                stop_reason = response.stop_reason.as_deref().unwrap_or("unknown"),
                error = %e,
                "Malformed judgment payload"
            );
            e
        })?;

        Ok(Judgment {
            result,
            usage: response.usage,
            model: response.model,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{sample_judgment, ScriptedProvider};

    fn evidence() -> Vec<String> {
        vec![
            "Lockout procedure LP-04 signed off March 2024.".to_string(),
            "Isolation points are tagged before maintenance.".to_string(),
        ]
    }

    #[tokio::test]
    async fn test_valid_judgment() {
        let provider = Arc::new(ScriptedProvider::new().with_response(sample_judgment(true, 0.85)));
        let judge = ValidationJudge::new(provider.clone());

        let result = judge
            .evaluate("Is there a lockout procedure?", "Implemented", &evidence())
            .await
            .unwrap();

        assert!(result.is_valid);
        assert_eq!(result.confidence, 0.85);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_prompt_carries_question_answer_and_ordered_evidence() {
        let provider = Arc::new(ScriptedProvider::new().with_response(sample_judgment(true, 0.9)));
        let judge = ValidationJudge::new(provider.clone());

        judge
            .evaluate("Is there a lockout procedure?", "In Progress", &evidence())
            .await
            .unwrap();

        let requests = provider.requests();
        let messages = &requests[0];
        assert_eq!(messages[0], ChatMessage::system(JUDGE_SYSTEM_PROMPT));

        let user = &messages[1].content;
        assert!(user.contains("Is there a lockout procedure?"));
        assert!(user.contains("In Progress"));
        let first = user.find("LP-04").unwrap();
        let second = user.find("Isolation points").unwrap();
        assert!(first < second);
    }

    #[tokio::test]
    async fn test_out_of_range_confidence_is_malformed() {
        let provider = Arc::new(ScriptedProvider::new().with_response(sample_judgment(true, 1.5)));
        let judge = ValidationJudge::new(provider.clone());

        let err = judge.evaluate("Q", "Implemented", &evidence()).await.unwrap_err();
        assert!(matches!(err, JudgeError::MalformedJudgment(_)));
        // No retry.
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_non_boolean_is_valid_is_malformed() {
        let payload = r#"{
            "is_valid": "yes",
            "confidence": 0.8,
            "reasoning": "ok",
            "suggested_score": 0.8,
            "evidence_quality": {"relevance": 0.8, "completeness": 0.8, "currentness": 0.8}
        }"#;
        let provider = Arc::new(ScriptedProvider::new().with_response(payload));
        let judge = ValidationJudge::new(provider);

        let err = judge.evaluate("Q", "A", &[]).await.unwrap_err();
        assert!(matches!(
            err,
            JudgeError::MalformedJudgment(JudgmentError::SchemaViolation(_))
        ));
    }

    #[tokio::test]
    async fn test_fenced_payload_accepted() {
        let payload = format!("```json\n{}\n```", sample_judgment(false, 0.4));
        let provider = Arc::new(ScriptedProvider::new().with_response(payload));
        let judge = ValidationJudge::new(provider);

        let result = judge.evaluate("Q", "A", &evidence()).await.unwrap();
        assert!(!result.is_valid);
    }

    #[tokio::test]
    async fn test_backend_error_surfaces() {
        let provider = Arc::new(ScriptedProvider::new().with_error(ProviderError::RateLimited {
            retry_after: None,
        }));
        let judge = ValidationJudge::new(provider.clone());

        let err = judge.evaluate("Q", "A", &evidence()).await.unwrap_err();
        assert!(matches!(
            err,
            JudgeError::Backend(ProviderError::RateLimited { .. })
        ));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_detailed_reports_usage() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .with_usage(TokenUsage {
                    prompt_tokens: 420,
                    completion_tokens: 80,
                })
                .with_response(sample_judgment(true, 0.7)),
        );
        let judge = ValidationJudge::with_config(
            provider,
            CompletionConfig {
                model: "judge-test".to_string(),
                ..Default::default()
            },
        );

        let judgment = judge.evaluate_detailed("Q", "A", &evidence()).await.unwrap();
        assert_eq!(judgment.usage.total(), 500);
        assert_eq!(judgment.model, "judge-test");
    }
}
