//! # corroborate-core
//!
//! Deterministic building blocks of evidence-grounded assessment scoring.
//!
//! This crate answers, without any I/O:
//! - What overall score does a completed answer set earn?
//! - How is extracted evidence text cut into retrievable passages?
//! - Is a judgment payload structurally valid and within its numeric bounds?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: same input, same output, for every operation
//! 2. **No backend calls**: embedding, indexing and judgment live in `corroborate-runtime`
//! 3. **Strict**: malformed judgments are rejected, never clamped
//!
//! ## Example
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use corroborate_core::{aggregate, AnswerCategory};
//!
//! let mut answers = BTreeMap::new();
//! answers.insert("q1".to_string(), AnswerCategory::Implemented);
//! answers.insert("q2".to_string(), AnswerCategory::InProgress);
//! answers.insert("q3".to_string(), AnswerCategory::NotRelevant);
//! answers.insert("q4".to_string(), AnswerCategory::NotImplemented);
//!
//! let score = aggregate(&answers);
//! assert_eq!(score.percentage, 50.0);
//! ```

pub mod answer;
pub mod chunker;
pub mod evidence;
pub mod extract;
pub mod judgment;
pub mod scoring;

// Re-export main types at crate root
pub use answer::{score_of, weight_of, AnswerCategory, AnswerWeight, MAX_QUESTION_POINTS};
pub use chunker::{ChunkerConfig, ChunkerError, EvidenceChunker};
pub use evidence::{EvidenceChunk, Metadata};
pub use extract::{ExtractError, FileType};
pub use judgment::{parse_judgment, EvidenceQuality, JudgmentError, ValidationResult};
pub use scoring::{
    aggregate, aggregate_labels, AggregateScore, QuestionScore, ScoreAggregator, ScoringError,
};
