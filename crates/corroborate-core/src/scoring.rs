//! Score aggregation: per-question answers into an overall percentage.
//!
//! Aggregation is pure and deterministic. Not-relevant answers are excluded
//! from both the earned points and the maximum possible points, and an answer
//! set with no applicable questions yields a zero percentage rather than an
//! error.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::answer::{AnswerCategory, MAX_QUESTION_POINTS};

/// Errors from scoring.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    #[error("Unknown answer category: '{0}'")]
    UnknownAnswerCategory(String),

    #[error("Invalid max question points: {0} (must be finite and positive)")]
    InvalidMaxPoints(f64),
}

/// Score for a single question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionScore {
    pub question_id: String,
    pub category: AnswerCategory,

    /// `None` when the answer is excluded from scoring
    pub points: Option<f64>,
}

/// Overall score for an answer set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateScore {
    pub total_points: f64,
    pub max_possible: f64,
    pub applicable_question_count: usize,

    /// Rounded to two decimals; 0 when nothing is applicable
    pub percentage: f64,
}

impl AggregateScore {
    /// The result for an answer set with no applicable questions.
    pub fn empty() -> Self {
        Self {
            total_points: 0.0,
            max_possible: 0.0,
            applicable_question_count: 0,
            percentage: 0.0,
        }
    }
}

/// Combines per-question answers into an [`AggregateScore`].
#[derive(Debug, Clone, Copy)]
pub struct ScoreAggregator {
    max_question_points: f64,
}

impl Default for ScoreAggregator {
    fn default() -> Self {
        Self {
            max_question_points: MAX_QUESTION_POINTS,
        }
    }
}

impl ScoreAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different per-question maximum.
    pub fn with_max_points(max_question_points: f64) -> Result<Self, ScoringError> {
        if !max_question_points.is_finite() || max_question_points <= 0.0 {
            return Err(ScoringError::InvalidMaxPoints(max_question_points));
        }
        Ok(Self {
            max_question_points,
        })
    }

    pub fn max_question_points(&self) -> f64 {
        self.max_question_points
    }

    /// Aggregate a set of answers.
    ///
    /// Answers are tallied per category before any arithmetic, so the result
    /// is identical for every iteration order of the input.
    pub fn aggregate<'a, I>(&self, answers: I) -> AggregateScore
    where
        I: IntoIterator<Item = &'a AnswerCategory>,
    {
        let mut tally: BTreeMap<AnswerCategory, usize> = BTreeMap::new();
        for category in answers {
            *tally.entry(*category).or_insert(0) += 1;
        }

        let mut applicable = 0usize;
        let mut total_points = 0.0;
        for (category, count) in &tally {
            if let Some(points) = category.score(self.max_question_points) {
                applicable += count;
                total_points += points * *count as f64;
            }
        }

        if applicable == 0 {
            return AggregateScore::empty();
        }

        let max_possible = applicable as f64 * self.max_question_points;
        let percentage = round2(total_points / max_possible * 100.0);

        AggregateScore {
            total_points,
            max_possible,
            applicable_question_count: applicable,
            percentage,
        }
    }

    /// Per-question scores, ordered by question id.
    pub fn question_scores(&self, answers: &BTreeMap<String, AnswerCategory>) -> Vec<QuestionScore> {
        answers
            .iter()
            .map(|(question_id, category)| QuestionScore {
                question_id: question_id.clone(),
                category: *category,
                points: category.score(self.max_question_points),
            })
            .collect()
    }

    /// Aggregate raw questionnaire labels, failing on the first unknown label.
    pub fn aggregate_labels(
        &self,
        answers: &BTreeMap<String, String>,
    ) -> Result<AggregateScore, ScoringError> {
        let categories = parse_labels(answers)?;
        Ok(self.aggregate(categories.values()))
    }
}

/// Parse a map of question id to label into typed categories.
pub fn parse_labels(
    answers: &BTreeMap<String, String>,
) -> Result<BTreeMap<String, AnswerCategory>, ScoringError> {
    answers
        .iter()
        .map(|(question_id, label)| {
            label
                .parse::<AnswerCategory>()
                .map(|category| (question_id.clone(), category))
        })
        .collect()
}

/// Aggregate with the default weight table and [`MAX_QUESTION_POINTS`].
pub fn aggregate(answers: &BTreeMap<String, AnswerCategory>) -> AggregateScore {
    ScoreAggregator::default().aggregate(answers.values())
}

/// Aggregate raw labels with the default configuration.
pub fn aggregate_labels(answers: &BTreeMap<String, String>) -> Result<AggregateScore, ScoringError> {
    ScoreAggregator::default().aggregate_labels(answers)
}

/// Two decimals, ties to even.
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}
