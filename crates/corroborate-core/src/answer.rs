//! Answer categories and the fixed weight table.
//!
//! Each category maps to either a fraction of the per-question maximum or to
//! [`AnswerWeight::Excluded`]. Exclusion is its own variant so that a
//! not-relevant answer can never be confused with a zero score.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::scoring::ScoringError;

/// Points awarded to a fully implemented answer.
pub const MAX_QUESTION_POINTS: f64 = 10.0;

/// The answer given to a single assessment question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnswerCategory {
    #[serde(alias = "implemented")]
    Implemented,

    #[serde(rename = "In Progress", alias = "InProgress", alias = "in_progress")]
    InProgress,

    #[serde(
        rename = "Not Implemented",
        alias = "NotImplemented",
        alias = "not_implemented"
    )]
    NotImplemented,

    #[serde(rename = "Not Relevant", alias = "NotRelevant", alias = "not_relevant")]
    NotRelevant,
}

/// Weight of a category: a fraction in `[0, 1]` or an explicit exclusion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnswerWeight {
    Weight(f64),
    Excluded,
}

impl AnswerWeight {
    /// Returns the fraction, or `None` when excluded.
    pub fn fraction(self) -> Option<f64> {
        match self {
            AnswerWeight::Weight(w) => Some(w),
            AnswerWeight::Excluded => None,
        }
    }

    pub fn is_excluded(self) -> bool {
        matches!(self, AnswerWeight::Excluded)
    }
}

impl AnswerCategory {
    /// Every category, in table order.
    pub const ALL: [AnswerCategory; 4] = [
        AnswerCategory::Implemented,
        AnswerCategory::InProgress,
        AnswerCategory::NotImplemented,
        AnswerCategory::NotRelevant,
    ];

    /// Look up the scoring weight for this category.
    pub fn weight(self) -> AnswerWeight {
        match self {
            AnswerCategory::Implemented => AnswerWeight::Weight(1.0),
            AnswerCategory::InProgress => AnswerWeight::Weight(0.5),
            AnswerCategory::NotImplemented => AnswerWeight::Weight(0.0),
            AnswerCategory::NotRelevant => AnswerWeight::Excluded,
        }
    }

    /// Points for this category out of `max_points`, `None` when excluded.
    pub fn score(self, max_points: f64) -> Option<f64> {
        self.weight().fraction().map(|w| w * max_points)
    }

    /// The human label used in questionnaires.
    pub fn label(self) -> &'static str {
        match self {
            AnswerCategory::Implemented => "Implemented",
            AnswerCategory::InProgress => "In Progress",
            AnswerCategory::NotImplemented => "Not Implemented",
            AnswerCategory::NotRelevant => "Not Relevant",
        }
    }
}

/// `weightOf` from the scoring contract.
pub fn weight_of(category: AnswerCategory) -> AnswerWeight {
    category.weight()
}

/// `scoreOf` with the default [`MAX_QUESTION_POINTS`].
pub fn score_of(category: AnswerCategory) -> Option<f64> {
    category.score(MAX_QUESTION_POINTS)
}

impl fmt::Display for AnswerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AnswerCategory {
    type Err = ScoringError;

    /// Case-insensitive; spaces, underscores and hyphens are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "implemented" => Ok(AnswerCategory::Implemented),
            "inprogress" => Ok(AnswerCategory::InProgress),
            "notimplemented" => Ok(AnswerCategory::NotImplemented),
            "notrelevant" => Ok(AnswerCategory::NotRelevant),
            _ => Err(ScoringError::UnknownAnswerCategory(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_table() {
        assert_eq!(weight_of(AnswerCategory::Implemented), AnswerWeight::Weight(1.0));
        assert_eq!(weight_of(AnswerCategory::InProgress), AnswerWeight::Weight(0.5));
        assert_eq!(weight_of(AnswerCategory::NotImplemented), AnswerWeight::Weight(0.0));
        assert_eq!(weight_of(AnswerCategory::NotRelevant), AnswerWeight::Excluded);
    }

    #[test]
    fn test_excluded_is_not_zero() {
        let zero = weight_of(AnswerCategory::NotImplemented);
        let excluded = weight_of(AnswerCategory::NotRelevant);
        assert_ne!(zero, excluded);
        assert_eq!(zero.fraction(), Some(0.0));
        assert_eq!(excluded.fraction(), None);
        assert!(excluded.is_excluded());
    }

    #[test]
    fn test_score_of() {
        assert_eq!(score_of(AnswerCategory::Implemented), Some(10.0));
        assert_eq!(score_of(AnswerCategory::InProgress), Some(5.0));
        assert_eq!(score_of(AnswerCategory::NotImplemented), Some(0.0));
        assert_eq!(score_of(AnswerCategory::NotRelevant), None);
    }

    #[test]
    fn test_parse_labels() {
        assert_eq!("Implemented".parse::<AnswerCategory>().unwrap(), AnswerCategory::Implemented);
        assert_eq!("In Progress".parse::<AnswerCategory>().unwrap(), AnswerCategory::InProgress);
        assert_eq!("not_implemented".parse::<AnswerCategory>().unwrap(), AnswerCategory::NotImplemented);
        assert_eq!("NOT-RELEVANT".parse::<AnswerCategory>().unwrap(), AnswerCategory::NotRelevant);
    }

    #[test]
    fn test_unknown_label_is_error() {
        let result = "Partially".parse::<AnswerCategory>();
        assert!(matches!(
            result,
            Err(ScoringError::UnknownAnswerCategory(label)) if label == "Partially"
        ));
    }

    #[test]
    fn test_labels_round_trip_through_parse() {
        for category in AnswerCategory::ALL {
            assert_eq!(category.label().parse::<AnswerCategory>().unwrap(), category);
        }
    }

    #[test]
    fn test_serde_uses_questionnaire_labels() {
        let json = serde_json::to_string(&AnswerCategory::InProgress).unwrap();
        assert_eq!(json, "\"In Progress\"");

        let parsed: AnswerCategory = serde_json::from_str("\"NotRelevant\"").unwrap();
        assert_eq!(parsed, AnswerCategory::NotRelevant);
    }
}
