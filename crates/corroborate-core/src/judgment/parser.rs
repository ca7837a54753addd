//! Strict parsing of judgment payloads into [`ValidationResult`].
//!
//! The payload must be a single JSON object matching the judgment schema.
//! A single markdown code fence around the whole payload is unwrapped; any
//! other surrounding text is rejected. Values are never clamped or coerced.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::schema::validate_judgment_schema;

lazy_static! {
    /// A payload wrapped in one markdown code fence, optionally tagged.
    static ref FENCED_PAYLOAD: Regex =
        Regex::new(r"(?s)^```[A-Za-z0-9_-]*[ \t]*\r?\n(.*?)\r?\n?[ \t]*```$").unwrap();
}

/// Errors from judgment parsing. Any of these means the payload is malformed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum JudgmentError {
    #[error("Judgment is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Judgment violates schema: {}", .0.join("; "))]
    SchemaViolation(Vec<String>),

    #[error("Judgment field {field} out of range [0, 1]: {value}")]
    OutOfRange { field: &'static str, value: f64 },
}

/// Quality sub-scores for the evidence behind a judgment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvidenceQuality {
    pub relevance: f64,
    pub completeness: f64,
    pub currentness: f64,
}

/// Judgment of one answer against its evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidationResult {
    /// Whether the evidence supports the stated answer
    pub is_valid: bool,

    /// Confidence in the judgment (0.0 - 1.0)
    pub confidence: f64,

    pub reasoning: String,

    /// Recommended score as a fraction of the question maximum (0.0 - 1.0)
    pub suggested_score: f64,

    pub evidence_quality: EvidenceQuality,
}

impl ValidationResult {
    /// Check every bounded field is within `[0, 1]`.
    pub fn validate(&self) -> Result<(), JudgmentError> {
        let fields = [
            ("confidence", self.confidence),
            ("suggested_score", self.suggested_score),
            ("evidence_quality.relevance", self.evidence_quality.relevance),
            ("evidence_quality.completeness", self.evidence_quality.completeness),
            ("evidence_quality.currentness", self.evidence_quality.currentness),
        ];

        for (field, value) in fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(JudgmentError::OutOfRange { field, value });
            }
        }
        Ok(())
    }
}

/// Parse and validate a raw judgment payload.
pub fn parse_judgment(payload: &str) -> Result<ValidationResult, JudgmentError> {
    let body = unwrap_fence(payload.trim());

    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| JudgmentError::InvalidJson(e.to_string()))?;

    validate_judgment_schema(&value).map_err(JudgmentError::SchemaViolation)?;

    let result: ValidationResult =
        serde_json::from_value(value).map_err(|e| JudgmentError::InvalidJson(e.to_string()))?;

    result.validate()?;
    Ok(result)
}

fn unwrap_fence(payload: &str) -> &str {
    FENCED_PAYLOAD
        .captures(payload)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "is_valid": true,
        "confidence": 0.85,
        "reasoning": "The emergency response plan names the drill schedule.",
        "suggested_score": 1.0,
        "evidence_quality": {
            "relevance": 0.9,
            "completeness": 0.8,
            "currentness": 0.7
        }
    }"#;

    #[test]
    fn test_parse_valid_payload() {
        let result = parse_judgment(VALID).unwrap();
        assert!(result.is_valid);
        assert_eq!(result.confidence, 0.85);
        assert_eq!(result.suggested_score, 1.0);
        assert_eq!(result.evidence_quality.currentness, 0.7);
    }

    #[test]
    fn test_parse_fenced_payload() {
        let fenced = format!("```json\n{}\n```", VALID);
        assert!(parse_judgment(&fenced).is_ok());

        let untagged = format!("  ```\n{}\n```\n", VALID);
        assert!(parse_judgment(&untagged).is_ok());
    }

    #[test]
    fn test_surrounding_prose_rejected() {
        let chatty = format!("Here is my assessment:\n{}", VALID);
        assert!(matches!(
            parse_judgment(&chatty),
            Err(JudgmentError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_confidence_out_of_range_rejected() {
        let payload = VALID.replace("0.85", "1.5");
        assert!(matches!(
            parse_judgment(&payload),
            Err(JudgmentError::SchemaViolation(_))
        ));
    }

    #[test]
    fn test_non_boolean_is_valid_rejected() {
        let payload = VALID.replace("\"is_valid\": true", "\"is_valid\": \"yes\"");
        assert!(matches!(
            parse_judgment(&payload),
            Err(JudgmentError::SchemaViolation(_))
        ));
    }

    #[test]
    fn test_missing_quality_rejected() {
        let payload = r#"{"is_valid": false, "confidence": 0.2, "reasoning": "", "suggested_score": 0.0}"#;
        assert!(matches!(
            parse_judgment(payload),
            Err(JudgmentError::SchemaViolation(_))
        ));
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(matches!(
            parse_judgment("[1, 2, 3]"),
            Err(JudgmentError::SchemaViolation(_))
        ));
        assert!(matches!(
            parse_judgment(""),
            Err(JudgmentError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_validate_reports_field() {
        let mut result = parse_judgment(VALID).unwrap();
        result.evidence_quality.relevance = -0.2;

        assert_eq!(
            result.validate(),
            Err(JudgmentError::OutOfRange {
                field: "evidence_quality.relevance",
                value: -0.2
            })
        );
    }

    #[test]
    fn test_validate_rejects_nan() {
        let mut result = parse_judgment(VALID).unwrap();
        result.confidence = f64::NAN;
        assert!(matches!(
            result.validate(),
            Err(JudgmentError::OutOfRange { field: "confidence", .. })
        ));
    }

    #[test]
    fn test_serializes_normative_field_set() {
        let result = parse_judgment(VALID).unwrap();
        let value = serde_json::to_value(&result).unwrap();
        assert!(validate_judgment_schema(&value).is_ok());
    }
}
