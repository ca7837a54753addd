//! JSON Schema for judgment payloads.
//!
//! The schema is the normative field set: every field required, no extra
//! fields, every score a number in `[0, 1]`.

use std::sync::OnceLock;
use thiserror::Error;

/// Embedded judgment schema (loaded at compile time).
const JUDGMENT_SCHEMA_JSON: &str = include_str!("../../schema/validation_result.schema.json");

/// Compiled JSON Schema validator (initialized once, reused).
static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

/// Errors from schema loading.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Failed to load schema: {0}")]
    LoadError(String),
}

fn get_validator() -> Result<&'static jsonschema::Validator, SchemaError> {
    let result = COMPILED_SCHEMA.get_or_init(|| {
        let schema_value: serde_json::Value = serde_json::from_str(JUDGMENT_SCHEMA_JSON)
            .map_err(|e| format!("Invalid schema JSON: {}", e))?;

        jsonschema::options()
            .build(&schema_value)
            .map_err(|e| format!("Failed to compile schema: {}", e))
    });

    match result {
        Ok(v) => Ok(v),
        Err(e) => Err(SchemaError::LoadError(e.clone())),
    }
}

/// Validate a judgment payload against the schema.
///
/// Returns every violation, each formatted as `message at /json/pointer`.
pub fn validate_judgment_schema(payload: &serde_json::Value) -> Result<(), Vec<String>> {
    let validator = get_validator().map_err(|e| vec![e.to_string()])?;

    let errors: Vec<String> = validator
        .iter_errors(payload)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_payload() -> serde_json::Value {
        json!({
            "is_valid": true,
            "confidence": 0.8,
            "reasoning": "Procedure document describes the control.",
            "suggested_score": 0.9,
            "evidence_quality": {
                "relevance": 0.9,
                "completeness": 0.7,
                "currentness": 0.6
            }
        })
    }

    #[test]
    fn test_valid_payload_passes() {
        assert!(validate_judgment_schema(&valid_payload()).is_ok());
    }

    #[test]
    fn test_confidence_above_one_fails() {
        let mut payload = valid_payload();
        payload["confidence"] = json!(1.5);
        let errors = validate_judgment_schema(&payload).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("/confidence")));
    }

    #[test]
    fn test_negative_sub_score_fails() {
        let mut payload = valid_payload();
        payload["evidence_quality"]["currentness"] = json!(-0.1);
        let errors = validate_judgment_schema(&payload).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("/evidence_quality/currentness")));
    }

    #[test]
    fn test_non_boolean_is_valid_fails() {
        let mut payload = valid_payload();
        payload["is_valid"] = json!("yes");
        assert!(validate_judgment_schema(&payload).is_err());
    }

    #[test]
    fn test_string_number_fails() {
        let mut payload = valid_payload();
        payload["suggested_score"] = json!("0.5");
        assert!(validate_judgment_schema(&payload).is_err());
    }

    #[test]
    fn test_missing_field_fails() {
        let mut payload = valid_payload();
        payload.as_object_mut().unwrap().remove("reasoning");
        assert!(validate_judgment_schema(&payload).is_err());
    }

    #[test]
    fn test_additional_properties_fail() {
        let mut payload = valid_payload();
        payload["verdict"] = json!("pass");
        assert!(validate_judgment_schema(&payload).is_err());
    }

    #[test]
    fn test_boundary_values_pass() {
        let mut payload = valid_payload();
        payload["confidence"] = json!(0);
        payload["suggested_score"] = json!(1);
        assert!(validate_judgment_schema(&payload).is_ok());
    }
}
