//! Judgment payloads returned by the validation backend.
//!
//! Parsing is a strict schema boundary. A payload that is not exactly the
//! normative shape is rejected, never repaired.

mod parser;
mod schema;

pub use parser::{parse_judgment, EvidenceQuality, JudgmentError, ValidationResult};
pub use schema::{validate_judgment_schema, SchemaError};
