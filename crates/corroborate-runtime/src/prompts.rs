//! Prompts for the judgment backend.
//!
//! The system prompt is static so providers can cache it. Question, answer
//! and evidence go in the user turn.
//!
//! The wording is tunable. The JSON field set and the `[0, 1]` ranges are
//! not: they must match `validation_result.schema.json` in corroborate-core.

/// System prompt establishing the auditor role and the output contract.
pub const JUDGE_SYSTEM_PROMPT: &str = r#"
You are an industrial compliance auditor checking assessment answers against
documentary evidence.

You are given one assessment question, the answer the site gave, and numbered
evidence excerpts retrieved from the documents they submitted. Decide whether
the excerpts support the stated answer.

## Audit Rules
1. Judge ONLY from the excerpts provided - do not assume documents you were not shown
2. Look for concrete policies, procedures, records or implementation details
3. Excerpts that are off-topic lower relevance, not validity on their own
4. Missing or partial evidence lowers completeness
5. Dated or superseded material lowers currentness

## Output Format (JSON)
Respond with exactly one JSON object and nothing else:
{
  "is_valid": true | false,
  "confidence": 0.0-1.0,
  "reasoning": "brief explanation citing excerpt numbers",
  "suggested_score": 0.0-1.0,
  "evidence_quality": {
    "relevance": 0.0-1.0,
    "completeness": 0.0-1.0,
    "currentness": 0.0-1.0
  }
}

Every number MUST lie between 0.0 and 1.0 inclusive. Do not add fields.
"#;

/// Marker rendered when retrieval produced no excerpts.
pub const NO_EVIDENCE_MARKER: &str = "(no evidence excerpts were retrieved)";

/// Render the user turn for one judgment.
///
/// Excerpts keep their retrieval order, which is relevance order.
pub fn render_judgment_prompt(question: &str, answer: &str, evidence: &[String]) -> String {
    let mut prompt = String::new();
    prompt.push_str("## Question\n");
    prompt.push_str(question.trim());
    prompt.push_str("\n\n## Stated Answer\n");
    prompt.push_str(answer.trim());
    prompt.push_str("\n\n## Evidence Excerpts\n");

    if evidence.is_empty() {
        prompt.push_str(NO_EVIDENCE_MARKER);
        prompt.push('\n');
    }
    for (i, excerpt) in evidence.iter().enumerate() {
        prompt.push_str(&format!("\n[{}]\n{}\n", i + 1, excerpt.trim_end()));
    }

    prompt.push_str("\nReturn the JSON assessment now.");
    prompt
}
