//! Boundary validation for values entering from callers or the AI service.

use crate::{Decision, EscalationDecision, RiskLevel};
use serde_json::Value;

/// Upper bound for a plausible patient age in years.
pub const MAX_PATIENT_AGE: u32 = 150;

/// Errors raised when external input violates a closed set or a range.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// A field holds a value outside its permitted literals.
    #[error("invalid {field}: {value:?} (expected one of: {expected})")]
    UnknownVariant {
        field: String,
        value: String,
        expected: &'static str,
    },
    /// A numeric field is outside its permitted range.
    #[error("{field} out of range: {value} (expected {min}..={max})")]
    OutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },
    /// A required field is absent or has the wrong type.
    #[error("missing or invalid field: {0}")]
    MissingField(String),
    /// The payload could not be decoded at all.
    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// Reject confidences outside `0.0..=1.0` (NaN included).
pub fn validate_confidence(confidence: f64) -> Result<(), ValidationError> {
    if (0.0..=1.0).contains(&confidence) {
        return Ok(());
    }
    Err(ValidationError::OutOfRange {
        field: "confidence".to_string(),
        value: confidence,
        min: 0.0,
        max: 1.0,
    })
}

/// Parse and validate an escalation decision from raw model output.
///
/// Accepts bare JSON or JSON wrapped in a fenced code block.
pub fn parse_escalation_decision(text: &str) -> Result<EscalationDecision, ValidationError> {
    let body = strip_code_fence(text);
    let value: Value =
        serde_json::from_str(body).map_err(|err| ValidationError::Malformed(err.to_string()))?;
    escalation_decision_from_value(value)
}

/// Validate an already-decoded JSON value as an escalation decision.
pub fn escalation_decision_from_value(
    value: Value,
) -> Result<EscalationDecision, ValidationError> {
    let Value::Object(map) = &value else {
        return Err(ValidationError::Malformed(
            "expected a JSON object".to_string(),
        ));
    };
    let decision = required_str(map, "escalation_decision")?;
    decision.parse::<Decision>()?;
    let risk = required_str(map, "risk_level")?;
    risk.parse::<RiskLevel>()?;
    let confidence = map
        .get("confidence")
        .and_then(Value::as_f64)
        .ok_or_else(|| ValidationError::MissingField("confidence".to_string()))?;
    validate_confidence(confidence)?;

    let parsed: EscalationDecision =
        serde_json::from_value(value).map_err(|err| ValidationError::Malformed(err.to_string()))?;
    parsed.validate()?;
    Ok(parsed)
}

fn required_str<'a>(
    map: &'a serde_json::Map<String, Value>,
    field: &str,
) -> Result<&'a str, ValidationError> {
    map.get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| ValidationError::MissingField(field.to_string()))
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
