//! Prompt text for the risk evaluation reasoner.

use indexmap::IndexMap;
use std::fmt::Display;
use triage_rs_protocol::PatientContext;

/// System instruction sent with every risk evaluation.
pub const SYSTEM_INSTRUCTION: &str = "You are a clinical decision support system that prioritizes patient safety. Always respond with valid JSON.";

/// Name of the structured output schema.
pub const DECISION_SCHEMA_NAME: &str = "EscalationDecision";

fn render_map<V: Display>(map: &IndexMap<String, V>) -> String {
    if map.is_empty() {
        return "none".to_string();
    }
    map.iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_list(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

/// Build the user prompt asking for an escalation decision.
pub fn evaluation_prompt(context: &PatientContext) -> String {
    format!(
        "You are a clinical decision support system. Your role is to evaluate whether a patient
should be escalated for immediate clinical review or continue routine monitoring.

You do NOT diagnose. You do NOT prescribe treatment.
You ONLY prioritize clinical attention.

Patient Context:
- Age: {age}
- Conditions: {conditions}
- Medications: {medications}
- Recent Lab Values: {labs}
- Vital Trends: {vitals}
- Trend Summary: {summary}

Based on this information, evaluate:
1. Should this patient be escalated for clinical review or continue monitoring?
2. What is the risk level (low/medium/high)?
3. How confident are you in this assessment (0.0-1.0)?
4. What factors contributed to this decision?

Respond with JSON matching this structure:
{{
    \"escalation_decision\": \"escalate\" or \"monitor\",
    \"risk_level\": \"low\" or \"medium\" or \"high\",
    \"confidence\": 0.0 to 1.0,
    \"rationale\": \"explanation of decision\",
    \"contributing_factors\": [\"factor1\", \"factor2\", ...]
}}

Be conservative: when uncertain, prefer escalation over missing a deteriorating patient.
",
        age = context.age,
        conditions = render_list(&context.conditions),
        medications = render_list(&context.medications),
        labs = render_map(&context.recent_labs),
        vitals = render_map(&context.vital_trends),
        summary = context.trend_summary,
    )
}
