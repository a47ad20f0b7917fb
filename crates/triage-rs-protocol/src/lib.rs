//! Wire types shared by the triage skills, reasoners, and HTTP host.

mod results;
mod skill;
mod validation;

pub use results::{
    DecisionHistory, Echo, FoundContext, LoggedDecision, StoredContext, TriageOutcome,
};
pub use skill::{SkillError, SkillKind, SkillSpec};
pub use validation::{
    MAX_PATIENT_AGE, ValidationError, escalation_decision_from_value, parse_escalation_decision,
    validate_confidence,
};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Patient identifier as used by the data source and memory keys.
pub type PatientId = String;

/// Direction of a measurement derived from its two most recent samples.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Increasing => "increasing",
            TrendDirection::Decreasing => "decreasing",
            TrendDirection::Stable => "stable",
        }
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized patient data stored in shared memory and fed to the reasoner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientContext {
    /// Unique patient identifier.
    pub patient_id: PatientId,
    /// Patient age in years.
    pub age: u32,
    /// Known medical conditions.
    #[serde(default)]
    pub conditions: Vec<String>,
    /// Current medications.
    #[serde(default)]
    pub medications: Vec<String>,
    /// Most recent value per lab, e.g. `{"CRP": 12.5}`, in source order.
    #[serde(default)]
    pub recent_labs: IndexMap<String, f64>,
    /// Trend direction per vital, e.g. `{"heart_rate": "increasing"}`, in source order.
    #[serde(default)]
    pub vital_trends: IndexMap<String, TrendDirection>,
    /// Human-readable summary of concerning trends.
    #[serde(default)]
    pub trend_summary: String,
}

impl PatientContext {
    /// Check invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.age > MAX_PATIENT_AGE {
            return Err(ValidationError::OutOfRange {
                field: "age".to_string(),
                value: f64::from(self.age),
                min: 0.0,
                max: f64::from(MAX_PATIENT_AGE),
            });
        }
        Ok(())
    }
}

/// Outcome of the clinical reasoner.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Escalate to clinical review.
    Escalate,
    /// Continue routine monitoring.
    Monitor,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Escalate => "escalate",
            Decision::Monitor => "monitor",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Decision {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "escalate" => Ok(Decision::Escalate),
            "monitor" => Ok(Decision::Monitor),
            other => Err(ValidationError::UnknownVariant {
                field: "escalation_decision".to_string(),
                value: other.to_string(),
                expected: "escalate, monitor",
            }),
        }
    }
}

/// Overall risk assessment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            other => Err(ValidationError::UnknownVariant {
                field: "risk_level".to_string(),
                value: other.to_string(),
                expected: "low, medium, high",
            }),
        }
    }
}

/// Structured output expected from the AI judgment service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EscalationDecision {
    /// Whether to escalate to clinical review or continue monitoring.
    pub escalation_decision: Decision,
    /// Overall risk assessment.
    pub risk_level: RiskLevel,
    /// Confidence in this assessment, within `0.0..=1.0`.
    pub confidence: f64,
    /// Brief explanation grounded in patient data.
    pub rationale: String,
    /// Key factors that influenced this decision.
    #[serde(default)]
    pub contributing_factors: Vec<String>,
}

impl EscalationDecision {
    /// JSON schema handed to the AI client for structured output.
    pub fn json_schema() -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "escalation_decision": {
                    "type": "string",
                    "enum": ["escalate", "monitor"],
                    "description": "Whether to escalate to clinical review or continue monitoring"
                },
                "risk_level": {
                    "type": "string",
                    "enum": ["low", "medium", "high"],
                    "description": "Overall risk assessment"
                },
                "confidence": {
                    "type": "number",
                    "minimum": 0.0,
                    "maximum": 1.0,
                    "description": "Confidence in this assessment (0.0-1.0)"
                },
                "rationale": {
                    "type": "string",
                    "description": "Brief explanation grounded in patient data"
                },
                "contributing_factors": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Key factors that influenced this decision"
                }
            },
            "required": [
                "escalation_decision",
                "risk_level",
                "confidence",
                "rationale",
                "contributing_factors"
            ],
            "additionalProperties": false
        })
    }

    /// Check invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_confidence(self.confidence)
    }
}

/// Kind of notification sent to clinical staff.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    ClinicalEscalation,
    MonitoringUpdate,
}

impl From<Decision> for NotificationKind {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Escalate => NotificationKind::ClinicalEscalation,
            Decision::Monitor => NotificationKind::MonitoringUpdate,
        }
    }
}

/// Delivery status reported by the notification sink.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Failed,
}

/// Notification payload and delivery record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    /// Notification type used for routing on the receiving side.
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Patient being notified about.
    pub patient_id: PatientId,
    /// Risk level for prioritization.
    pub risk_level: RiskLevel,
    /// Notification message content.
    pub message: String,
    /// Creation timestamp.
    pub timestamp: DateTime<Utc>,
    /// Delivery status.
    pub status: DeliveryStatus,
}

impl Notification {
    /// Build a pending notification for a decision.
    pub fn pending(
        patient_id: impl Into<PatientId>,
        decision: Decision,
        risk_level: RiskLevel,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind: decision.into(),
            patient_id: patient_id.into(),
            risk_level,
            message: message.into(),
            timestamp: Utc::now(),
            status: DeliveryStatus::Pending,
        }
    }
}

/// Audit log entry for a clinical decision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecisionLogEntry {
    /// Patient the decision was made for.
    pub patient_id: PatientId,
    /// The decision payload as produced by the caller.
    pub decision: Value,
    /// Time the entry was logged.
    pub timestamp: DateTime<Utc>,
    /// Agent that logged this decision.
    pub logged_by: String,
    /// Workflow id for traceability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn trend_direction_serializes_lowercase() {
        let value = serde_json::to_value(TrendDirection::Increasing).expect("serialize");
        assert_eq!(value, json!("increasing"));
        assert_eq!(TrendDirection::Stable.to_string(), "stable");
    }

    #[test]
    fn notification_kind_follows_decision() {
        let notification =
            Notification::pending("P001", Decision::Escalate, RiskLevel::High, "rising CRP");
        let value = serde_json::to_value(&notification).expect("serialize");
        assert_eq!(value["type"], json!("CLINICAL_ESCALATION"));
        assert_eq!(value["status"], json!("pending"));

        let monitor = Notification::pending("P002", Decision::Monitor, RiskLevel::Low, "ok");
        assert_eq!(monitor.kind, NotificationKind::MonitoringUpdate);
    }

    #[test]
    fn unknown_risk_level_is_rejected() {
        let err = "critical".parse::<RiskLevel>().unwrap_err();
        assert!(err.to_string().contains("risk_level"));
        assert_eq!("medium".parse::<RiskLevel>().expect("parse"), RiskLevel::Medium);
    }

    #[test]
    fn context_age_is_bounded() {
        let mut context = PatientContext {
            patient_id: "P001".to_string(),
            age: 68,
            conditions: Vec::new(),
            medications: Vec::new(),
            recent_labs: IndexMap::new(),
            vital_trends: IndexMap::new(),
            trend_summary: String::new(),
        };
        assert!(context.validate().is_ok());
        context.age = 151;
        assert!(context.validate().is_err());
    }

    /// Strict structured output rejects schemas with optional properties.
    #[test]
    fn decision_schema_requires_every_property() {
        let schema = EscalationDecision::json_schema();
        let properties = schema["properties"].as_object().expect("properties");
        let required: Vec<&str> = schema["required"]
            .as_array()
            .expect("required")
            .iter()
            .filter_map(Value::as_str)
            .collect();
        for key in properties.keys() {
            assert!(required.contains(&key.as_str()), "{key} is not required");
        }
        assert_eq!(required.len(), properties.len());
        assert_eq!(schema["additionalProperties"], json!(false));
    }

    #[test]
    fn context_maps_keep_source_order() {
        let context: PatientContext = serde_json::from_value(json!({
            "patient_id": "P001",
            "age": 68,
            "recent_labs": {"WBC": 12000.0, "CRP": 12.5},
            "vital_trends": {"systolic_bp": "decreasing", "heart_rate": "increasing"}
        }))
        .expect("context");
        let labs: Vec<&str> = context.recent_labs.keys().map(String::as_str).collect();
        let vitals: Vec<&str> = context.vital_trends.keys().map(String::as_str).collect();
        assert_eq!(labs, vec!["WBC", "CRP"]);
        assert_eq!(vitals, vec!["systolic_bp", "heart_rate"]);

        let text = serde_json::to_string(&context.vital_trends).expect("serialize");
        assert_eq!(text, r#"{"systolic_bp":"decreasing","heart_rate":"increasing"}"#);
    }

    #[test]
    fn log_entry_omits_missing_workflow_id() {
        let entry = DecisionLogEntry {
            patient_id: "P001".to_string(),
            decision: json!({"escalation_decision": "escalate"}),
            timestamp: Utc::now(),
            logged_by: "clinical-triage".to_string(),
            workflow_id: None,
        };
        let value = serde_json::to_value(&entry).expect("serialize");
        assert!(value.get("workflow_id").is_none());
    }
}
