//! Response bodies returned by the patient skills and clinical reasoners.

use crate::{DecisionLogEntry, EscalationDecision, PatientContext, PatientId};
use serde::{Deserialize, Serialize};

/// Result of persisting a normalized context.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredContext {
    /// Always `"stored"`.
    pub status: String,
    pub patient_id: PatientId,
    pub memory_key: String,
    pub context: PatientContext,
}

/// Result of reading a stored context.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FoundContext {
    /// Always `"found"`.
    pub status: String,
    pub patient_id: PatientId,
    pub memory_key: String,
    pub context: PatientContext,
}

/// Result of appending to the decision history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggedDecision {
    /// Always `"logged"`.
    pub status: String,
    pub entry: DecisionLogEntry,
}

/// Decision history for one patient, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecisionHistory {
    pub patient_id: PatientId,
    pub decision_count: usize,
    pub history: Vec<DecisionLogEntry>,
}

/// Output of the echo reasoner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Echo {
    pub original: String,
    pub echoed: String,
    /// Length in characters, not bytes.
    pub length: usize,
}

/// Outcome of the end-to-end triage workflow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TriageOutcome {
    pub patient_id: PatientId,
    /// Always `"complete"`.
    pub workflow: String,
    pub decision: EscalationDecision,
    pub notification_sent: bool,
}
