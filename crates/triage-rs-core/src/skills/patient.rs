//! Deterministic patient skills: normalization, context storage,
//! notification and audit.

use super::{Skill, parse_args, patient_args, patient_id_schema, require_patient_id, to_output};
use crate::agent::TriageAgent;
use crate::error::TriageError;
use crate::trends;
use async_trait::async_trait;
use chrono::Utc;
use log::info;
use serde::Deserialize;
use serde_json::{Value, json};
use triage_rs_memory::{context_key, get_json, set_json};
use triage_rs_protocol::{
    Decision, DecisionHistory, DecisionLogEntry, FoundContext, LoggedDecision, Notification,
    PatientContext, RiskLevel, SkillError, SkillKind, StoredContext,
};

impl TriageAgent {
    /// Normalize a patient's raw record. Nothing is persisted.
    pub fn normalize_patient(&self, patient_id: &str) -> Result<PatientContext, TriageError> {
        trends::normalize_patient(self.patients(), patient_id)
    }

    /// Normalize and store the context under `patient:<id>:context`,
    /// replacing any earlier value.
    pub async fn store_patient_context(
        &self,
        patient_id: &str,
    ) -> Result<StoredContext, TriageError> {
        let context = self.normalize_patient(patient_id)?;
        context.validate()?;
        let memory_key = context_key(patient_id);
        set_json(self.memory(), &memory_key, &context).await?;
        info!("patient context stored (patient_id={patient_id}, key={memory_key})");
        Ok(StoredContext {
            status: "stored".to_string(),
            patient_id: patient_id.to_string(),
            memory_key,
            context,
        })
    }

    /// Read the stored context; `MissingContext` when nothing was stored.
    pub async fn get_patient_context(&self, patient_id: &str) -> Result<FoundContext, TriageError> {
        let memory_key = context_key(patient_id);
        let context: PatientContext = get_json(self.memory(), &memory_key)
            .await?
            .ok_or_else(|| TriageError::missing_context(patient_id))?;
        Ok(FoundContext {
            status: "found".to_string(),
            patient_id: patient_id.to_string(),
            memory_key,
            context,
        })
    }

    /// Notify clinical staff of a decision.
    pub async fn send_notification(
        &self,
        patient_id: &str,
        decision: Decision,
        risk_level: RiskLevel,
        rationale: &str,
    ) -> Result<Notification, TriageError> {
        let pending = Notification::pending(patient_id, decision, risk_level, rationale);
        self.notifier().deliver(pending).await
    }

    /// Append a decision to the patient's audit history.
    pub async fn log_decision(
        &self,
        patient_id: &str,
        decision: Value,
        workflow_id: Option<String>,
    ) -> Result<LoggedDecision, TriageError> {
        let entry = DecisionLogEntry {
            patient_id: patient_id.to_string(),
            decision,
            timestamp: Utc::now(),
            logged_by: self.logged_by().to_string(),
            workflow_id,
        };
        self.audit().append(entry.clone()).await?;
        info!("decision logged (patient_id={patient_id})");
        Ok(LoggedDecision {
            status: "logged".to_string(),
            entry,
        })
    }

    /// Full decision history; empty when nothing was logged.
    pub async fn get_decision_history(
        &self,
        patient_id: &str,
    ) -> Result<DecisionHistory, TriageError> {
        let history = self.audit().history(patient_id).await?;
        Ok(DecisionHistory {
            patient_id: patient_id.to_string(),
            decision_count: history.len(),
            history,
        })
    }
}

/// `patient_normalize_patient`.
#[derive(Debug, Default)]
pub struct NormalizePatientSkill;

#[async_trait]
impl Skill for NormalizePatientSkill {
    fn name(&self) -> &str {
        names::NORMALIZE
    }

    fn description(&self) -> &str {
        "Load a patient record and normalize it into trends, recent labs and a summary"
    }

    fn kind(&self) -> SkillKind {
        SkillKind::Skill
    }

    fn args_schema(&self) -> Value {
        patient_id_schema()
    }

    async fn call(&self, agent: &TriageAgent, args: Value) -> Result<Value, TriageError> {
        let args = patient_args(args)?;
        to_output(&agent.normalize_patient(&args.patient_id)?)
    }
}

/// `patient_store_patient_context`.
#[derive(Debug, Default)]
pub struct StorePatientContextSkill;

#[async_trait]
impl Skill for StorePatientContextSkill {
    fn name(&self) -> &str {
        names::STORE_CONTEXT
    }

    fn description(&self) -> &str {
        "Normalize a patient and store the context in shared memory"
    }

    fn kind(&self) -> SkillKind {
        SkillKind::Skill
    }

    fn args_schema(&self) -> Value {
        patient_id_schema()
    }

    async fn call(&self, agent: &TriageAgent, args: Value) -> Result<Value, TriageError> {
        let args = patient_args(args)?;
        to_output(&agent.store_patient_context(&args.patient_id).await?)
    }
}

/// `patient_get_patient_context`.
#[derive(Debug, Default)]
pub struct GetPatientContextSkill;

#[async_trait]
impl Skill for GetPatientContextSkill {
    fn name(&self) -> &str {
        names::GET_CONTEXT
    }

    fn description(&self) -> &str {
        "Read a stored patient context from shared memory"
    }

    fn kind(&self) -> SkillKind {
        SkillKind::Skill
    }

    fn args_schema(&self) -> Value {
        patient_id_schema()
    }

    async fn call(&self, agent: &TriageAgent, args: Value) -> Result<Value, TriageError> {
        let args = patient_args(args)?;
        to_output(&agent.get_patient_context(&args.patient_id).await?)
    }
}

#[derive(Debug, Deserialize)]
struct NotificationArgs {
    patient_id: String,
    decision: Decision,
    risk_level: RiskLevel,
    rationale: String,
}

/// `patient_send_notification`.
#[derive(Debug, Default)]
pub struct SendNotificationSkill;

#[async_trait]
impl Skill for SendNotificationSkill {
    fn name(&self) -> &str {
        names::SEND_NOTIFICATION
    }

    fn description(&self) -> &str {
        "Send an escalation or monitoring notification to clinical staff"
    }

    fn kind(&self) -> SkillKind {
        SkillKind::Skill
    }

    fn args_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "patient_id": { "type": "string" },
                "decision": { "type": "string", "enum": ["escalate", "monitor"] },
                "risk_level": { "type": "string", "enum": ["low", "medium", "high"] },
                "rationale": { "type": "string" }
            },
            "required": ["patient_id", "decision", "risk_level", "rationale"],
            "additionalProperties": false
        })
    }

    async fn call(&self, agent: &TriageAgent, args: Value) -> Result<Value, TriageError> {
        let args: NotificationArgs = parse_args(args)?;
        require_patient_id(&args.patient_id)?;
        let notification = agent
            .send_notification(
                &args.patient_id,
                args.decision,
                args.risk_level,
                &args.rationale,
            )
            .await?;
        to_output(&notification)
    }
}

#[derive(Debug, Deserialize)]
struct LogDecisionArgs {
    patient_id: String,
    decision: Value,
    #[serde(default)]
    workflow_id: Option<String>,
}

/// `patient_log_decision`.
#[derive(Debug, Default)]
pub struct LogDecisionSkill;

#[async_trait]
impl Skill for LogDecisionSkill {
    fn name(&self) -> &str {
        names::LOG_DECISION
    }

    fn description(&self) -> &str {
        "Append a decision to the patient's audit history"
    }

    fn kind(&self) -> SkillKind {
        SkillKind::Skill
    }

    fn args_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "patient_id": { "type": "string" },
                "decision": { "type": "object" },
                "workflow_id": { "type": "string" }
            },
            "required": ["patient_id", "decision"],
            "additionalProperties": false
        })
    }

    async fn call(&self, agent: &TriageAgent, args: Value) -> Result<Value, TriageError> {
        let args: LogDecisionArgs = parse_args(args)?;
        require_patient_id(&args.patient_id)?;
        if !args.decision.is_object() {
            return Err(
                SkillError::InvalidArguments("decision must be an object".to_string()).into(),
            );
        }
        let logged = agent
            .log_decision(&args.patient_id, args.decision, args.workflow_id)
            .await?;
        to_output(&logged)
    }
}

/// `patient_get_decision_history`.
#[derive(Debug, Default)]
pub struct GetDecisionHistorySkill;

#[async_trait]
impl Skill for GetDecisionHistorySkill {
    fn name(&self) -> &str {
        names::DECISION_HISTORY
    }

    fn description(&self) -> &str {
        "List every logged decision for a patient, oldest first"
    }

    fn kind(&self) -> SkillKind {
        SkillKind::Skill
    }

    fn args_schema(&self) -> Value {
        patient_id_schema()
    }

    async fn call(&self, agent: &TriageAgent, args: Value) -> Result<Value, TriageError> {
        let args = patient_args(args)?;
        to_output(&agent.get_decision_history(&args.patient_id).await?)
    }
}

/// Registered names, `<prefix>_<function>`.
pub(crate) mod names {
    pub const NORMALIZE: &str = "patient_normalize_patient";
    pub const STORE_CONTEXT: &str = "patient_store_patient_context";
    pub const GET_CONTEXT: &str = "patient_get_patient_context";
    pub const SEND_NOTIFICATION: &str = "patient_send_notification";
    pub const LOG_DECISION: &str = "patient_log_decision";
    pub const DECISION_HISTORY: &str = "patient_get_decision_history";
}
