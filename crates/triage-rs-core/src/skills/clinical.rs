//! Clinical reasoners: AI-assisted risk evaluation and the triage workflow.

#[cfg(test)]
use super::patient::names as patient_names;
use super::{Skill, parse_args, patient_args, patient_id_schema, to_output};
use crate::agent::TriageAgent;
use crate::ai::{AiError, AiRequest};
use crate::error::TriageError;
use crate::prompt::{DECISION_SCHEMA_NAME, SYSTEM_INSTRUCTION, evaluation_prompt};
use async_trait::async_trait;
use log::{info, warn};
use serde::Deserialize;
use serde_json::{Value, json};
use triage_rs_protocol::{
    Decision, Echo, EscalationDecision, SkillKind, TriageOutcome, parse_escalation_decision,
};
use uuid::Uuid;

impl TriageAgent {
    /// Echo a message back; works without an AI client.
    pub fn echo(&self, message: &str) -> Echo {
        Echo {
            original: message.to_string(),
            echoed: message.to_string(),
            length: message.chars().count(),
        }
    }

    /// Ask the AI service whether a patient with a stored context should be
    /// escalated. The answer is validated before it is returned.
    pub async fn evaluate_risk(&self, patient_id: &str) -> Result<EscalationDecision, TriageError> {
        let found = self.get_patient_context(patient_id).await?;
        let request = AiRequest::new(SYSTEM_INSTRUCTION, evaluation_prompt(&found.context))
            .with_schema(DECISION_SCHEMA_NAME, EscalationDecision::json_schema());
        let response = self.ai()?.complete(request).await?;
        let decision = parse_escalation_decision(&response.text)
            .inspect_err(|err| {
                warn!("rejected model output (patient_id={patient_id}, error={err})");
            })
            .map_err(AiError::InvalidOutput)?;
        self.note(
            &format!(
                "Patient {patient_id}: {} (risk={}, confidence={})",
                decision.escalation_decision, decision.risk_level, decision.confidence
            ),
            &["clinical", "escalation", decision.risk_level.as_str()],
        );
        Ok(decision)
    }

    /// Store context, evaluate, notify on escalation and log the decision.
    ///
    /// Steps run in order and the first failure aborts the rest.
    pub async fn triage_patient(&self, patient_id: &str) -> Result<TriageOutcome, TriageError> {
        let workflow_id = Uuid::new_v4().to_string();
        self.note(
            &format!("Starting triage workflow for patient {patient_id}"),
            &["workflow", "triage", "start"],
        );

        self.store_patient_context(patient_id).await?;
        let decision = self.evaluate_risk(patient_id).await?;

        let notification_sent = if decision.escalation_decision == Decision::Escalate {
            self.send_notification(
                patient_id,
                decision.escalation_decision,
                decision.risk_level,
                &decision.rationale,
            )
            .await?;
            true
        } else {
            false
        };

        self.log_decision(
            patient_id,
            serde_json::to_value(&decision)?,
            Some(workflow_id.clone()),
        )
        .await?;

        self.note(
            &format!(
                "Triage workflow complete for patient {patient_id}: {}",
                decision.escalation_decision
            ),
            &[
                "workflow",
                "triage",
                "complete",
                decision.risk_level.as_str(),
            ],
        );
        info!(
            "triage complete (patient_id={patient_id}, workflow_id={workflow_id}, notified={notification_sent})"
        );
        Ok(TriageOutcome {
            patient_id: patient_id.to_string(),
            workflow: "complete".to_string(),
            decision,
            notification_sent,
        })
    }
}

#[derive(Debug, Deserialize)]
struct EchoArgs {
    message: String,
}

/// `clinical_echo`.
#[derive(Debug, Default)]
pub struct EchoSkill;

#[async_trait]
impl Skill for EchoSkill {
    fn name(&self) -> &str {
        names::ECHO
    }

    fn description(&self) -> &str {
        "Echo a message back; useful as a connectivity check"
    }

    fn kind(&self) -> SkillKind {
        SkillKind::Reasoner
    }

    fn args_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "message": { "type": "string" } },
            "required": ["message"],
            "additionalProperties": false
        })
    }

    async fn call(&self, agent: &TriageAgent, args: Value) -> Result<Value, TriageError> {
        let args: EchoArgs = parse_args(args)?;
        to_output(&agent.echo(&args.message))
    }
}

/// `clinical_evaluate_risk`.
#[derive(Debug, Default)]
pub struct EvaluateRiskSkill;

#[async_trait]
impl Skill for EvaluateRiskSkill {
    fn name(&self) -> &str {
        names::EVALUATE_RISK
    }

    fn description(&self) -> &str {
        "Evaluate a stored patient context and decide between escalation and monitoring"
    }

    fn kind(&self) -> SkillKind {
        SkillKind::Reasoner
    }

    fn args_schema(&self) -> Value {
        patient_id_schema()
    }

    async fn call(&self, agent: &TriageAgent, args: Value) -> Result<Value, TriageError> {
        let args = patient_args(args)?;
        to_output(&agent.evaluate_risk(&args.patient_id).await?)
    }
}

/// `clinical_triage_patient`.
#[derive(Debug, Default)]
pub struct TriagePatientSkill;

#[async_trait]
impl Skill for TriagePatientSkill {
    fn name(&self) -> &str {
        names::TRIAGE_PATIENT
    }

    fn description(&self) -> &str {
        "Run the full triage workflow: store context, evaluate risk, notify and log"
    }

    fn kind(&self) -> SkillKind {
        SkillKind::Reasoner
    }

    fn args_schema(&self) -> Value {
        patient_id_schema()
    }

    async fn call(&self, agent: &TriageAgent, args: Value) -> Result<Value, TriageError> {
        let args = patient_args(args)?;
        to_output(&agent.triage_patient(&args.patient_id).await?)
    }
}

pub(crate) mod names {
    pub const ECHO: &str = "clinical_echo";
    pub const EVALUATE_RISK: &str = "clinical_evaluate_risk";
    pub const TRIAGE_PATIENT: &str = "clinical_triage_patient";
}

/// Every built-in name, patient skills first.
#[cfg(test)]
pub(crate) fn all_names() -> [&'static str; 9] {
    [
        patient_names::NORMALIZE,
        patient_names::STORE_CONTEXT,
        patient_names::GET_CONTEXT,
        patient_names::SEND_NOTIFICATION,
        patient_names::LOG_DECISION,
        patient_names::DECISION_HISTORY,
        names::ECHO,
        names::EVALUATE_RISK,
        names::TRIAGE_PATIENT,
    ]
}
