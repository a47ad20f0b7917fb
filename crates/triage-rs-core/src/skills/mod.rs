//! Skills (deterministic) and reasoners (AI-assisted) exposed by the agent.
//!
//! Each function exists twice: as a typed method on [`TriageAgent`] for
//! in-process callers, and as a [`Skill`] that decodes JSON arguments for the
//! HTTP host and CLI.

mod clinical;
mod patient;
mod registry;

use crate::agent::TriageAgent;
use crate::error::TriageError;
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt::Debug;
use triage_rs_protocol::{SkillError, SkillKind, SkillSpec};

pub use clinical::{EchoSkill, EvaluateRiskSkill, TriagePatientSkill};
pub use patient::{
    GetDecisionHistorySkill, GetPatientContextSkill, LogDecisionSkill, NormalizePatientSkill,
    SendNotificationSkill, StorePatientContextSkill,
};
pub use registry::{
    SkillRegistry, builtin_skill_registry, register_builtin_skills, resolve_target,
};

/// Router prefix for deterministic patient skills.
pub const PATIENT_PREFIX: &str = "patient";
/// Router prefix for clinical reasoners.
pub const CLINICAL_PREFIX: &str = "clinical";

/// A named function callable with a JSON `input` object.
#[async_trait]
pub trait Skill: Send + Sync + Debug {
    /// Fully prefixed name, e.g. `patient_normalize_patient`.
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn kind(&self) -> SkillKind;
    /// JSON schema for the `input` object.
    fn args_schema(&self) -> Value;

    /// Run against an agent with raw JSON arguments.
    async fn call(&self, agent: &TriageAgent, args: Value) -> Result<Value, TriageError>;

    fn spec(&self) -> SkillSpec {
        SkillSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            kind: self.kind(),
            args_schema: self.args_schema(),
        }
    }
}

/// Parse JSON arguments into a typed struct.
pub(crate) fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, SkillError> {
    serde_json::from_value(args).map_err(|err| SkillError::InvalidArguments(err.to_string()))
}

/// Reject blank patient ids before they reach memory keys.
pub(crate) fn require_patient_id(patient_id: &str) -> Result<(), SkillError> {
    if patient_id.trim().is_empty() {
        return Err(SkillError::InvalidArguments(
            "patient_id cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Arguments of skills that take only a patient id.
#[derive(Debug, Deserialize)]
pub(crate) struct PatientArgs {
    pub(crate) patient_id: String,
}

/// Parse and check a `{"patient_id": ...}` argument object.
pub(crate) fn patient_args(args: Value) -> Result<PatientArgs, SkillError> {
    let args: PatientArgs = parse_args(args)?;
    require_patient_id(&args.patient_id)?;
    Ok(args)
}

/// Serialize a typed result for the JSON surface.
pub(crate) fn to_output<T: serde::Serialize>(value: &T) -> Result<Value, TriageError> {
    Ok(serde_json::to_value(value)?)
}

/// Schema for skills taking only a patient id.
pub(crate) fn patient_id_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "patient_id": { "type": "string", "description": "Patient identifier, e.g. P001" }
        },
        "required": ["patient_id"],
        "additionalProperties": false
    })
}
