use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Errors returned by skill dispatch and argument handling.
#[derive(Debug, thiserror::Error)]
pub enum SkillError {
    /// Skill name was not found in registry.
    #[error("skill not found: {0}")]
    SkillNotFound(String),
    /// Skill received invalid arguments.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    /// Skill execution failed.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),
}

/// Whether a registered function is deterministic or AI-assisted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SkillKind {
    /// Deterministic; same input always produces the same output.
    Skill,
    /// Delegates judgment to a language-model call.
    Reasoner,
}

/// Skill metadata for discovery and schema presentation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkillSpec {
    /// Fully prefixed skill name, e.g. `patient_normalize_patient`.
    pub name: String,
    /// Skill description.
    pub description: String,
    /// Skill or reasoner.
    pub kind: SkillKind,
    /// JSON schema for the `input` object.
    pub args_schema: Value,
}
