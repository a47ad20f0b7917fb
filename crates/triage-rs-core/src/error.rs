//! Error types for the triage core crate.

use crate::ai::AiError;
use thiserror::Error;
use triage_rs_memory::MemoryError;
use triage_rs_protocol::{SkillError, ValidationError};

/// Errors returned by normalization, skills and reasoners.
#[derive(Debug, Error)]
pub enum TriageError {
    /// Patient id is unknown to the data source.
    #[error("patient {patient_id} not found")]
    NotFound { patient_id: String },
    /// No normalized context has been stored for the patient.
    #[error("no context found for patient {patient_id}; run store_patient_context first")]
    MissingContext { patient_id: String },
    /// Skill dispatch or argument decoding failed.
    #[error(transparent)]
    Skill(#[from] SkillError),
    /// Caller input failed boundary validation.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    /// Shared memory failed.
    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),
    /// AI judgment service failed.
    #[error("ai error: {0}")]
    Ai(#[from] AiError),
    /// Notification delivery failed.
    #[error("notification failed: {0}")]
    Notify(String),
    /// Stored or loaded JSON did not match the expected shape.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
    /// Collaborators could not be built from the given config.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// Reading patient data from disk failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl TriageError {
    pub(crate) fn not_found(patient_id: &str) -> Self {
        TriageError::NotFound {
            patient_id: patient_id.to_string(),
        }
    }

    pub(crate) fn missing_context(patient_id: &str) -> Self {
        TriageError::MissingContext {
            patient_id: patient_id.to_string(),
        }
    }
}
