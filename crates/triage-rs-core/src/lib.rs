//! Core triage primitives.
//!
//! This crate owns patient normalization, the skill and reasoner set, and the
//! agent context they run against. The server and CLI build on it.

pub mod agent;
pub mod ai;
pub mod audit;
pub mod error;
pub mod notify;
pub mod patients;
pub mod prompt;
pub mod skills;
pub mod trends;

pub use agent::{DEFAULT_NODE_ID, TriageAgent, TriageAgentBuilder};
pub use ai::{AiClient, AiError, AiRequest, AiResponse, LlmAiClient, ResponseSchema};
pub use audit::{AuditLog, MemoryAuditLog};
pub use error::TriageError;
pub use notify::{LogNotifier, Notifier};
pub use patients::{PatientRecord, PatientSource, RawSeries, StaticPatientSource};
/// Skill dispatch used by the HTTP host and CLI.
pub use skills::{
    CLINICAL_PREFIX, PATIENT_PREFIX, Skill, SkillRegistry, builtin_skill_registry,
    register_builtin_skills, resolve_target,
};
pub use trends::{normalize_patient, normalize_record, trend_direction};
