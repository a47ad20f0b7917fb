//! Test helpers shared across triage crates.

pub mod ai;
pub mod llm;
pub mod memory;
pub mod notify;
pub mod records;

pub use ai::{FailingAi, FixedAi, RecordingAi};
pub use llm::{FailingLLM, FixedChatResponse, FixedLLM, RecordingChatLLM};
pub use memory::FailingMemory;
pub use notify::{FailingNotifier, RecordingNotifier};
pub use records::{PatientRecordBuilder, decision_json, decision_value, series, source_of};
