//! Key layout for patient-scoped memory entries.

/// Key holding the normalized context for a patient.
pub fn context_key(patient_id: &str) -> String {
    format!("patient:{patient_id}:context")
}

/// Key holding the decision history list for a patient.
pub fn history_key(patient_id: &str) -> String {
    format!("patient:{patient_id}:decision_history")
}
