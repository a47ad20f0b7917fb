//! Append-only decision audit trail kept in shared memory.

use crate::error::TriageError;
use async_trait::async_trait;
use log::debug;
use std::sync::Arc;
use triage_rs_memory::{MemoryStore, get_json, history_key, set_json};
use triage_rs_protocol::DecisionLogEntry;

/// Per-patient decision history.
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Append an entry to the patient's history.
    async fn append(&self, entry: DecisionLogEntry) -> Result<(), TriageError>;

    /// All entries for a patient, oldest first; empty when none were logged.
    async fn history(&self, patient_id: &str) -> Result<Vec<DecisionLogEntry>, TriageError>;
}

/// Audit log stored as a JSON list under `patient:<id>:decision_history`.
///
/// Append is read-modify-write; concurrent appends for one patient may lose
/// an entry.
#[derive(Clone)]
pub struct MemoryAuditLog {
    memory: Arc<dyn MemoryStore>,
}

impl MemoryAuditLog {
    pub fn new(memory: Arc<dyn MemoryStore>) -> Self {
        Self { memory }
    }
}

#[async_trait]
impl AuditLog for MemoryAuditLog {
    async fn append(&self, entry: DecisionLogEntry) -> Result<(), TriageError> {
        let key = history_key(&entry.patient_id);
        let mut history: Vec<DecisionLogEntry> =
            get_json(self.memory.as_ref(), &key).await?.unwrap_or_default();
        history.push(entry);
        set_json(self.memory.as_ref(), &key, &history).await?;
        debug!("decision appended (key={}, count={})", key, history.len());
        Ok(())
    }

    async fn history(&self, patient_id: &str) -> Result<Vec<DecisionLogEntry>, TriageError> {
        let key = history_key(patient_id);
        Ok(get_json(self.memory.as_ref(), &key)
            .await?
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::{AuditLog, MemoryAuditLog};
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;
    use triage_rs_memory::InMemoryStore;
    use triage_rs_protocol::DecisionLogEntry;

    fn entry(patient_id: &str, decision: &str) -> DecisionLogEntry {
        DecisionLogEntry {
            patient_id: patient_id.to_string(),
            decision: json!({ "escalation_decision": decision }),
            timestamp: Utc::now(),
            logged_by: "clinical-triage".to_string(),
            workflow_id: None,
        }
    }

    #[tokio::test]
    async fn appends_preserve_order_per_patient() {
        let log = MemoryAuditLog::new(Arc::new(InMemoryStore::new()));
        assert!(log.history("P001").await.expect("history").is_empty());

        log.append(entry("P001", "monitor")).await.expect("append");
        log.append(entry("P002", "monitor")).await.expect("append");
        log.append(entry("P001", "escalate")).await.expect("append");

        let history = log.history("P001").await.expect("history");
        let decisions: Vec<_> = history
            .iter()
            .map(|entry| entry.decision["escalation_decision"].clone())
            .collect();
        assert_eq!(decisions, vec![json!("monitor"), json!("escalate")]);
        assert_eq!(log.history("P002").await.expect("history").len(), 1);
    }
}
