//! Triage agent context shared by every skill and reasoner.

use crate::ai::{AiClient, AiError};
use crate::audit::{AuditLog, MemoryAuditLog};
use crate::error::TriageError;
use crate::notify::{LogNotifier, Notifier};
use crate::patients::{PatientSource, StaticPatientSource};
use log::info;
use std::sync::Arc;
use triage_rs_config::{MemoryProviderKind, TriageConfig};
use triage_rs_memory::{FileMemoryStore, InMemoryStore, MemoryStore};

/// Default node id when none is configured.
pub const DEFAULT_NODE_ID: &str = "clinical-triage";

/// Collaborators and identity for one triage node.
///
/// Cheap to clone; all collaborators are shared.
#[derive(Clone)]
pub struct TriageAgent {
    node_id: String,
    version: String,
    logged_by: String,
    api_key_env: String,
    patients: Arc<dyn PatientSource>,
    memory: Arc<dyn MemoryStore>,
    ai: Option<Arc<dyn AiClient>>,
    notifier: Arc<dyn Notifier>,
    audit: Arc<dyn AuditLog>,
}

impl TriageAgent {
    pub fn builder() -> TriageAgentBuilder {
        TriageAgentBuilder::default()
    }

    /// Build collaborators from config. The AI client is passed in because
    /// it needs credentials the config only names.
    pub fn from_config(
        config: &TriageConfig,
        ai: Option<Arc<dyn AiClient>>,
    ) -> Result<Self, TriageError> {
        let patients = match &config.data.patients_path {
            Some(path) => StaticPatientSource::from_path(path)?,
            None => StaticPatientSource::embedded()?,
        };
        let memory: Arc<dyn MemoryStore> = match config.memory.provider {
            MemoryProviderKind::InMemory => Arc::new(InMemoryStore::new()),
            MemoryProviderKind::File => {
                let path = config.memory.path.as_ref().ok_or_else(|| {
                    TriageError::Config("file memory provider requires memory.path".to_string())
                })?;
                Arc::new(FileMemoryStore::open(path)?)
            }
        };
        let mut builder = TriageAgent::builder()
            .node_id(config.agent.node_id.clone())
            .version(config.agent.version.clone())
            .logged_by(config.logged_by())
            .api_key_env(config.ai.api_key_env())
            .patients(Arc::new(patients))
            .memory(memory);
        if let Some(ai) = ai {
            builder = builder.ai(ai);
        }
        let agent = builder.build();
        info!(
            "triage agent ready (node_id={}, memory={:?}, ai={})",
            agent.node_id,
            config.memory.provider,
            agent.ai.is_some()
        );
        Ok(agent)
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Name recorded on audit entries.
    pub fn logged_by(&self) -> &str {
        &self.logged_by
    }

    pub fn patients(&self) -> &dyn PatientSource {
        self.patients.as_ref()
    }

    pub fn memory(&self) -> &dyn MemoryStore {
        self.memory.as_ref()
    }

    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    pub fn audit(&self) -> &dyn AuditLog {
        self.audit.as_ref()
    }

    /// The AI client, or `NotConfigured` naming the key variable to set.
    pub fn ai(&self) -> Result<&dyn AiClient, AiError> {
        self.ai
            .as_deref()
            .ok_or_else(|| AiError::NotConfigured(self.api_key_env.clone()))
    }

    /// Emit an observability note.
    pub fn note(&self, message: &str, tags: &[&str]) {
        info!(
            "note (node_id={}, tags=[{}]): {}",
            self.node_id,
            tags.join(","),
            message
        );
    }
}

/// Builder for [`TriageAgent`]; unset collaborators get in-process defaults.
#[derive(Default)]
pub struct TriageAgentBuilder {
    node_id: Option<String>,
    version: Option<String>,
    logged_by: Option<String>,
    api_key_env: Option<String>,
    patients: Option<Arc<dyn PatientSource>>,
    memory: Option<Arc<dyn MemoryStore>>,
    ai: Option<Arc<dyn AiClient>>,
    notifier: Option<Arc<dyn Notifier>>,
    audit: Option<Arc<dyn AuditLog>>,
}

impl TriageAgentBuilder {
    pub fn node_id(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Override the audit name; defaults to the node id.
    pub fn logged_by(mut self, logged_by: impl Into<String>) -> Self {
        self.logged_by = Some(logged_by.into());
        self
    }

    /// Environment variable named in `NotConfigured` errors.
    pub fn api_key_env(mut self, api_key_env: impl Into<String>) -> Self {
        self.api_key_env = Some(api_key_env.into());
        self
    }

    pub fn patients(mut self, patients: Arc<dyn PatientSource>) -> Self {
        self.patients = Some(patients);
        self
    }

    pub fn memory(mut self, memory: Arc<dyn MemoryStore>) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn ai(mut self, ai: Arc<dyn AiClient>) -> Self {
        self.ai = Some(ai);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Custom audit log; defaults to one over the agent's memory.
    pub fn audit(mut self, audit: Arc<dyn AuditLog>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Assemble the agent. Without a patient source the agent starts empty.
    pub fn build(self) -> TriageAgent {
        let node_id = self.node_id.unwrap_or_else(|| DEFAULT_NODE_ID.to_string());
        let memory = self
            .memory
            .unwrap_or_else(|| Arc::new(InMemoryStore::new()));
        let audit = self
            .audit
            .unwrap_or_else(|| Arc::new(MemoryAuditLog::new(memory.clone())));
        TriageAgent {
            logged_by: self.logged_by.unwrap_or_else(|| node_id.clone()),
            version: self
                .version
                .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
            api_key_env: self
                .api_key_env
                .unwrap_or_else(|| "OPENAI_API_KEY".to_string()),
            node_id,
            patients: self
                .patients
                .unwrap_or_else(|| Arc::new(StaticPatientSource::default())),
            memory,
            ai: self.ai,
            notifier: self.notifier.unwrap_or_else(|| Arc::new(LogNotifier)),
            audit,
        }
    }
}
