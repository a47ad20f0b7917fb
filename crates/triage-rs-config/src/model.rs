//! Configuration schema for the triage agent.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root config for the triage agent.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TriageConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

impl TriageConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> TriageConfigBuilder {
        TriageConfigBuilder::new()
    }

    /// Name recorded as `logged_by` on audit entries.
    pub fn logged_by(&self) -> &str {
        self.audit
            .logged_by
            .as_deref()
            .unwrap_or(self.agent.node_id.as_str())
    }
}

/// Builder for assembling a `TriageConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct TriageConfigBuilder {
    config: TriageConfig,
}

impl TriageConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: TriageConfig::default(),
        }
    }

    /// Replace the agent identity and bind settings.
    pub fn agent(mut self, agent: AgentConfig) -> Self {
        self.config.agent = agent;
        self
    }

    /// Set only the node id.
    pub fn node_id(mut self, node_id: impl Into<String>) -> Self {
        self.config.agent.node_id = node_id.into();
        self
    }

    /// Replace the AI client configuration.
    pub fn ai(mut self, ai: AiConfig) -> Self {
        self.config.ai = ai;
        self
    }

    /// Replace the patient data configuration.
    pub fn data(mut self, data: DataConfig) -> Self {
        self.config.data = data;
        self
    }

    /// Replace the memory configuration.
    pub fn memory(mut self, memory: MemoryConfig) -> Self {
        self.config.memory = memory;
        self
    }

    /// Replace the audit configuration.
    pub fn audit(mut self, audit: AuditConfig) -> Self {
        self.config.audit = audit;
        self
    }

    /// Finalize and return the built `TriageConfig`.
    pub fn build(self) -> TriageConfig {
        self.config
    }
}

/// Agent identity and HTTP bind settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentConfig {
    /// Node id; HTTP targets are `<node_id>.<skill>`.
    #[serde(default = "default_node_id")]
    pub node_id: String,
    #[serde(default = "default_agent_version")]
    pub version: String,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            version: default_agent_version(),
            bind_addr: default_bind_addr(),
        }
    }
}

fn default_node_id() -> String {
    "clinical-triage".to_string()
}

fn default_agent_version() -> String {
    "1.0.0".to_string()
}

fn default_bind_addr() -> String {
    "127.0.0.1:8001".to_string()
}

/// Hosted language-model provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AiProviderKind {
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
    Groq,
}

impl AiProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AiProviderKind::OpenAi => "openai",
            AiProviderKind::Groq => "groq",
        }
    }

    /// Environment variable the provider's key is read from by default.
    pub fn default_api_key_env(&self) -> &'static str {
        match self {
            AiProviderKind::OpenAi => "OPENAI_API_KEY",
            AiProviderKind::Groq => "GROQ_API_KEY",
        }
    }
}

/// Language-model settings for the reasoners.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AiConfig {
    #[serde(default)]
    pub provider: AiProviderKind,
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the provider API key; the provider's
    /// conventional variable when unset.
    #[serde(default)]
    pub api_key_env: Option<String>,
    /// Sampling temperature; kept low so clinical judgments stay repeatable.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Upper bound on tokens generated per judgment.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl AiConfig {
    /// Resolved key variable name.
    pub fn api_key_env(&self) -> &str {
        self.api_key_env
            .as_deref()
            .unwrap_or(self.provider.default_api_key_env())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: AiProviderKind::default(),
            model: default_model(),
            api_key_env: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    4096
}

/// Patient data source settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DataConfig {
    /// JSON file with patient records; the bundled dataset is used when unset.
    #[serde(default)]
    pub patients_path: Option<PathBuf>,
}

/// Backend for the shared key-value memory.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MemoryProviderKind {
    #[default]
    InMemory,
    File,
}

/// Shared memory settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct MemoryConfig {
    #[serde(default)]
    pub provider: MemoryProviderKind,
    /// Backing file for the `file` provider.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Audit log settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AuditConfig {
    /// Overrides the node id recorded on log entries.
    #[serde(default)]
    pub logged_by: Option<String>,
}
