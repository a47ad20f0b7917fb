//! Public SDK surface for the clinical triage agent.
//!
//! This crate re-exports the building blocks and provides the setup helpers
//! shared by the `triage` binary and embedders.

/// Re-export for convenience.
pub use triage_rs_config as config;
pub use triage_rs_core as core;
/// Re-export for convenience.
pub use triage_rs_memory as memory;
/// Re-export for convenience.
pub use triage_rs_protocol as protocol;
pub use triage_rs_server as server;

use directories::BaseDirs;
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use triage_rs_config::{MemoryProviderKind, TriageConfig};
use triage_rs_core::{AiClient, AiError, LlmAiClient, TriageAgent, TriageError};

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
///
/// This is a no-op if the feature is not enabled. Binaries are still expected
/// to call this early in startup to ensure log output is wired up.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::builder()
            .format_timestamp_millis()
            .parse_default_env()
            .try_init();
    }
}

/// File name of the memory document used by one-shot CLI commands.
pub const CLI_MEMORY_FILE: &str = "memory.json";

/// Memory document for CLI runs: `~/.triage/memory.json`, or `.triage/` under
/// `cwd` when no home directory is known.
pub fn default_memory_path(cwd: &Path) -> PathBuf {
    let base = BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .unwrap_or_else(|| cwd.to_path_buf());
    base.join(".triage").join(CLI_MEMORY_FILE)
}

/// Back an in-memory store with `path` so separate CLI invocations share
/// contexts and history. Returns whether the config changed.
pub fn persist_cli_memory(config: &mut TriageConfig, path: PathBuf) -> bool {
    if config.memory.provider != MemoryProviderKind::InMemory {
        return false;
    }
    info!("using file memory for cli (path={})", path.display());
    config.memory.provider = MemoryProviderKind::File;
    config.memory.path = Some(path);
    true
}

/// Build the AI client named by `config.ai`.
///
/// Returns `None` when the key variable is unset so that commands without AI
/// still work; reasoners then fail with `NotConfigured`.
pub fn ai_client_from_env(config: &TriageConfig) -> Result<Option<Arc<dyn AiClient>>, AiError> {
    match LlmAiClient::from_config(&config.ai) {
        Ok(client) => {
            info!(
                "ai client configured (provider={}, model={})",
                config.ai.provider.as_str(),
                config.ai.model
            );
            let client: Arc<dyn AiClient> = Arc::new(client);
            Ok(Some(client))
        }
        Err(AiError::NotConfigured(var)) => {
            warn!("{var} is not set; reasoners are unavailable");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// Build an agent from config, attaching an AI client when credentials exist.
pub fn agent_from_config(config: &TriageConfig) -> Result<TriageAgent, TriageError> {
    let ai = ai_client_from_env(config)?;
    TriageAgent::from_config(config, ai)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;
    use triage_rs_config::{AiConfig, MemoryConfig};

    #[test]
    fn missing_key_leaves_ai_unset() {
        let config = TriageConfig::builder()
            .ai(AiConfig {
                api_key_env: Some("TRIAGE_TEST_UNSET_KEY_41C7".to_string()),
                ..AiConfig::default()
            })
            .build();
        let agent = agent_from_config(&config).expect("agent");
        let err = match agent.ai() {
            Ok(_) => panic!("ai should be unset"),
            Err(err) => err,
        };
        assert_eq!(
            err.to_string(),
            "ai client not configured (set TRIAGE_TEST_UNSET_KEY_41C7)"
        );
        assert_eq!(agent.patients().ids().len(), 3);
    }

    /// Contexts stored by one CLI run are visible to the next.
    #[tokio::test]
    async fn cli_memory_survives_between_runs() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join(".triage").join(CLI_MEMORY_FILE);

        let mut config = TriageConfig::default();
        assert!(persist_cli_memory(&mut config, path.clone()));
        assert_eq!(config.memory.provider, MemoryProviderKind::File);
        assert_eq!(config.memory.path.as_deref(), Some(path.as_path()));

        let first = agent_from_config(&config).expect("first run");
        first.store_patient_context("P001").await.expect("store");
        drop(first);

        let second = agent_from_config(&config).expect("second run");
        let found = second.get_patient_context("P001").await.expect("context");
        assert_eq!(found.status, "found");
        assert_eq!(found.context.patient_id, "P001");
    }

    /// An explicit memory provider is left alone.
    #[test]
    fn configured_file_memory_is_kept() {
        let mut config = TriageConfig::builder()
            .memory(MemoryConfig {
                provider: MemoryProviderKind::File,
                path: Some(PathBuf::from("ward.json")),
            })
            .build();
        assert!(!persist_cli_memory(&mut config, PathBuf::from("other.json")));
        assert_eq!(config.memory.path, Some(PathBuf::from("ward.json")));
    }

    #[test]
    fn default_memory_path_ends_in_triage_dir() {
        let path = default_memory_path(Path::new("/work"));
        assert!(path.ends_with(Path::new(".triage").join(CLI_MEMORY_FILE)));
    }
}
