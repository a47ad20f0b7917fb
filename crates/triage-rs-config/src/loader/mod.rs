//! Layered configuration loader.
//!
//! Discovers configuration layers (system, user, project, cwd, runtime),
//! validates each against the schema, deep-merges them in precedence order
//! and produces the final `TriageConfig`.

mod layer_io;
mod merge;
mod schema;
mod utils;


use crate::{ConfigError, MemoryProviderKind, TriageConfig};
use log::{debug, info};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Default config filename in local layers.
const DEFAULT_CONFIG_FILE: &str = "triage.json5";
/// Default config directory under the user's home.
const DEFAULT_CONFIG_DIR: &str = ".triage";
/// Marker files/dirs that identify a project root.
const DEFAULT_PROJECT_ROOT_MARKERS: &[&str] = &[".git"];

#[cfg(unix)]
/// Default system config path on Unix.
const SYSTEM_CONFIG_PATH: &str = "/etc/triage/triage.json5";
#[cfg(windows)]
/// Default system config path on Windows.
const SYSTEM_CONFIG_PATH: &str = "C:\\ProgramData\\triage\\triage.json5";

/// Effective config plus metadata about which layers were loaded.
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    /// The merged, validated config.
    pub config: TriageConfig,
    /// Metadata for each layer that contributed.
    pub layers: Vec<ConfigLayer>,
}

/// Origin for a single config layer in the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayerSource {
    /// System-wide configuration.
    System,
    /// User-specific configuration.
    User,
    /// Project root configuration.
    Project,
    /// Current working directory configuration.
    Cwd,
    /// Runtime overrides (highest precedence).
    Runtime,
}

/// Metadata about a loaded config layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigLayer {
    /// Layer origin.
    pub source: ConfigLayerSource,
    /// Location on disk.
    pub path: PathBuf,
}

/// Options controlling layered config discovery and overrides.
#[derive(Debug, Clone)]
pub struct LayeredConfigOptions {
    /// Working directory used to find local layers.
    pub cwd: PathBuf,
    /// Optional system config path (defaults to `/etc/triage/triage.json5` on Unix).
    pub system_config_path: Option<PathBuf>,
    /// Optional user config path (defaults to `~/.triage/triage.json5`).
    pub user_config_path: Option<PathBuf>,
    /// Runtime override config paths applied last.
    pub runtime_paths: Vec<PathBuf>,
    /// Marker files/dirs used to detect the project root.
    pub project_root_markers: Vec<String>,
}

impl LayeredConfigOptions {
    /// Create options with default layer locations for the provided cwd.
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
            system_config_path: layer_io::default_system_config_path(),
            user_config_path: layer_io::default_user_config_path(),
            runtime_paths: Vec::new(),
            project_root_markers: DEFAULT_PROJECT_ROOT_MARKERS
                .iter()
                .map(|marker| marker.to_string())
                .collect(),
        }
    }

    /// Add a runtime override config path that is applied last.
    pub fn with_runtime_path(mut self, path: impl AsRef<Path>) -> Self {
        self.runtime_paths.push(path.as_ref().to_path_buf());
        self
    }
}

impl TriageConfig {
    /// Load a single config from a path (no layering).
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        info!("loading config from path: {}", path.as_ref().display());
        let contents = fs::read_to_string(path)?;
        let value: Value = json5::from_str(&contents)?;
        config_from_value(value, "config")
    }

    /// Load a single config from JSON5 contents (no layering).
    pub fn load_from_str(contents: &str) -> Result<Self, ConfigError> {
        debug!("loading config from raw contents (len={})", contents.len());
        let value: Value = json5::from_str(contents)?;
        config_from_value(value, "config")
    }

    /// Load a layered config stack using the default layer locations.
    pub fn load_layered(cwd: impl AsRef<Path>) -> Result<LayeredConfig, ConfigError> {
        info!(
            "loading layered config with defaults (cwd={})",
            cwd.as_ref().display()
        );
        Self::load_layered_with_options(LayeredConfigOptions::new(cwd))
    }

    /// Load a layered config stack using explicit layer locations.
    ///
    /// Layer precedence (low -> high): system, user, project, cwd, runtime.
    pub fn load_layered_with_options(
        options: LayeredConfigOptions,
    ) -> Result<LayeredConfig, ConfigError> {
        let cwd = utils::normalize_path(&options.cwd)?;
        debug!("normalized cwd for config load: {}", cwd.display());
        let mut loaded = Vec::new();
        let mut seen_paths = HashSet::new();

        for (source, path) in [
            (
                ConfigLayerSource::System,
                options.system_config_path.clone(),
            ),
            (ConfigLayerSource::User, options.user_config_path.clone()),
        ] {
            if let Some(path) = path {
                push_optional(source, path, &mut loaded, &mut seen_paths)?;
            }
        }

        match utils::find_project_root(&cwd, &options.project_root_markers) {
            Some(project_root) => {
                debug!("resolved project root: {}", project_root.display());
                push_optional(
                    ConfigLayerSource::Project,
                    project_root.join(DEFAULT_CONFIG_FILE),
                    &mut loaded,
                    &mut seen_paths,
                )?;
            }
            None => debug!("project root not found; skipping project layer"),
        }
        push_optional(
            ConfigLayerSource::Cwd,
            cwd.join(DEFAULT_CONFIG_FILE),
            &mut loaded,
            &mut seen_paths,
        )?;

        for runtime_path in &options.runtime_paths {
            let layer = layer_io::load_required_layer(ConfigLayerSource::Runtime, runtime_path)?;
            debug!("loaded runtime layer (path={})", runtime_path.display());
            loaded.push(layer);
        }

        let mut merged = Value::Object(serde_json::Map::new());
        for layer in &loaded {
            merge::merge_json_values(&mut merged, &layer.value);
        }

        let config = config_from_value(merged, "effective")?;
        let layers: Vec<ConfigLayer> = loaded.into_iter().map(|layer| layer.meta).collect();
        info!("layered config loaded (layers={})", layers.len());
        Ok(LayeredConfig { config, layers })
    }

    /// Validate configuration invariants that cannot be expressed in serde.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agent.node_id.trim().is_empty() {
            return Err(ConfigError::InvalidField {
                path: "agent.node_id".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if self.memory.provider == MemoryProviderKind::File && self.memory.path.is_none() {
            return Err(ConfigError::Invalid(
                "file memory provider requires memory.path".to_string(),
            ));
        }
        Ok(())
    }
}

/// Internal representation of a loaded config layer.
#[derive(Debug, Clone)]
struct LoadedLayer {
    meta: ConfigLayer,
    value: Value,
}

fn config_from_value(value: Value, label: &str) -> Result<TriageConfig, ConfigError> {
    schema::validate_layer_schema(&value, label)?;
    let config: TriageConfig = serde_json::from_value(value)?;
    config.validate()?;
    Ok(config)
}

fn push_optional(
    source: ConfigLayerSource,
    path: PathBuf,
    loaded: &mut Vec<LoadedLayer>,
    seen_paths: &mut HashSet<PathBuf>,
) -> Result<(), ConfigError> {
    if !path.exists() {
        debug!(
            "skipping missing layer (source={:?}, path={})",
            source,
            path.display()
        );
        return Ok(());
    }
    if !seen_paths.insert(utils::unique_path(&path)) {
        debug!(
            "skipping duplicate layer (source={:?}, path={})",
            source,
            path.display()
        );
        return Ok(());
    }
    loaded.push(layer_io::load_required_layer(source, &path)?);
    Ok(())
}
