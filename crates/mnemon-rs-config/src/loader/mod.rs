//! Layered configuration loader.
//!
//! Discovers configuration layers (user/project/cwd/runtime), validates each
//! against the schema, merges them, and produces a final `MnemonConfig`.

mod layer_io;
mod merge;
mod schema;
mod utils;

#[cfg(test)]
mod tests;

use crate::{ClientProvider, ConfigError, MnemonConfig};
use log::{debug, info};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Default config filename in local layers.
const DEFAULT_CONFIG_FILE: &str = "mnemon.json5";
/// Default config directory under the home directory.
const DEFAULT_CONFIG_DIR: &str = ".mnemon";
/// Marker files/dirs that identify a project root.
const DEFAULT_PROJECT_ROOT_MARKERS: &[&str] = &[".git"];

/// Effective config plus metadata about which layers were loaded.
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    /// The merged, validated config.
    pub config: MnemonConfig,
    /// Layers that contributed, lowest precedence first.
    pub layers: Vec<ConfigLayer>,
}

/// Origin for a single config layer in the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayerSource {
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
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLayer {
    pub source: ConfigLayerSource,
    pub path: PathBuf,
}

/// Options controlling layered config discovery and overrides.
#[derive(Debug, Clone)]
pub struct LayeredConfigOptions {
    /// Working directory used to find local layers.
    pub cwd: PathBuf,
    /// Optional user config path (defaults to `~/.mnemon/mnemon.json5`).
    pub user_config_path: Option<PathBuf>,
    /// Runtime override config paths applied last, in order.
    pub runtime_paths: Vec<PathBuf>,
    /// Marker files/dirs used to detect the project root.
    pub project_root_markers: Vec<String>,
}

impl LayeredConfigOptions {
    /// Create options with default layer locations for the provided cwd.
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
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

impl MnemonConfig {
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
    /// Layer precedence (low -> high): user, project root, cwd, runtime
    /// overrides. Objects merge recursively; any other value replaces the
    /// lower layer's value, `null` included.
    pub fn load_layered_with_options(
        options: LayeredConfigOptions,
    ) -> Result<LayeredConfig, ConfigError> {
        let cwd = utils::normalize_path(&options.cwd)?;
        debug!("normalized cwd for config load: {}", cwd.display());
        let mut candidates: Vec<(ConfigLayerSource, PathBuf)> = Vec::new();

        if let Some(path) = options.user_config_path.clone() {
            candidates.push((ConfigLayerSource::User, path));
        }
        match utils::find_project_root(&cwd, &options.project_root_markers) {
            Some(project_root) => {
                debug!("resolved project root: {}", project_root.display());
                candidates.push((
                    ConfigLayerSource::Project,
                    project_root.join(DEFAULT_CONFIG_FILE),
                ));
            }
            None => debug!("project root not found; skipping project layer"),
        }
        candidates.push((ConfigLayerSource::Cwd, cwd.join(DEFAULT_CONFIG_FILE)));

        let mut layers = Vec::new();
        let mut values = Vec::new();
        let mut seen_paths = HashSet::new();
        for (source, path) in candidates {
            if !path.exists() {
                debug!(
                    "skipping missing layer (source={:?}, path={})",
                    source,
                    path.display()
                );
                continue;
            }
            if !seen_paths.insert(utils::unique_path(&path)) {
                debug!(
                    "skipping duplicate layer (source={:?}, path={})",
                    source,
                    path.display()
                );
                continue;
            }
            let value = layer_io::load_required_layer(source, &path)?;
            layers.push(ConfigLayer { source, path });
            values.push(value);
        }

        for path in &options.runtime_paths {
            let value = layer_io::load_required_layer(ConfigLayerSource::Runtime, path)?;
            debug!("loaded runtime layer (path={})", path.display());
            layers.push(ConfigLayer {
                source: ConfigLayerSource::Runtime,
                path: path.clone(),
            });
            values.push(value);
        }

        let mut merged = Value::Object(serde_json::Map::new());
        for value in &values {
            merge::merge_json_values(&mut merged, value);
        }

        let config = config_from_value(merged, "effective")?;
        info!("layered config loaded (layers={})", layers.len());
        Ok(LayeredConfig { config, layers })
    }

    /// Validate invariants that cannot be expressed in serde.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(bank_id) = &self.memory.bank_id {
            if bank_id.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "memory.bank_id cannot be blank".to_string(),
                ));
            }
        }
        if let Some(threshold) = self.memory.recall.dedup_threshold {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(ConfigError::Invalid(format!(
                    "memory.recall.dedup_threshold must be within [0, 1] (got {threshold})"
                )));
            }
        }
        match self.client.provider {
            ClientProvider::Http if self.client.base_url.trim().is_empty() => {
                return Err(ConfigError::Invalid(
                    "client.base_url is required for the http provider".to_string(),
                ));
            }
            ClientProvider::Cli if self.client.cli.program.trim().is_empty() => {
                return Err(ConfigError::Invalid(
                    "client.cli.program is required for the cli provider".to_string(),
                ));
            }
            _ => {}
        }
        if self.client.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "client.timeout_secs must be positive".to_string(),
            ));
        }
        if self.client.cli.inline_limit == 0 {
            return Err(ConfigError::Invalid(
                "client.cli.inline_limit must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn config_from_value(value: Value, label: &str) -> Result<MnemonConfig, ConfigError> {
    schema::validate_layer_schema(&value, label)?;
    let config: MnemonConfig = serde_json::from_value(value)?;
    config.validate()?;
    Ok(config)
}
