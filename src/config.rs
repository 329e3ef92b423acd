//! User configuration.
//!
//! Settings are layered, later layers overriding earlier ones key by key:
//!
//! 1. built-in defaults
//! 2. the global `fillclass/config.toml` in the platform config directory
//! 3. `.fillclass.toml` at the workspace root
//! 4. LSP `initializationOptions` / `workspace/didChangeConfiguration`
//!    (either flat or nested under a `"fillclass"` key)
//!
//! TOML layers are converted to JSON values and merged before the result
//! is deserialized once, so a layer only has to mention the keys it
//! changes.

use std::path::{Path, PathBuf};

use etcetera::BaseStrategy;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{FillPolicy, ValueMode};

/// File name of the per-workspace configuration.
pub const WORKSPACE_CONFIG_FILE: &str = ".fillclass.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid settings: {0}")]
    Invalid(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillConfig {
    /// Emit `name =` placeholders instead of values (not applied to the
    /// same-name action).
    pub without_default_values: bool,
    /// Skip parameters that declare a default value.
    pub without_default_arguments: bool,
    pub with_trailing_comma: bool,
    pub put_arguments_on_separate_lines: bool,
    /// Let the client step through the inserted arguments.
    pub move_pointer_to_every_argument: bool,
    pub max_nesting_depth: usize,
    /// Value modes offered as code actions, in this order.
    pub actions: Vec<ValueMode>,
    /// Fixed seed for dummy values; random when unset.
    pub dummy_seed: Option<u64>,
}

impl Default for FillConfig {
    fn default() -> Self {
        let policy = FillPolicy::default();
        Self {
            without_default_values: policy.suppress_explicit_value_placeholders,
            without_default_arguments: policy.skip_defaulted_parameters,
            with_trailing_comma: policy.append_trailing_comma,
            put_arguments_on_separate_lines: policy.one_argument_per_line,
            move_pointer_to_every_argument: policy.place_cursor_at_each_argument,
            max_nesting_depth: policy.max_nesting_depth,
            actions: vec![
                ValueMode::EmptyDefaults,
                ValueMode::DummyValues,
                ValueMode::SameNameAsParameter,
            ],
            dummy_seed: None,
        }
    }
}

impl FillConfig {
    /// The policy for one action.
    pub fn policy(&self, mode: ValueMode) -> FillPolicy {
        FillPolicy {
            value_mode: mode,
            skip_defaulted_parameters: self.without_default_arguments,
            suppress_explicit_value_placeholders: self.without_default_values
                && mode != ValueMode::SameNameAsParameter,
            append_trailing_comma: self.with_trailing_comma,
            one_argument_per_line: self.put_arguments_on_separate_lines,
            place_cursor_at_each_argument: self.move_pointer_to_every_argument,
            max_nesting_depth: self.max_nesting_depth,
        }
    }

    /// Load the global and workspace files.
    pub fn load(workspace_root: Option<&Path>) -> Result<Self, ConfigError> {
        let mut files = Vec::new();
        if let Some(global) = global_config_path() {
            files.push(global);
        }
        if let Some(root) = workspace_root {
            files.push(root.join(WORKSPACE_CONFIG_FILE));
        }
        Self::from_files(&files)
    }

    /// Merge the given TOML files in order; missing files are skipped.
    pub fn from_files(files: &[PathBuf]) -> Result<Self, ConfigError> {
        let mut merged = serde_json::to_value(Self::default())?;
        for path in files {
            let content = match std::fs::read_to_string(path) {
                Ok(content) => content,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(source) => {
                    return Err(ConfigError::Io {
                        path: path.clone(),
                        source,
                    });
                }
            };
            let table: toml::Table = toml::from_str(&content).map_err(|source| ConfigError::Toml {
                path: path.clone(),
                source,
            })?;
            tracing::debug!("loaded configuration from {}", path.display());
            merge(&mut merged, serde_json::to_value(table)?);
        }
        Ok(serde_json::from_value(merged)?)
    }

    /// Apply LSP settings on top of this configuration.
    pub fn with_lsp_settings(&self, settings: &Value) -> Result<Self, ConfigError> {
        let layer = settings.get("fillclass").unwrap_or(settings);
        if !layer.is_object() {
            return Ok(self.clone());
        }
        let mut merged = serde_json::to_value(self)?;
        merge(&mut merged, layer.clone());
        Ok(serde_json::from_value(merged)?)
    }
}

/// `<config dir>/fillclass/config.toml`
pub fn global_config_path() -> Option<PathBuf> {
    let strategy = etcetera::choose_base_strategy().ok()?;
    Some(strategy.config_dir().join("fillclass").join("config.toml"))
}

/// Recursively overlay `layer` onto `base`; non-object values replace.
fn merge(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Object(base), Value::Object(layer)) => {
            for (key, value) in layer {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, layer) => *base = layer,
    }
}
