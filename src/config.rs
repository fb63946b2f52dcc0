//! Configuration System
//!
//! Layered configuration using the `config` crate. Sources, lowest precedence
//! first: built-in defaults, the global file `~/.config/snapcat/config.toml`,
//! the workspace file `snapcat.toml`, then `SNAPCAT__SECTION__KEY` environment
//! variables.

use crate::catalog::ScanConfig;
use crate::error::ApiError;
use crate::logging::LoggingConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Workspace config file name
pub const WORKSPACE_CONFIG_FILE: &str = "snapcat.toml";

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapcatConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub watch: WatchConfig,
}

/// Settings for `dirtab watch`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Events closer together than this are folded into one re-evaluation
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    200
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Logging(String),
    Scan(String),
    Watch(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
            ValidationError::Scan(msg) => write!(f, "Scan: {}", msg),
            ValidationError::Watch(msg) => write!(f, "Watch: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl SnapcatConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }
        if self.scan.ignore_names.iter().any(|n| n.is_empty() || n.contains('/')) {
            errors.push(ValidationError::Scan(
                "Ignored names must be single, non-empty file names".to_string(),
            ));
        }
        if self.scan.max_depth == Some(0) {
            errors.push(ValidationError::Scan(
                "max_depth must be at least 1".to_string(),
            ));
        }
        if self.watch.debounce_ms > 60_000 {
            errors.push(ValidationError::Watch(format!(
                "debounce_ms {} exceeds one minute",
                self.watch.debounce_ms
            )));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Render as TOML, e.g. as a starting point for a config file
    pub fn to_toml(&self) -> Result<String, ApiError> {
        toml::to_string_pretty(self)
            .map_err(|e| ApiError::ConfigError(format!("Failed to serialize config: {}", e)))
    }
}

/// Loads `SnapcatConfig` from the layered sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        std::env::var("HOME").ok().map(|home| {
            PathBuf::from(home)
                .join(".config")
                .join("snapcat")
                .join("config.toml")
        })
    }

    /// Load defaults, global file, `<workspace>/snapcat.toml` and environment
    pub fn load(workspace_root: &Path) -> Result<SnapcatConfig, ApiError> {
        let mut builder = builder_with_defaults()?;

        if let Some(global) = Self::global_config_path() {
            if global.exists() {
                debug!(config_path = %global.display(), "Using global config");
                builder = add_file(builder, &global);
            }
        }

        let workspace_file = workspace_root.join(WORKSPACE_CONFIG_FILE);
        if workspace_file.exists() {
            debug!(config_path = %workspace_file.display(), "Using workspace config");
            builder = add_file(builder, &workspace_file);
        }

        finish(builder)
    }

    /// Load defaults, one explicit file (required) and environment
    pub fn load_from_file(path: &Path) -> Result<SnapcatConfig, ApiError> {
        if !path.exists() {
            return Err(ApiError::ConfigError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let builder = add_file(builder_with_defaults()?, path);
        finish(builder)
    }
}

/// Builder with defaults for every section
fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let defaults = SnapcatConfig::default();
    Config::builder()
        .set_default("logging.enabled", defaults.logging.enabled)?
        .set_default("logging.level", defaults.logging.level)?
        .set_default("watch.debounce_ms", defaults.watch.debounce_ms)
}

fn add_file(builder: ConfigBuilder<DefaultState>, path: &Path) -> ConfigBuilder<DefaultState> {
    let path = dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    builder.add_source(File::from(path).format(FileFormat::Toml).required(false))
}

fn finish(builder: ConfigBuilder<DefaultState>) -> Result<SnapcatConfig, ApiError> {
    let config: SnapcatConfig = builder
        .add_source(
            Environment::with_prefix("SNAPCAT")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()?;

    config.validate().map_err(|errors| {
        let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        ApiError::ConfigError(format!(
            "Configuration validation failed:\n{}",
            error_msgs.join("\n")
        ))
    })?;

    Ok(config)
}
