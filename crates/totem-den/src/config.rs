//! Deployment configuration for the den.
//!
//! Tuning overrides load from an optional TOML file plus `TOTEM_`-prefixed
//! environment variables (`TOTEM_STAKE__MIN_STAKE=…`), env winning over
//! file, defaults filling the rest.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};

use totem_core::tuning::Tuning;

/// Full den configuration.
#[derive(Debug, Clone)]
pub struct DenConfig {
    /// Optional tuning override file (TOML).
    pub tuning_path: Option<PathBuf>,
    /// Log level filter string (e.g. "info", "totem_den=debug").
    pub log_level: String,
    /// Engine tuning, resolved at load time.
    pub tuning: Tuning,
}

impl Default for DenConfig {
    fn default() -> Self {
        Self {
            tuning_path: None,
            log_level: "info".to_string(),
            tuning: Tuning::default(),
        }
    }
}

impl DenConfig {
    /// Resolve a config with tuning loaded from `path` (when given) and the
    /// environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Ok(Self {
            tuning_path: path.map(Path::to_path_buf),
            log_level: std::env::var("TOTEM_LOG").unwrap_or_else(|_| "info".to_string()),
            tuning: load_tuning(path)?,
        })
    }
}

/// Load [`Tuning`] from an optional file plus `TOTEM_*` env overrides.
pub fn load_tuning(path: Option<&Path>) -> Result<Tuning, ConfigError> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path));
    }
    builder = builder.add_source(Environment::with_prefix("TOTEM").separator("__"));
    builder.build()?.try_deserialize()
}
