//! Configuration management for the permstore tooling.
//!
//! Configuration is loaded from three sources:
//! 1. Default values (hardcoded)
//! 2. Configuration file (YAML, optional)
//! 3. Environment variables (override)
//!
//! Environment variables take precedence over config file values,
//! which take precedence over defaults.
//!
//! # Example
//!
//! ```yaml
//! storage:
//!   backend: snapshot
//!   snapshot_path: /etc/permstore/perms.json
//! logging:
//!   level: debug
//!   json: false
//! features: [multichannelling, role_permissions]
//! ```

use std::path::Path;

use config::{Config, ConfigError, Environment, File, FileFormat};
use permstore_domain::{CacheConfig, FeatureSet};
use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct PermstoreConfig {
    /// Where permission rows come from
    #[serde(default)]
    pub storage: StorageSettings,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Enabled product features
    #[serde(default)]
    pub features: FeatureSet,
}

/// Permission source settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct StorageSettings {
    /// Source type: "memory" (starts empty) or "snapshot" (seeded from a JSON file)
    #[serde(default = "default_storage_backend")]
    pub backend: String,

    /// Snapshot file (required if backend is "snapshot")
    pub snapshot_path: Option<String>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            snapshot_path: None,
        }
    }
}

fn default_storage_backend() -> String {
    "memory".to_string()
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingSettings {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Use JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

const ENV_PREFIX: &str = "PERMSTORE";

impl PermstoreConfig {
    /// Load configuration from a YAML file with environment variable overrides.
    ///
    /// Environment variables are prefixed with `PERMSTORE_` and use `__` as
    /// separator, e.g. `PERMSTORE_STORAGE__SNAPSHOT_PATH` overrides
    /// `storage.snapshot_path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigLoadError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let config = Config::builder()
            .add_source(Config::try_from(&PermstoreConfig::default())?)
            .add_source(File::from(path).format(FileFormat::Yaml))
            .add_source(environment())
            .build()?;

        let loaded: PermstoreConfig = config.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Load configuration from defaults and environment variables only.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        let config = Config::builder()
            .add_source(Config::try_from(&PermstoreConfig::default())?)
            .add_source(environment())
            .build()?;

        let loaded: PermstoreConfig = config.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        let valid_backends = ["memory", "snapshot"];
        if !valid_backends.contains(&self.storage.backend.as_str()) {
            return Err(ConfigLoadError::Invalid {
                message: format!(
                    "storage.backend must be one of: {:?}, got: {}",
                    valid_backends, self.storage.backend
                ),
            });
        }

        if self.storage.backend == "snapshot"
            && self
                .storage
                .snapshot_path
                .as_deref()
                .map_or(true, |s| s.trim().is_empty())
        {
            return Err(ConfigLoadError::Invalid {
                message: "storage.snapshot_path is required when backend is 'snapshot'"
                    .to_string(),
            });
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigLoadError::Invalid {
                message: format!(
                    "logging.level must be one of: {:?}, got: {}",
                    valid_levels, self.logging.level
                ),
            });
        }

        Ok(())
    }

    /// Cache settings derived from the enabled features.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::from_features(&self.features)
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}
