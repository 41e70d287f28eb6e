//! Configuration for the Keel engine.
//!
//! Loaded from a single YAML file (`keel.yaml`). Every field has a default, so
//! an empty file is a valid configuration.
//!
//! ```yaml
//! runtime:
//!   max_in_flight: 16
//!   parallel_subcascades: false
//!   strict_consistency: true
//! audit:
//!   enabled: true
//!   stdout: false
//!   directory: logs
//! observability:
//!   log_level: info
//! ```

pub mod audit;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub use audit::AuditConfig;

/// Complete Keel configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeelConfig {
    /// Orchestration settings.
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Audit trail settings.
    #[serde(default)]
    pub audit: AuditConfig,

    /// Logging settings.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Orchestration settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Maximum number of commands handled concurrently by the worker.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,

    /// Run per-API and per-application sub-cascades concurrently.
    #[serde(default)]
    pub parallel_subcascades: bool,

    /// Refuse to start when the consistency audit reports orphaned capabilities.
    #[serde(default = "default_true")]
    pub strict_consistency: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_in_flight: default_max_in_flight(),
            parallel_subcascades: false,
            strict_consistency: true,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Default `tracing` filter directive, overridden by `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit logs as JSON instead of human-readable lines.
    #[serde(default)]
    pub json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_in_flight() -> usize {
    16
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl KeelConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        // serde_yaml rejects an empty document; treat it as all-defaults.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.runtime.max_in_flight == 0 {
            return Err(ConfigError::Config(
                "runtime.max_in_flight must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
