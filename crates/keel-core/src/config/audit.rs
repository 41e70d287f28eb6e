//! Audit trail configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the command audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Whether audit events are recorded at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Also print every event to stdout.
    #[serde(default)]
    pub stdout: bool,

    /// Directory holding the JSON Lines audit file.
    #[serde(default = "default_directory")]
    pub directory: String,

    /// Name of the audit file inside `directory`.
    #[serde(default = "default_file_name")]
    pub file_name: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            stdout: false,
            directory: default_directory(),
            file_name: default_file_name(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_directory() -> String {
    "logs".to_string()
}

fn default_file_name() -> String {
    "commands.log".to_string()
}
