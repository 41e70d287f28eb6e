//! Replies sent back to the control service.

use crate::command::CommandType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Final status of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandStatus {
    Succeeded,
    Error,
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => write!(f, "SUCCEEDED"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// The one reply produced for a command.
///
/// `command_id` always equals the originating command's `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub command_id: String,
    pub command_type: CommandType,
    pub status: CommandStatus,
    /// Stable, human-readable failure detail. Only set on `ERROR`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
    /// Result payload (e.g. the generated credential).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl Reply {
    pub fn succeeded(command_id: impl Into<String>, command_type: CommandType) -> Self {
        Self {
            command_id: command_id.into(),
            command_type,
            status: CommandStatus::Succeeded,
            error_details: None,
            payload: None,
        }
    }

    pub fn error(
        command_id: impl Into<String>,
        command_type: CommandType,
        error_details: impl Into<String>,
    ) -> Self {
        Self {
            command_id: command_id.into(),
            command_type,
            status: CommandStatus::Error,
            error_details: Some(error_details.into()),
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == CommandStatus::Succeeded
    }
}
