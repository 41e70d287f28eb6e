//! Turning a handler outcome into the one reply a command gets.

use keel_core::{Command, Reply};
use serde_json::Value;

/// Detail of a failed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// Stable message sent back as `error_details`.
    pub message: String,
    /// Cascade stage or saga step that failed, when known.
    pub stage: Option<String>,
}

/// What a handler concluded.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Ok(Option<Value>),
    /// The target was already gone. Replies `SUCCEEDED`.
    NotFoundTreatedAsOk,
    Err(Failure),
}

impl Outcome {
    pub fn ok() -> Self {
        Self::Ok(None)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Err(Failure {
            message: message.into(),
            stage: None,
        })
    }

    pub fn error_at(message: impl Into<String>, stage: impl Into<String>) -> Self {
        Self::Err(Failure {
            message: message.into(),
            stage: Some(stage.into()),
        })
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Err(_))
    }
}

/// Build the reply for `command`. The reply always carries `command.id`.
pub fn build_reply(command: &Command, outcome: Outcome) -> Reply {
    let command_type = command.command_type();
    match outcome {
        Outcome::Ok(Some(payload)) => {
            Reply::succeeded(&command.id, command_type).with_payload(payload)
        }
        Outcome::Ok(None) | Outcome::NotFoundTreatedAsOk => {
            Reply::succeeded(&command.id, command_type)
        }
        Outcome::Err(failure) => Reply::error(&command.id, command_type, failure.message),
    }
}
