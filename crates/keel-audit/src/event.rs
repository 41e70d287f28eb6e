//! Audit event types.
//!
//! One event per notable point in a command's life: receipt, the final
//! outcome, and every compensation a saga ran on the way to an error.

use chrono::{DateTime, Utc};
use keel_core::CommandType;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Type of audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    // ===== Lifecycle =====
    /// Command was accepted by a handler.
    CommandReceived,
    /// Command completed and replied SUCCEEDED.
    CommandSucceeded,
    /// Command target did not exist; replied SUCCEEDED without doing anything.
    TargetNotFound,
    /// Command replied ERROR.
    CommandFailed,
    /// No handler is registered for the command type; no reply was sent.
    CommandIgnored,

    // ===== Saga rollback =====
    /// A compensating action ran successfully.
    StepCompensated,
    /// A compensating action failed; the rollback carried on.
    CompensationFailed,
}

impl std::fmt::Display for AuditEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CommandReceived => write!(f, "COMMAND_RECEIVED"),
            Self::CommandSucceeded => write!(f, "COMMAND_SUCCEEDED"),
            Self::TargetNotFound => write!(f, "TARGET_NOT_FOUND"),
            Self::CommandFailed => write!(f, "COMMAND_FAILED"),
            Self::CommandIgnored => write!(f, "COMMAND_IGNORED"),
            Self::StepCompensated => write!(f, "STEP_COMPENSATED"),
            Self::CompensationFailed => write!(f, "COMPENSATION_FAILED"),
        }
    }
}

/// An audit event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID.
    pub event_id: Uuid,

    /// When the event occurred.
    pub occurred_at: DateTime<Utc>,

    /// Event type.
    pub event_type: AuditEventType,

    /// Id of the command the event belongs to.
    pub command_id: String,

    pub command_type: CommandType,

    /// External identifier of the command's target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Cascade stage reached when the event was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,

    /// Saga step the event refers to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,

    /// Error message (if event_type indicates failure).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Duration in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl AuditEvent {
    /// Create a new audit event with the given type and command identity.
    pub fn new(
        event_type: AuditEventType,
        command_id: impl Into<String>,
        command_type: CommandType,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            event_type,
            command_id: command_id.into(),
            command_type,
            target: None,
            stage: None,
            step: None,
            error: None,
            duration_ms: None,
        }
    }

    /// Create a builder for an audit event.
    pub fn builder(
        event_type: AuditEventType,
        command_id: impl Into<String>,
        command_type: CommandType,
    ) -> AuditEventBuilder {
        AuditEventBuilder {
            event: Self::new(event_type, command_id, command_type),
        }
    }

    /// Format the event as a human-readable log line.
    ///
    /// Format: `[timestamp] EVENT_TYPE command=... type=... [target=...]`
    pub fn to_log_line(&self) -> String {
        let mut line = format!(
            "[{}] {} command={} type={}",
            self.occurred_at.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            self.event_type,
            self.command_id,
            self.command_type,
        );

        if let Some(ref target) = self.target {
            line.push_str(&format!(" target={}", target));
        }
        if let Some(ref stage) = self.stage {
            line.push_str(&format!(" stage={}", stage));
        }
        if let Some(ref step) = self.step {
            line.push_str(&format!(" step={}", step));
        }
        if let Some(duration) = self.duration_ms {
            line.push_str(&format!(" duration_ms={}", duration));
        }
        if let Some(ref error) = self.error {
            line.push_str(&format!(" error=\"{}\"", error.replace('"', "'")));
        }

        line
    }
}

/// Builder for creating audit events.
#[derive(Debug)]
pub struct AuditEventBuilder {
    event: AuditEvent,
}

impl AuditEventBuilder {
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.event.target = Some(target.into());
        self
    }

    pub fn stage(mut self, stage: impl Into<String>) -> Self {
        self.event.stage = Some(stage.into());
        self
    }

    pub fn step(mut self, step: impl Into<String>) -> Self {
        self.event.step = Some(step.into());
        self
    }

    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.event.error = Some(error.into());
        self
    }

    pub fn duration_ms(mut self, duration: u64) -> Self {
        self.event.duration_ms = Some(duration);
        self
    }

    /// Build the audit event.
    pub fn build(self) -> AuditEvent {
        self.event
    }
}
