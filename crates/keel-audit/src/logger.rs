//! Audit logger implementation.
//!
//! Provides the main `AuditLogger` type with helper methods for each point in a
//! command's lifecycle.

use keel_core::{AuditConfig, CommandType};
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::AuditError;
use crate::event::{AuditEvent, AuditEventType};
use crate::storage::{AuditStorage, DualStorage, FileStorage, MemoryStorage, NullStorage};

/// The main audit logger.
///
/// Cheap to clone; clones share the same storage.
#[derive(Clone)]
pub struct AuditLogger {
    config: AuditConfig,
    storage: Arc<dyn AuditStorage>,
}

impl AuditLogger {
    /// Create a new audit logger with the given configuration.
    pub fn new(config: AuditConfig) -> Result<Self, AuditError> {
        let storage: Arc<dyn AuditStorage> = if !config.enabled {
            Arc::new(NullStorage::new())
        } else {
            let file_path = Self::resolve_log_path(&config);

            if config.stdout {
                Arc::new(DualStorage::new(&file_path)?)
            } else {
                Arc::new(FileStorage::new(&file_path)?)
            }
        };

        Ok(Self { config, storage })
    }

    /// Create a logger with a custom storage backend.
    pub fn with_storage(config: AuditConfig, storage: Arc<dyn AuditStorage>) -> Self {
        Self { config, storage }
    }

    /// Create a disabled (no-op) logger.
    pub fn disabled() -> Self {
        Self {
            config: AuditConfig {
                enabled: false,
                ..Default::default()
            },
            storage: Arc::new(NullStorage::new()),
        }
    }

    /// Create an enabled logger backed by memory.
    pub fn in_memory() -> Self {
        Self::with_storage(AuditConfig::default(), Arc::new(MemoryStorage::new()))
    }

    fn resolve_log_path(config: &AuditConfig) -> PathBuf {
        let mut path = PathBuf::from(&config.directory);
        path.push(&config.file_name);
        path
    }

    /// Check if logging is enabled.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Log an audit event.
    pub async fn log(&self, event: AuditEvent) -> Result<(), AuditError> {
        if !self.config.enabled {
            return Ok(());
        }

        tracing::debug!(
            event_id = %event.event_id,
            event_type = %event.event_type,
            command_id = %event.command_id,
            command_type = %event.command_type,
            "Audit event"
        );

        self.storage.store(event).await
    }

    /// Log an event, downgrading a storage failure to a warning.
    ///
    /// The audit trail never changes the outcome of a command.
    pub async fn record(&self, event: AuditEvent) {
        let command_id = event.command_id.clone();
        if let Err(e) = self.log(event).await {
            tracing::warn!(command_id = %command_id, error = %e, "Failed to record audit event");
        }
    }

    pub async fn log_command_received(
        &self,
        command_id: &str,
        command_type: CommandType,
        target: &str,
    ) {
        let event = AuditEvent::builder(AuditEventType::CommandReceived, command_id, command_type)
            .target(target)
            .build();
        self.record(event).await
    }

    pub async fn log_command_succeeded(
        &self,
        command_id: &str,
        command_type: CommandType,
        target: &str,
        duration_ms: u64,
    ) {
        let event = AuditEvent::builder(AuditEventType::CommandSucceeded, command_id, command_type)
            .target(target)
            .duration_ms(duration_ms)
            .build();
        self.record(event).await
    }

    pub async fn log_target_not_found(
        &self,
        command_id: &str,
        command_type: CommandType,
        target: &str,
        duration_ms: u64,
    ) {
        let event = AuditEvent::builder(AuditEventType::TargetNotFound, command_id, command_type)
            .target(target)
            .duration_ms(duration_ms)
            .build();
        self.record(event).await
    }

    /// Log a failed command. `stage` is the cascade stage or saga step that failed.
    pub async fn log_command_failed(
        &self,
        command_id: &str,
        command_type: CommandType,
        target: &str,
        stage: Option<&str>,
        error: &str,
        duration_ms: u64,
    ) {
        let mut builder =
            AuditEvent::builder(AuditEventType::CommandFailed, command_id, command_type)
                .target(target)
                .error(error)
                .duration_ms(duration_ms);
        if let Some(stage) = stage {
            builder = builder.stage(stage);
        }
        self.record(builder.build()).await
    }

    pub async fn log_command_ignored(&self, command_id: &str, command_type: CommandType) {
        let event = AuditEvent::new(AuditEventType::CommandIgnored, command_id, command_type);
        self.record(event).await
    }

    pub async fn log_step_compensated(
        &self,
        command_id: &str,
        command_type: CommandType,
        step: &str,
    ) {
        let event = AuditEvent::builder(AuditEventType::StepCompensated, command_id, command_type)
            .step(step)
            .build();
        self.record(event).await
    }

    pub async fn log_compensation_failed(
        &self,
        command_id: &str,
        command_type: CommandType,
        step: &str,
        error: &str,
    ) {
        let event =
            AuditEvent::builder(AuditEventType::CompensationFailed, command_id, command_type)
                .step(step)
                .error(error)
                .build();
        self.record(event).await
    }

    /// Query audit events with filters.
    pub async fn query(&self, filter: AuditFilter) -> Result<Vec<AuditEvent>, AuditError> {
        self.storage.query(filter).await
    }

    /// All events recorded for one command, oldest first.
    pub async fn for_command(&self, command_id: &str) -> Result<Vec<AuditEvent>, AuditError> {
        self.query(AuditFilter {
            command_id: Some(command_id.to_string()),
            ..Default::default()
        })
        .await
    }
}

impl std::fmt::Debug for AuditLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLogger")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Filter for querying audit events.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    /// Filter by command ID.
    pub command_id: Option<String>,
    /// Filter by command type.
    pub command_type: Option<CommandType>,
    /// Filter by event type.
    pub event_type: Option<AuditEventType>,
    /// Maximum number of results.
    pub limit: Option<usize>,
}

impl AuditFilter {
    pub fn matches(&self, event: &AuditEvent) -> bool {
        if let Some(ref command_id) = self.command_id {
            if &event.command_id != command_id {
                return false;
            }
        }
        if let Some(command_type) = self.command_type {
            if event.command_type != command_type {
                return false;
            }
        }
        if let Some(event_type) = self.event_type {
            if event.event_type != event_type {
                return false;
            }
        }
        true
    }

    /// Keep matching events, then apply the limit.
    pub fn apply(&self, events: impl IntoIterator<Item = AuditEvent>) -> Vec<AuditEvent> {
        let matching = events.into_iter().filter(|e| self.matches(e));
        match self.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        }
    }
}
