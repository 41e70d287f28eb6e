//! Command type to handler routing.

use crate::cascade::{DeleteEnvironmentHandler, DeleteOrganizationHandler, DeleteUserHandler};
use crate::handler::CommandHandler;
use crate::provision::ProvisionCredentialHandler;
use crate::reply::{Outcome, build_reply};
use futures::FutureExt;
use keel_audit::AuditLogger;
use keel_core::{Command, CommandType, Reply, RuntimeConfig};
use keel_repository::Repositories;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

/// Error detail of a command whose handler panicked.
pub const UNEXPECTED_ERROR: &str = "Unexpected error while handling command.";

/// Registry of command handlers, keyed by command type.
#[derive(Clone)]
pub struct DispatchRegistry {
    handlers: HashMap<CommandType, Arc<dyn CommandHandler>>,
    audit: AuditLogger,
}

impl DispatchRegistry {
    /// Create an empty registry.
    pub fn new(audit: AuditLogger) -> Self {
        Self {
            handlers: HashMap::new(),
            audit,
        }
    }

    /// Registry with every built-in handler wired to `repos`.
    pub fn standard(repos: Repositories, audit: AuditLogger, config: &RuntimeConfig) -> Self {
        let mut registry = Self::new(audit.clone());
        registry.register(Arc::new(
            DeleteEnvironmentHandler::new(repos.clone())
                .with_parallel_subcascades(config.parallel_subcascades),
        ));
        registry.register(Arc::new(DeleteOrganizationHandler::new(repos.clone())));
        registry.register(Arc::new(DeleteUserHandler::new(repos.clone())));
        registry.register(Arc::new(ProvisionCredentialHandler::new(repos, audit)));
        registry
    }

    /// Register a handler, replacing any handler of the same type.
    pub fn register(&mut self, handler: Arc<dyn CommandHandler>) {
        self.handlers.insert(handler.command_type(), handler);
    }

    pub fn unregister(&mut self, command_type: CommandType) -> Option<Arc<dyn CommandHandler>> {
        self.handlers.remove(&command_type)
    }

    pub fn get(&self, command_type: CommandType) -> Option<&Arc<dyn CommandHandler>> {
        self.handlers.get(&command_type)
    }

    pub fn contains(&self, command_type: CommandType) -> bool {
        self.handlers.contains_key(&command_type)
    }

    /// Registered handlers, in command type order.
    pub fn handlers(&self) -> Vec<&Arc<dyn CommandHandler>> {
        let mut handlers: Vec<_> = self.handlers.values().collect();
        handlers.sort_by_key(|h| h.command_type());
        handlers
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Handle one command and build its reply.
    ///
    /// Returns `None` when no handler is registered for the command type.
    /// Every other path, including a panicking handler, yields exactly one
    /// reply carrying the command's id.
    pub async fn dispatch(&self, command: &Command) -> Option<Reply> {
        let command_type = command.command_type();
        let Some(handler) = self.handlers.get(&command_type) else {
            tracing::warn!(
                command_id = %command.id,
                %command_type,
                "No handler registered, ignoring command"
            );
            self.audit.log_command_ignored(&command.id, command_type).await;
            return None;
        };

        let target = command.payload.target_external_id();
        tracing::info!(
            command_id = %command.id,
            %command_type,
            external_id = target,
            "Handling command"
        );
        self.audit.log_command_received(&command.id, command_type, target).await;

        let started = Instant::now();
        let outcome = match AssertUnwindSafe(handler.handle(command)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::error!(command_id = %command.id, %command_type, "Handler panicked");
                Outcome::error(UNEXPECTED_ERROR)
            }
        };
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match &outcome {
            Outcome::Ok(_) => {
                self.audit
                    .log_command_succeeded(&command.id, command_type, target, duration_ms)
                    .await
            }
            Outcome::NotFoundTreatedAsOk => {
                self.audit
                    .log_target_not_found(&command.id, command_type, target, duration_ms)
                    .await
            }
            Outcome::Err(failure) => {
                self.audit
                    .log_command_failed(
                        &command.id,
                        command_type,
                        target,
                        failure.stage.as_deref(),
                        &failure.message,
                        duration_ms,
                    )
                    .await
            }
        }

        let reply = build_reply(command, outcome);
        tracing::info!(
            command_id = %reply.command_id,
            %command_type,
            status = %reply.status,
            duration_ms,
            "Command handled"
        );
        Some(reply)
    }
}

impl std::fmt::Debug for DispatchRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<_> = self.handlers.keys().collect();
        types.sort();
        f.debug_struct("DispatchRegistry").field("handlers", &types).finish()
    }
}
