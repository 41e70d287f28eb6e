//! Forward steps with reverse-order compensation.
//!
//! A [`Saga`] runs forward steps one at a time. After each successful step the
//! caller may register a compensation for it. When a step fails, every
//! registered compensation runs, newest first, before the error is returned.
//! A failing (or panicking) compensation is logged and audited, then the
//! rollback moves on to the next one.

use crate::error::{HandlerError, SagaError};
use futures::FutureExt;
use futures::future::BoxFuture;
use keel_audit::AuditLogger;
use keel_core::CommandType;
use keel_repository::RepositoryError;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;

/// Undoes one forward step.
pub type Compensation = BoxFuture<'static, Result<(), RepositoryError>>;

/// Identifies a forward step of a saga.
pub trait SagaStep: Copy + fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// Stable message reported when this step fails.
    fn failure_message(&self) -> &'static str;
}

pub struct Saga<S: SagaStep> {
    command_id: String,
    command_type: CommandType,
    audit: AuditLogger,
    compensations: Vec<(S, Compensation)>,
}

impl<S: SagaStep> Saga<S> {
    pub fn new(
        command_id: impl Into<String>,
        command_type: CommandType,
        audit: AuditLogger,
    ) -> Self {
        Self {
            command_id: command_id.into(),
            command_type,
            audit,
            compensations: Vec::new(),
        }
    }

    /// Run one forward step. On failure, roll back and return the step.
    pub async fn execute<T, E>(
        &mut self,
        step: S,
        forward: impl Future<Output = Result<T, E>>,
    ) -> Result<T, SagaError<S>>
    where
        E: Into<HandlerError>,
    {
        tracing::debug!(command_id = %self.command_id, %step, "Saga step");
        match forward.await {
            Ok(value) => Ok(value),
            Err(e) => {
                let source = e.into();
                tracing::error!(
                    command_id = %self.command_id,
                    %step,
                    error = %source,
                    "Saga step failed, compensating"
                );
                let compensation_failures = self.rollback().await;
                Err(SagaError {
                    step,
                    source,
                    compensation_failures,
                })
            }
        }
    }

    /// Register the compensation of a step that has completed.
    pub fn compensate_with(&mut self, step: S, compensation: Compensation) {
        self.compensations.push((step, compensation));
    }

    /// Number of compensations that would run on failure.
    pub fn pending_compensations(&self) -> usize {
        self.compensations.len()
    }

    /// Finish successfully; registered compensations are dropped unrun.
    pub fn complete(mut self) {
        tracing::debug!(
            command_id = %self.command_id,
            steps = self.compensations.len(),
            "Saga completed"
        );
        self.compensations.clear();
    }

    /// Run every registered compensation in reverse. Returns the failure count.
    async fn rollback(&mut self) -> usize {
        let mut failures = 0;
        while let Some((step, compensation)) = self.compensations.pop() {
            let result = AssertUnwindSafe(compensation).catch_unwind().await;
            let error = match result {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e.to_string()),
                Err(_) => Some("compensation panicked".to_string()),
            };

            let step_name = step.to_string();
            match error {
                None => {
                    tracing::info!(command_id = %self.command_id, %step, "Compensated saga step");
                    self.audit
                        .log_step_compensated(&self.command_id, self.command_type, &step_name)
                        .await;
                }
                Some(error) => {
                    failures += 1;
                    tracing::warn!(
                        command_id = %self.command_id,
                        %step,
                        error = %error,
                        "Compensation failed, continuing rollback"
                    );
                    self.audit
                        .log_compensation_failed(
                            &self.command_id,
                            self.command_type,
                            &step_name,
                            &error,
                        )
                        .await;
                }
            }
        }
        failures
    }
}
