//! Delete cascades.
//!
//! A cascade removes a target and everything that depends on it, in a fixed
//! order: stop what is running (`DISABLE`), delete dependents children first
//! (`CASCADE_DELETE`), then delete the target itself (`FINALIZE`).
//!
//! Every step is idempotent. A failed cascade leaves a partial deletion that a
//! re-delivery of the same command completes.

pub mod environment;
pub mod organization;
pub mod user;

pub use environment::{DeleteEnvironmentHandler, EnvironmentCascade};
pub use organization::DeleteOrganizationHandler;
pub use user::DeleteUserHandler;

use crate::error::{CascadeError, HandlerError};
use crate::reply::Outcome;
use serde::Serialize;
use std::fmt;
use std::future::Future;

/// Progress of a cascade run. `Error` is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CascadeStage {
    Start,
    Disable,
    CascadeDelete,
    Finalize,
    Done,
    Error,
}

impl CascadeStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::Disable => "DISABLE",
            Self::CascadeDelete => "CASCADE_DELETE",
            Self::Finalize => "FINALIZE",
            Self::Done => "DONE",
            Self::Error => "ERROR",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

impl fmt::Display for CascadeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks the stage of one cascade run and logs its transitions.
#[derive(Debug)]
pub struct StageTracker {
    command_id: String,
    target: String,
    stage: CascadeStage,
}

impl StageTracker {
    pub fn new(command_id: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            command_id: command_id.into(),
            target: target.into(),
            stage: CascadeStage::Start,
        }
    }

    pub fn stage(&self) -> CascadeStage {
        self.stage
    }

    fn enter(&mut self, next: CascadeStage) {
        if self.stage == next || self.stage == CascadeStage::Error {
            return;
        }
        tracing::debug!(
            command_id = %self.command_id,
            external_id = %self.target,
            from = %self.stage,
            to = %next,
            "Cascade stage transition"
        );
        self.stage = next;
    }

    /// Run `step` as part of `stage`. A failure moves the run to `ERROR` and
    /// reports the stage it happened in.
    pub async fn within<T, E>(
        &mut self,
        stage: CascadeStage,
        step: impl Future<Output = Result<T, E>>,
    ) -> Result<T, CascadeError>
    where
        E: Into<HandlerError>,
    {
        self.enter(stage);
        match step.await {
            Ok(value) => Ok(value),
            Err(e) => {
                let source = e.into();
                tracing::error!(
                    command_id = %self.command_id,
                    external_id = %self.target,
                    stage = %stage,
                    error = %source,
                    "Cascade step failed"
                );
                self.enter(CascadeStage::Error);
                Err(CascadeError { stage, source })
            }
        }
    }

    pub fn finish(&mut self) {
        self.enter(CascadeStage::Done);
    }
}

/// Outcome of a failed cascade: invalid input keeps its own message, anything
/// else gets the stable per-target message.
pub(crate) fn failure(error: CascadeError, stable_message: String) -> Outcome {
    match error.source {
        HandlerError::Invalid(_) => Outcome::error(error.source.to_string()),
        _ => Outcome::error_at(stable_message, error.stage.as_str()),
    }
}
