//! Error types for the runtime crate.

use crate::cascade::CascadeStage;
use keel_core::{Capability, RoleScope, TargetKind};
use keel_repository::RepositoryError;
use thiserror::Error;

/// Failure inside a handler, before it is turned into a reply.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The command is malformed (e.g. an empty external identifier).
    #[error("Invalid command: {0}")]
    Invalid(String),

    /// A target a creation flow depends on does not exist.
    #[error("{kind} [{external_id}] not found.")]
    TargetNotFound { kind: TargetKind, external_id: String },

    /// The user exists but does not hold the requested credential.
    #[error("A credential has already been provisioned for user [{external_id}].")]
    AlreadyProvisioned { external_id: String },

    /// The role a credential scope requires is not defined.
    #[error("{scope} role [{name}] is not defined in organization [{organization_id}]")]
    RoleNotFound {
        scope: RoleScope,
        name: String,
        organization_id: String,
    },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// A cascade step failed. Steps before it stay applied.
#[derive(Debug, Error)]
#[error("cascade failed during {stage}: {source}")]
pub struct CascadeError {
    /// Stage the cascade was in when the step failed.
    pub stage: CascadeStage,
    #[source]
    pub source: HandlerError,
}

/// A saga step failed. Compensations have already run.
#[derive(Debug, Error)]
#[error("saga step {step} failed: {source}")]
pub struct SagaError<S: std::fmt::Display + std::fmt::Debug> {
    pub step: S,
    #[source]
    pub source: HandlerError,
    /// Compensations that failed during the rollback.
    pub compensation_failures: usize,
}

/// The consistency audit found capabilities no handler owns.
#[derive(Debug, Error)]
pub enum ConsistencyError {
    #[error("capabilities referenced by no handler and not exempt: {}", names(.orphaned))]
    Orphaned { orphaned: Vec<Capability> },

    #[error("exempt capabilities also referenced by a handler: {}", names(.stale))]
    StaleExemptions { stale: Vec<Capability> },
}

fn names(capabilities: &[Capability]) -> String {
    capabilities
        .iter()
        .map(Capability::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
