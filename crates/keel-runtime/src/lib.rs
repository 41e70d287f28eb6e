//! # keel-runtime
//!
//! The Keel engine: turns lifecycle commands into ordered calls against the
//! collaborators in [`keel_repository::Repositories`] and exactly one reply
//! per command.
//!
//! ## Flow
//!
//! ```text
//! Command ─► DispatchRegistry ─► CommandHandler ─► Outcome ─► build_reply ─► Reply
//!                                   │
//!                                   ├─ cascade: START → DISABLE → CASCADE_DELETE → FINALIZE → DONE
//!                                   └─ saga: forward steps, reverse compensation on failure
//! ```
//!
//! Delete commands are cascades. A missing target is already deleted and
//! replies `SUCCEEDED`, so re-delivery is safe. Creation commands are sagas.
//!
//! The [`ConsistencyAudit`] checks that every [`keel_core::Capability`] is
//! declared by some handler or explicitly exempt; the [`CommandWorker`] refuses
//! to start otherwise.

pub mod cascade;
pub mod consistency;
pub mod error;
pub mod handler;
pub mod provision;
pub mod registry;
pub mod reply;
pub mod resolver;
pub mod saga;
pub mod worker;

pub use cascade::{
    CascadeStage, DeleteEnvironmentHandler, DeleteOrganizationHandler, DeleteUserHandler,
    EnvironmentCascade, StageTracker,
};
pub use consistency::{ConsistencyAudit, ConsistencyReport, EXEMPTIONS};
pub use error::{CascadeError, ConsistencyError, HandlerError, SagaError};
pub use handler::CommandHandler;
pub use provision::{ProvisionCredentialHandler, ProvisionStep, generate_token_value};
pub use registry::{DispatchRegistry, UNEXPECTED_ERROR};
pub use reply::{Failure, Outcome, build_reply};
pub use resolver::TargetResolver;
pub use saga::{Compensation, Saga, SagaStep};
pub use worker::CommandWorker;
