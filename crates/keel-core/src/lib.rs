//! # keel-core
//!
//! Shared types for the Keel command orchestration engine.
//!
//! - [`Command`] / [`Reply`]: the inbound lifecycle command and the single reply it produces
//! - [`TargetReference`] / [`ExecutionContext`]: resolved identities, passed explicitly
//!   down the call chain
//! - Persisted records ([`model`]) and the closed [`Capability`] table of storage collaborators
//! - [`KeelConfig`]: YAML configuration shared by the runtime and the CLI

pub mod capability;
pub mod command;
pub mod config;
pub mod model;
pub mod reply;
pub mod target;

pub use capability::{Capability, CapabilityKind};
pub use command::{
    Command, CommandPayload, CommandType, CredentialScope, DeleteEnvironmentPayload,
    DeleteOrganizationPayload, DeleteUserPayload, ProvisionCredentialPayload,
};
pub use config::{AuditConfig, ConfigError, KeelConfig, ObservabilityConfig, RuntimeConfig};
pub use model::{
    Alert, Api, Dictionary, Environment, LifecycleState, Membership, MemberType, Organization,
    ReferenceType, Role, RoleScope, SearchDocument, Token, User,
};
pub use reply::{CommandStatus, Reply};
pub use target::{ExecutionContext, TargetKind, TargetReference};
