//! Seed data for [`MemoryStore`](super::MemoryStore).
//!
//! Records with behaviour the engine relies on (organizations, APIs, roles,
//! ...) have dedicated typed lists. Every other capability is a bag of
//! [`Record`]s keyed by its snake_case name:
//!
//! ```yaml
//! organizations:
//!   - { id: org#1, external_id: cockpit-org }
//! environments:
//!   - { id: env#2, external_id: cockpit-env, organization_id: org#1 }
//! records:
//!   application:
//!     - { id: app#1, environment_id: env#2 }
//!   page:
//!     - { id: page#1, reference_type: ENVIRONMENT, reference_id: env#2 }
//! ```

use keel_core::{
    Alert, Api, Capability, Dictionary, Environment, Membership, Organization, ReferenceType, Role,
    SearchDocument, Token, User,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Capabilities backed by a typed list rather than generic records.
pub const TYPED_CAPABILITIES: [Capability; 9] = [
    Capability::Organization,
    Capability::Environment,
    Capability::Api,
    Capability::Dictionary,
    Capability::User,
    Capability::Role,
    Capability::Membership,
    Capability::Token,
    Capability::AlertTrigger,
];

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("'{0}' records must be declared in their typed list")]
    TypedCapability(Capability),

    #[error("'{0}' is a service and holds no records")]
    ServiceCapability(Capability),
}

/// A record of a capability without a dedicated type.
///
/// Only the keys the engine deletes by are modelled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_type: Option<ReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn in_environment(mut self, environment_id: impl Into<String>) -> Self {
        self.environment_id = Some(environment_id.into());
        self
    }

    pub fn referencing(
        mut self,
        reference_type: ReferenceType,
        reference_id: impl Into<String>,
    ) -> Self {
        self.reference_type = Some(reference_type);
        self.reference_id = Some(reference_id.into());
        self
    }

    pub fn child_of(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn references(&self, reference_type: ReferenceType, reference_id: &str) -> bool {
        self.reference_type == Some(reference_type)
            && self.reference_id.as_deref() == Some(reference_id)
    }
}

/// Full content of a memory store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreFixture {
    pub organizations: Vec<Organization>,
    pub environments: Vec<Environment>,
    pub apis: Vec<Api>,
    pub dictionaries: Vec<Dictionary>,
    pub users: Vec<User>,
    pub roles: Vec<Role>,
    pub memberships: Vec<Membership>,
    pub tokens: Vec<Token>,
    pub alerts: Vec<Alert>,
    pub search_documents: Vec<SearchDocument>,
    pub records: BTreeMap<Capability, Vec<Record>>,
}

impl StoreFixture {
    pub fn from_yaml(content: &str) -> Result<Self, FixtureError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let fixture: Self = serde_yaml::from_str(content)?;
        fixture.validate()?;
        Ok(fixture)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Reject generic records declared for typed or service capabilities.
    pub fn validate(&self) -> Result<(), FixtureError> {
        for capability in self.records.keys() {
            if TYPED_CAPABILITIES.contains(capability) {
                return Err(FixtureError::TypedCapability(*capability));
            }
            if capability.kind() == keel_core::CapabilityKind::Service {
                return Err(FixtureError::ServiceCapability(*capability));
            }
        }
        Ok(())
    }

    pub fn record(mut self, capability: Capability, record: Record) -> Self {
        self.records.entry(capability).or_default().push(record);
        self
    }
}
