//! Persisted records the engine reads and writes through repositories.
//!
//! These are plain data holders. Only the fields the orchestration needs are
//! modelled; storage engines may keep more.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Kind of parent a reference-scoped record hangs off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferenceType {
    Organization,
    Environment,
    Api,
    Application,
    Group,
    Plan,
    Portal,
    User,
}

impl fmt::Display for ReferenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Organization => "ORGANIZATION",
            Self::Environment => "ENVIRONMENT",
            Self::Api => "API",
            Self::Application => "APPLICATION",
            Self::Group => "GROUP",
            Self::Plan => "PLAN",
            Self::Portal => "PORTAL",
            Self::User => "USER",
        };
        f.write_str(name)
    }
}

/// Scope a role applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleScope {
    Organization,
    Environment,
}

impl RoleScope {
    /// Reference type a membership for a role of this scope points at.
    pub fn reference_type(&self) -> ReferenceType {
        match self {
            Self::Organization => ReferenceType::Organization,
            Self::Environment => ReferenceType::Environment,
        }
    }
}

impl fmt::Display for RoleScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Organization => write!(f, "ORGANIZATION"),
            Self::Environment => write!(f, "ENVIRONMENT"),
        }
    }
}

/// Runtime state of a deployable component (API, dictionary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleState {
    Started,
    #[default]
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    /// Identifier used by the control service.
    pub external_id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub id: String,
    pub external_id: String,
    pub organization_id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Api {
    pub id: String,
    pub environment_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub lifecycle_state: LifecycleState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dictionary {
    pub id: String,
    pub environment_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub state: LifecycleState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub organization_id: String,
    /// Identifier of the user in the control service.
    pub external_id: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl User {
    /// A new service account user scoped to an organization.
    pub fn service_account(
        organization_id: impl Into<String>,
        external_id: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            organization_id: organization_id.into(),
            external_id: external_id.into(),
            source: "service_account".to_string(),
            display_name: display_name.into(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    /// Holder of the role definition. Built-in roles are held by the
    /// organization whatever their scope.
    pub reference_id: String,
    pub reference_type: ReferenceType,
    pub scope: RoleScope,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberType {
    #[default]
    User,
    Group,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub id: String,
    pub member_id: String,
    #[serde(default)]
    pub member_type: MemberType,
    pub reference_id: String,
    pub reference_type: ReferenceType,
    pub role_id: String,
}

impl Membership {
    /// Grant `role` to a user on the given reference.
    pub fn for_user(
        user_id: impl Into<String>,
        reference_type: ReferenceType,
        reference_id: impl Into<String>,
        role: &Role,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            member_id: user_id.into(),
            member_type: MemberType::User,
            reference_id: reference_id.into(),
            reference_type,
            role_id: role.id.clone(),
        }
    }
}

/// A personal access token bound to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub id: String,
    pub name: String,
    /// Credential value handed to the caller.
    pub token: String,
    pub reference_id: String,
    pub reference_type: ReferenceType,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Token {
    pub fn for_user(
        user_id: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            token: value.into(),
            reference_id: user_id.into(),
            reference_type: ReferenceType::User,
            created_at: Utc::now(),
        }
    }
}

/// An alert trigger attached to an environment, API or application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub reference_type: ReferenceType,
    pub reference_id: String,
    #[serde(default)]
    pub name: String,
}

/// Document held by the search index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum SearchDocument {
    Api(String),
    Page(String),
}

impl SearchDocument {
    pub fn id(&self) -> &str {
        match self {
            Self::Api(id) | Self::Page(id) => id,
        }
    }
}
