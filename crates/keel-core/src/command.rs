//! Lifecycle commands delivered by the control service.
//!
//! A command is pure data: an identifier chosen by the sender, a type tag and a
//! typed payload. On the wire it looks like:
//!
//! ```json
//! {
//!   "id": "7f0c...",
//!   "type": "DELETE_ENVIRONMENT",
//!   "payload": { "external_id": "env#2", "user_id": "user#1" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type tag of a [`Command`]. Used as the dispatch key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandType {
    DeleteEnvironment,
    DeleteOrganization,
    DeleteUser,
    ProvisionCredential,
}

impl CommandType {
    /// Every command type, in a stable order.
    pub const ALL: [CommandType; 4] = [
        CommandType::DeleteEnvironment,
        CommandType::DeleteOrganization,
        CommandType::DeleteUser,
        CommandType::ProvisionCredential,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DeleteEnvironment => "DELETE_ENVIRONMENT",
            Self::DeleteOrganization => "DELETE_ORGANIZATION",
            Self::DeleteUser => "DELETE_USER",
            Self::ProvisionCredential => "PROVISION_CREDENTIAL",
        }
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lifecycle command. Immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// Unique per command instance, generated by the sender.
    pub id: String,
    #[serde(flatten)]
    pub payload: CommandPayload,
}

impl Command {
    pub fn new(id: impl Into<String>, payload: CommandPayload) -> Self {
        Self {
            id: id.into(),
            payload,
        }
    }

    pub fn command_type(&self) -> CommandType {
        self.payload.command_type()
    }
}

/// Typed payload of a command, tagged by [`CommandType`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandPayload {
    DeleteEnvironment(DeleteEnvironmentPayload),
    DeleteOrganization(DeleteOrganizationPayload),
    DeleteUser(DeleteUserPayload),
    ProvisionCredential(ProvisionCredentialPayload),
}

impl CommandPayload {
    pub fn command_type(&self) -> CommandType {
        match self {
            Self::DeleteEnvironment(_) => CommandType::DeleteEnvironment,
            Self::DeleteOrganization(_) => CommandType::DeleteOrganization,
            Self::DeleteUser(_) => CommandType::DeleteUser,
            Self::ProvisionCredential(_) => CommandType::ProvisionCredential,
        }
    }

    /// External identifier of the entity the command is about.
    pub fn target_external_id(&self) -> &str {
        match self {
            Self::DeleteEnvironment(p) => &p.external_id,
            Self::DeleteOrganization(p) => &p.external_id,
            Self::DeleteUser(p) => &p.user_external_id,
            Self::ProvisionCredential(p) => &p.user_external_id,
        }
    }
}

/// Delete an environment and everything scoped to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteEnvironmentPayload {
    /// Control-plane identifier of the environment.
    pub external_id: String,
    /// User on whose behalf running APIs are stopped.
    pub user_id: String,
}

/// Delete an organization. Refused while the organization still has environments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOrganizationPayload {
    pub external_id: String,
    pub user_id: String,
}

/// Delete a user (typically a service account) together with its tokens and memberships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteUserPayload {
    pub organization_external_id: String,
    pub user_external_id: String,
}

/// Provision a service account user holding a scoped token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionCredentialPayload {
    pub organization_external_id: String,
    pub environment_external_id: String,
    pub user_external_id: String,
    /// Display name, reused as the token name.
    pub name: String,
    pub scope: CredentialScope,
}

/// Declared scope of a provisioned credential. Determines the roles it receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CredentialScope {
    Admin,
    ApiPublisher,
    ReadOnly,
}

impl CredentialScope {
    /// Name of the organization-level role the scope requires.
    pub fn organization_role(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::ApiPublisher | Self::ReadOnly => "USER",
        }
    }

    /// Name of the environment-level role the scope requires.
    pub fn environment_role(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::ApiPublisher => "API_PUBLISHER",
            Self::ReadOnly => "USER",
        }
    }
}
