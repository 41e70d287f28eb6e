//! Resolved targets and the explicit execution context.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of entity a command targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Organization,
    Environment,
    User,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Organization => write!(f, "Organization"),
            Self::Environment => write!(f, "Environment"),
            Self::User => write!(f, "User"),
        }
    }
}

/// Internal identity of a command's external identifier.
///
/// Built per invocation and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetReference {
    pub kind: TargetKind,
    pub external_id: String,
    pub internal_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
}

impl TargetReference {
    /// Execution context scoped to this target.
    pub fn context(&self) -> ExecutionContext {
        match self.kind {
            TargetKind::Environment => ExecutionContext {
                organization_id: self.organization_id.clone(),
                environment_id: Some(self.internal_id.clone()),
            },
            TargetKind::Organization => ExecutionContext::organization(&self.internal_id),
            TargetKind::User => ExecutionContext {
                organization_id: self.organization_id.clone(),
                environment_id: None,
            },
        }
    }
}

/// Organization / environment identifiers carried through a call chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutionContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_id: Option<String>,
}

impl ExecutionContext {
    pub fn new(organization_id: impl Into<String>, environment_id: impl Into<String>) -> Self {
        Self {
            organization_id: Some(organization_id.into()),
            environment_id: Some(environment_id.into()),
        }
    }

    pub fn organization(organization_id: impl Into<String>) -> Self {
        Self {
            organization_id: Some(organization_id.into()),
            environment_id: None,
        }
    }
}
