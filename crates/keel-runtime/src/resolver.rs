//! Resolving control-plane identifiers to internal records.
//!
//! A missing target is `Ok(None)`; what that means is up to the caller.

use crate::error::HandlerError;
use keel_core::{TargetKind, TargetReference};
use keel_repository::Repositories;

pub struct TargetResolver<'a> {
    repos: &'a Repositories,
}

fn require(field: &str, value: &str) -> Result<(), HandlerError> {
    if value.trim().is_empty() {
        return Err(HandlerError::Invalid(format!("{field} must not be empty")));
    }
    Ok(())
}

impl<'a> TargetResolver<'a> {
    pub fn new(repos: &'a Repositories) -> Self {
        Self { repos }
    }

    pub async fn resolve_organization(
        &self,
        external_id: &str,
    ) -> Result<Option<TargetReference>, HandlerError> {
        require("organization external id", external_id)?;
        let organization = self.repos.organizations.find_by_external_id(external_id).await?;
        Ok(organization.map(|o| TargetReference {
            kind: TargetKind::Organization,
            external_id: o.external_id,
            internal_id: o.id,
            organization_id: None,
        }))
    }

    pub async fn resolve_environment(
        &self,
        external_id: &str,
    ) -> Result<Option<TargetReference>, HandlerError> {
        require("environment external id", external_id)?;
        let environment = self.repos.environments.find_by_external_id(external_id).await?;
        Ok(environment.map(|e| TargetReference {
            kind: TargetKind::Environment,
            external_id: e.external_id,
            internal_id: e.id,
            organization_id: Some(e.organization_id),
        }))
    }

    /// Resolve the organization, then the user inside it.
    pub async fn resolve_user(
        &self,
        organization_external_id: &str,
        user_external_id: &str,
    ) -> Result<Option<TargetReference>, HandlerError> {
        require("user external id", user_external_id)?;
        let Some(organization) = self.resolve_organization(organization_external_id).await? else {
            return Ok(None);
        };
        let user = self
            .repos
            .users
            .find_by_external_id(&organization.internal_id, user_external_id)
            .await?;
        Ok(user.map(|u| TargetReference {
            kind: TargetKind::User,
            external_id: u.external_id,
            internal_id: u.id,
            organization_id: Some(organization.internal_id),
        }))
    }
}
