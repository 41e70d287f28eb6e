//! `DELETE_ORGANIZATION`.
//!
//! Refused while the organization still has environments: those are deleted
//! by their own commands first.

use super::{CascadeStage, StageTracker, failure};
use crate::error::{CascadeError, HandlerError};
use crate::handler::{CommandHandler, unexpected_payload};
use crate::reply::Outcome;
use crate::resolver::TargetResolver;
use async_trait::async_trait;
use keel_core::{Capability, Command, CommandPayload, CommandType, ExecutionContext, ReferenceType};
use keel_repository::Repositories;

const CAPABILITIES: &[Capability] = &[
    Capability::Organization,
    Capability::Environment,
    Capability::AccessPointService,
    Capability::IdentityProviderActivationService,
    Capability::User,
    Capability::Token,
    Capability::Membership,
    Capability::Role,
    Capability::Parameter,
    Capability::CustomUserFields,
    Capability::Flow,
    Capability::IdentityProvider,
    Capability::IdentityProviderActivation,
    Capability::AccessPoint,
    Capability::Tag,
    Capability::Tenant,
    Capability::NotificationTemplate,
    Capability::Command,
    Capability::Audit,
];

pub struct DeleteOrganizationHandler {
    repos: Repositories,
}

impl DeleteOrganizationHandler {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    async fn disable(
        &self,
        ctx: &ExecutionContext,
        organization_id: &str,
    ) -> Result<(), HandlerError> {
        let r = &self.repos;
        r.access_point_service
            .delete_access_points(ReferenceType::Organization, organization_id)
            .await?;
        r.identity_provider_activation_service
            .remove_all_from_target(ctx, organization_id, ReferenceType::Organization)
            .await?;
        Ok(())
    }

    async fn delete_dependents(&self, organization_id: &str) -> Result<(), HandlerError> {
        let r = &self.repos;
        let org = organization_id;
        let by_org = ReferenceType::Organization;

        for user_id in r.users.find_ids_by_organization(org).await? {
            r.tokens.delete_by_reference(&user_id, ReferenceType::User).await?;
            r.memberships.delete_by_member(&user_id).await?;
        }
        r.users.delete_by_organization(org).await?;
        r.memberships.delete_by_reference(org, by_org).await?;
        r.roles.delete_by_reference(org, by_org).await?;
        r.parameters.delete_by_reference(org, by_org).await?;
        r.custom_user_fields.delete_by_reference(org, by_org).await?;
        r.flows.delete_by_reference(org, by_org).await?;
        r.identity_providers.delete_by_reference(org, by_org).await?;
        r.identity_provider_activations.delete_by_reference(org, by_org).await?;
        r.access_points.delete_by_reference(org, by_org).await?;
        r.tags.delete_by_reference(org, by_org).await?;
        r.tenants.delete_by_reference(org, by_org).await?;
        r.notification_templates.delete_by_reference(org, by_org).await?;
        r.commands.delete_by_reference(org, by_org).await?;
        r.audits.delete_by_reference(org, by_org).await?;
        Ok(())
    }
}

#[async_trait]
impl CommandHandler for DeleteOrganizationHandler {
    fn command_type(&self) -> CommandType {
        CommandType::DeleteOrganization
    }

    fn capabilities(&self) -> &'static [Capability] {
        CAPABILITIES
    }

    async fn handle(&self, command: &Command) -> Outcome {
        let CommandPayload::DeleteOrganization(payload) = &command.payload else {
            return unexpected_payload(CommandType::DeleteOrganization, command);
        };
        let external_id = payload.external_id.as_str();
        let failed =
            || format!("Error occurred when deleting organization with id [{external_id}].");
        let mut tracker = StageTracker::new(&command.id, external_id);

        let resolved = tracker
            .within(
                CascadeStage::Start,
                TargetResolver::new(&self.repos).resolve_organization(external_id),
            )
            .await;
        let target = match resolved {
            Ok(Some(target)) => target,
            Ok(None) => {
                tracing::info!(
                    command_id = %command.id,
                    external_id,
                    "Organization not found, nothing to delete"
                );
                return Outcome::NotFoundTreatedAsOk;
            }
            Err(e) => return failure(e, failed()),
        };
        let organization_id = target.internal_id.as_str();

        let environments = match tracker
            .within(
                CascadeStage::Start,
                self.repos.environments.find_by_organization(organization_id),
            )
            .await
        {
            Ok(environments) => environments,
            Err(e) => return failure(e, failed()),
        };
        if !environments.is_empty() {
            tracing::warn!(
                command_id = %command.id,
                external_id,
                environments = environments.len(),
                "Refusing to delete a non-empty organization"
            );
            return Outcome::error_at(
                format!(
                    "Organization [{external_id}] still contains {} environment(s).",
                    environments.len()
                ),
                CascadeStage::Start.as_str(),
            );
        }

        tracing::info!(
            command_id = %command.id,
            external_id,
            organization_id,
            "Deleting organization"
        );
        let ctx = target.context();
        let run = async {
            tracker
                .within(CascadeStage::Disable, self.disable(&ctx, organization_id))
                .await?;
            tracker
                .within(CascadeStage::CascadeDelete, self.delete_dependents(organization_id))
                .await?;
            tracker
                .within(CascadeStage::Finalize, self.repos.organizations.delete(organization_id))
                .await?;
            tracker.finish();
            Ok::<(), CascadeError>(())
        };

        match run.await {
            Ok(()) => {
                tracing::info!(command_id = %command.id, external_id, "Organization deleted");
                Outcome::ok()
            }
            Err(e) => failure(e, failed()),
        }
    }
}
