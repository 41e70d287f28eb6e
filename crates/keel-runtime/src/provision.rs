//! `PROVISION_CREDENTIAL`: a service account user holding a scoped token.
//!
//! Runs as a saga. Each completed step registers its undo; a failure rolls the
//! completed steps back newest first, so a failed provisioning leaves no
//! half-created user behind.
//!
//! | Step | Undo |
//! |------|------|
//! | create user | delete user |
//! | assign organization role | delete membership |
//! | assign environment role | delete membership |
//! | create token | (last step) |
//!
//! A redelivered command whose user already holds the requested roles and a
//! token of the same name replies `SUCCEEDED` again with the same ids. The
//! token value is not stored in a recoverable form for the reply, so that
//! reply carries no `token`. A user that exists with a different credential
//! is refused.

use crate::error::{HandlerError, SagaError};
use crate::handler::{CommandHandler, unexpected_payload};
use crate::reply::Outcome;
use crate::resolver::TargetResolver;
use crate::saga::{Saga, SagaStep};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use futures::FutureExt;
use keel_audit::AuditLogger;
use keel_core::{
    Capability, Command, CommandPayload, CommandType, CredentialScope, Membership,
    ProvisionCredentialPayload, RoleScope, TargetKind, TargetReference, Token, User,
};
use keel_repository::Repositories;
use rand::RngCore;
use serde_json::json;
use std::fmt;

const CAPABILITIES: &[Capability] = &[
    Capability::Organization,
    Capability::Environment,
    Capability::User,
    Capability::Role,
    Capability::Membership,
    Capability::Token,
];

/// Length of a generated credential, before encoding.
const TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionStep {
    CreateUser,
    AssignOrganizationRole,
    AssignEnvironmentRole,
    CreateToken,
}

impl fmt::Display for ProvisionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CreateUser => "CREATE_USER",
            Self::AssignOrganizationRole => "ASSIGN_ORGANIZATION_ROLE",
            Self::AssignEnvironmentRole => "ASSIGN_ENVIRONMENT_ROLE",
            Self::CreateToken => "CREATE_TOKEN",
        };
        f.write_str(name)
    }
}

impl SagaStep for ProvisionStep {
    fn failure_message(&self) -> &'static str {
        match self {
            Self::CreateUser => "Failed to create user.",
            Self::AssignOrganizationRole => "Failed to assign organization role.",
            Self::AssignEnvironmentRole => "Failed to assign environment role.",
            Self::CreateToken => "Failed to create token.",
        }
    }
}

/// The two role grants a credential is made of, with the reference each one
/// points at.
fn role_grants<'a>(
    scope: CredentialScope,
    organization_id: &'a str,
    environment_id: &'a str,
) -> [(ProvisionStep, RoleScope, &'static str, &'a str); 2] {
    [
        (
            ProvisionStep::AssignOrganizationRole,
            RoleScope::Organization,
            scope.organization_role(),
            organization_id,
        ),
        (
            ProvisionStep::AssignEnvironmentRole,
            RoleScope::Environment,
            scope.environment_role(),
            environment_id,
        ),
    ]
}

/// Resolved targets of a provisioning command.
struct Targets {
    organization: TargetReference,
    environment: TargetReference,
    existing_user: Option<User>,
}

/// A fresh credential value: random bytes, URL-safe base64 without padding.
pub fn generate_token_value() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

pub struct ProvisionCredentialHandler {
    repos: Repositories,
    audit: AuditLogger,
}

impl ProvisionCredentialHandler {
    pub fn new(repos: Repositories, audit: AuditLogger) -> Self {
        Self { repos, audit }
    }

    /// Checks that must pass before anything is written.
    async fn precheck(
        &self,
        payload: &ProvisionCredentialPayload,
    ) -> Result<Targets, HandlerError> {
        let resolver = TargetResolver::new(&self.repos);

        let organization = resolver
            .resolve_organization(&payload.organization_external_id)
            .await?
            .ok_or_else(|| HandlerError::TargetNotFound {
                kind: TargetKind::Organization,
                external_id: payload.organization_external_id.clone(),
            })?;

        let environment = resolver
            .resolve_environment(&payload.environment_external_id)
            .await?
            .filter(|e| e.organization_id.as_deref() == Some(organization.internal_id.as_str()))
            .ok_or_else(|| HandlerError::TargetNotFound {
                kind: TargetKind::Environment,
                external_id: payload.environment_external_id.clone(),
            })?;

        if payload.user_external_id.trim().is_empty() {
            return Err(HandlerError::Invalid("user external id must not be empty".to_string()));
        }
        let existing_user = self
            .repos
            .users
            .find_by_external_id(&organization.internal_id, &payload.user_external_id)
            .await?;

        Ok(Targets {
            organization,
            environment,
            existing_user,
        })
    }

    /// The token of an earlier delivery of the same command, if `user` holds
    /// exactly what `payload` asks for.
    async fn previous_credential(
        &self,
        user: &User,
        payload: &ProvisionCredentialPayload,
        organization_id: &str,
        environment_id: &str,
    ) -> Result<Option<Token>, HandlerError> {
        let memberships = self.repos.memberships.find_by_member(&user.id).await?;
        for (_, scope, name, reference_id) in
            role_grants(payload.scope, organization_id, environment_id)
        {
            let role = self
                .repos
                .roles
                .find_by_scope_and_name(scope, name, organization_id)
                .await?;
            let Some(role) = role else {
                return Ok(None);
            };
            let granted = memberships.iter().any(|m| {
                m.reference_type == scope.reference_type()
                    && m.reference_id == reference_id
                    && m.role_id == role.id
            });
            if !granted {
                return Ok(None);
            }
        }

        let tokens = self.repos.tokens.find_by_user(&user.id).await?;
        Ok(tokens.into_iter().find(|t| t.name == payload.name))
    }

    /// Reply to a command whose user already exists.
    async fn replay(
        &self,
        command: &Command,
        payload: &ProvisionCredentialPayload,
        user: &User,
        organization_id: &str,
        environment_id: &str,
    ) -> Outcome {
        let previous = self
            .previous_credential(user, payload, organization_id, environment_id)
            .await;
        match previous {
            Ok(Some(token)) => {
                tracing::info!(
                    command_id = %command.id,
                    external_id = %payload.user_external_id,
                    user_id = %user.id,
                    token_id = %token.id,
                    "Credential already provisioned"
                );
                Outcome::Ok(Some(json!({
                    "user_id": user.id,
                    "token_id": token.id,
                })))
            }
            Ok(None) => {
                let error = HandlerError::AlreadyProvisioned {
                    external_id: payload.user_external_id.clone(),
                };
                tracing::warn!(
                    command_id = %command.id,
                    external_id = %payload.user_external_id,
                    user_id = %user.id,
                    "Existing user holds a different credential"
                );
                Outcome::error(error.to_string())
            }
            Err(e) => {
                tracing::error!(
                    command_id = %command.id,
                    external_id = %payload.user_external_id,
                    error = %e,
                    "Credential lookup failed"
                );
                Outcome::error(e.to_string())
            }
        }
    }

    async fn assign_role(
        &self,
        user_id: &str,
        organization_id: &str,
        scope: RoleScope,
        name: &str,
        reference_id: &str,
    ) -> Result<Membership, HandlerError> {
        let role = self
            .repos
            .roles
            .find_by_scope_and_name(scope, name, organization_id)
            .await?
            .ok_or_else(|| HandlerError::RoleNotFound {
                scope,
                name: name.to_string(),
                organization_id: organization_id.to_string(),
            })?;
        let membership = Membership::for_user(user_id, scope.reference_type(), reference_id, &role);
        Ok(self.repos.memberships.create(membership).await?)
    }
}

#[async_trait]
impl CommandHandler for ProvisionCredentialHandler {
    fn command_type(&self) -> CommandType {
        CommandType::ProvisionCredential
    }

    fn capabilities(&self) -> &'static [Capability] {
        CAPABILITIES
    }

    async fn handle(&self, command: &Command) -> Outcome {
        let CommandPayload::ProvisionCredential(payload) = &command.payload else {
            return unexpected_payload(CommandType::ProvisionCredential, command);
        };

        let targets = match self.precheck(payload).await {
            Ok(targets) => targets,
            Err(e) => {
                tracing::warn!(
                    command_id = %command.id,
                    external_id = %payload.user_external_id,
                    error = %e,
                    "Credential provisioning refused"
                );
                return Outcome::error(e.to_string());
            }
        };
        let organization_id = targets.organization.internal_id.as_str();
        let environment_id = targets.environment.internal_id.as_str();
        if let Some(user) = &targets.existing_user {
            return self
                .replay(command, payload, user, organization_id, environment_id)
                .await;
        }

        let mut saga = Saga::new(
            &command.id,
            CommandType::ProvisionCredential,
            self.audit.clone(),
        );
        let run = async {
            let user =
                User::service_account(organization_id, &payload.user_external_id, &payload.name);
            let user = saga
                .execute(ProvisionStep::CreateUser, self.repos.users.create(user))
                .await?;
            let users = self.repos.users.clone();
            let user_id = user.id.clone();
            saga.compensate_with(
                ProvisionStep::CreateUser,
                async move { users.delete(&user_id).await }.boxed(),
            );

            for (step, role_scope, role_name, reference_id) in
                role_grants(payload.scope, organization_id, environment_id)
            {
                let assign = self.assign_role(
                    &user.id,
                    organization_id,
                    role_scope,
                    role_name,
                    reference_id,
                );
                let membership = saga.execute(step, assign).await?;
                let memberships = self.repos.memberships.clone();
                saga.compensate_with(
                    step,
                    async move { memberships.delete(&membership.id).await }.boxed(),
                );
            }

            let token = Token::for_user(&user.id, &payload.name, generate_token_value());
            let token = saga
                .execute(ProvisionStep::CreateToken, self.repos.tokens.create(token))
                .await?;
            Ok::<_, SagaError<ProvisionStep>>((user, token))
        };

        let result = run.await;
        match result {
            Ok((user, token)) => {
                saga.complete();
                tracing::info!(
                    command_id = %command.id,
                    external_id = %payload.user_external_id,
                    user_id = %user.id,
                    token_id = %token.id,
                    "Credential provisioned"
                );
                Outcome::Ok(Some(json!({
                    "user_id": user.id,
                    "token_id": token.id,
                    "token": token.token,
                })))
            }
            Err(e) => {
                tracing::error!(
                    command_id = %command.id,
                    external_id = %payload.user_external_id,
                    step = %e.step,
                    compensation_failures = e.compensation_failures,
                    error = %e.source,
                    "Credential provisioning failed"
                );
                Outcome::error_at(e.step.failure_message(), e.step.to_string())
            }
        }
    }
}
