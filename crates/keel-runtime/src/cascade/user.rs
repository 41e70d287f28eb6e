//! `DELETE_USER`: the inverse of credential provisioning.

use super::{CascadeStage, StageTracker, failure};
use crate::error::{CascadeError, HandlerError};
use crate::handler::{CommandHandler, unexpected_payload};
use crate::reply::Outcome;
use crate::resolver::TargetResolver;
use async_trait::async_trait;
use keel_core::{Capability, Command, CommandPayload, CommandType, ReferenceType};
use keel_repository::Repositories;

const CAPABILITIES: &[Capability] = &[
    Capability::Organization,
    Capability::User,
    Capability::Token,
    Capability::Membership,
];

pub struct DeleteUserHandler {
    repos: Repositories,
}

impl DeleteUserHandler {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    async fn delete_dependents(&self, user_id: &str) -> Result<(), HandlerError> {
        self.repos.tokens.delete_by_reference(user_id, ReferenceType::User).await?;
        self.repos.memberships.delete_by_member(user_id).await?;
        Ok(())
    }
}

#[async_trait]
impl CommandHandler for DeleteUserHandler {
    fn command_type(&self) -> CommandType {
        CommandType::DeleteUser
    }

    fn capabilities(&self) -> &'static [Capability] {
        CAPABILITIES
    }

    async fn handle(&self, command: &Command) -> Outcome {
        let CommandPayload::DeleteUser(payload) = &command.payload else {
            return unexpected_payload(CommandType::DeleteUser, command);
        };
        let external_id = payload.user_external_id.as_str();
        let failed = || format!("Error occurred when deleting user with id [{external_id}].");
        let mut tracker = StageTracker::new(&command.id, external_id);

        let resolved = tracker
            .within(
                CascadeStage::Start,
                TargetResolver::new(&self.repos)
                    .resolve_user(&payload.organization_external_id, external_id),
            )
            .await;
        let user_id = match resolved {
            Ok(Some(target)) => target.internal_id,
            Ok(None) => {
                tracing::info!(
                    command_id = %command.id,
                    organization = %payload.organization_external_id,
                    external_id,
                    "User not found, nothing to delete"
                );
                return Outcome::NotFoundTreatedAsOk;
            }
            Err(e) => return failure(e, failed()),
        };

        let run = async {
            tracker
                .within(CascadeStage::CascadeDelete, self.delete_dependents(&user_id))
                .await?;
            tracker
                .within(CascadeStage::Finalize, self.repos.users.delete(&user_id))
                .await?;
            tracker.finish();
            Ok::<(), CascadeError>(())
        };

        match run.await {
            Ok(()) => {
                tracing::info!(command_id = %command.id, external_id, "User deleted");
                Outcome::ok()
            }
            Err(e) => failure(e, failed()),
        }
    }
}
