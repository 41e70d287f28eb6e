//! `DELETE_ENVIRONMENT`.

use super::{CascadeStage, StageTracker, failure};
use crate::error::{CascadeError, HandlerError};
use crate::handler::{CommandHandler, unexpected_payload};
use crate::reply::Outcome;
use crate::resolver::TargetResolver;
use async_trait::async_trait;
use futures::future::try_join_all;
use keel_core::{
    Capability, Command, CommandPayload, CommandType, ExecutionContext, ReferenceType,
    SearchDocument, TargetReference,
};
use keel_repository::Repositories;

const CAPABILITIES: &[Capability] = &[
    Capability::Environment,
    Capability::Api,
    Capability::Page,
    Capability::PageRevision,
    Capability::ApiCategoryOrder,
    Capability::ApiQualityRule,
    Capability::Audit,
    Capability::Flow,
    Capability::GenericNotificationConfig,
    Capability::Invitation,
    Capability::Media,
    Capability::Membership,
    Capability::Metadata,
    Capability::PortalNotificationConfig,
    Capability::ScoringReport,
    Capability::Workflow,
    Capability::Rating,
    Capability::RatingAnswer,
    Capability::Application,
    Capability::Subscription,
    Capability::ApiKey,
    Capability::Plan,
    Capability::ApiHeader,
    Capability::AccessPoint,
    Capability::Parameter,
    Capability::PortalMenuLink,
    Capability::CustomUserFields,
    Capability::Group,
    Capability::Role,
    Capability::Category,
    Capability::Dashboard,
    Capability::Dictionary,
    Capability::ScoringRuleset,
    Capability::SharedPolicyGroup,
    Capability::SharedPolicyGroupHistory,
    Capability::Theme,
    Capability::IdentityProviderActivation,
    Capability::Command,
    Capability::Integration,
    Capability::AsyncJob,
    Capability::ApiStateService,
    Capability::AccessPointService,
    Capability::DictionaryService,
    Capability::IdentityProviderActivationService,
    Capability::AlertService,
    Capability::EventService,
    Capability::SearchEngineService,
    Capability::ApplicationAlertService,
];

/// Deletes one resolved environment and everything scoped to it.
pub struct EnvironmentCascade<'a> {
    repos: &'a Repositories,
    ctx: ExecutionContext,
    environment_id: String,
    user_id: String,
    parallel_subcascades: bool,
}

type StepResult = Result<(), HandlerError>;

impl<'a> EnvironmentCascade<'a> {
    pub fn new(
        repos: &'a Repositories,
        target: &TargetReference,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            repos,
            ctx: target.context(),
            environment_id: target.internal_id.clone(),
            user_id: user_id.into(),
            parallel_subcascades: false,
        }
    }

    /// Run per-API and per-application sub-cascades concurrently.
    pub fn parallel_subcascades(mut self, enabled: bool) -> Self {
        self.parallel_subcascades = enabled;
        self
    }

    pub async fn run(&self, tracker: &mut StageTracker) -> Result<(), CascadeError> {
        tracker.within(CascadeStage::Disable, self.disable()).await?;
        tracker.within(CascadeStage::CascadeDelete, self.delete_dependents()).await?;
        tracker
            .within(CascadeStage::Finalize, self.repos.environments.delete(&self.environment_id))
            .await?;
        tracker.finish();
        Ok(())
    }

    async fn disable(&self) -> StepResult {
        let r = self.repos;
        let env = self.environment_id.as_str();

        for api in r.apis.find_started_by_environment(env).await? {
            tracing::debug!(api_id = %api.id, "Stopping API");
            r.api_state.stop(&self.ctx, &api.id, &self.user_id).await?;
        }
        r.access_point_service
            .delete_access_points(ReferenceType::Environment, env)
            .await?;
        for dictionary in r.dictionary_service.find_all(&self.ctx).await? {
            r.dictionary_service.stop(&self.ctx, &dictionary.id).await?;
        }
        r.identity_provider_activation_service
            .remove_all_from_target(&self.ctx, env, ReferenceType::Environment)
            .await?;
        Ok(())
    }

    async fn delete_dependents(&self) -> StepResult {
        let r = self.repos;
        let env = self.environment_id.as_str();
        let by_env = ReferenceType::Environment;

        // Children before parents: a rerun after a partial failure must still
        // find the parents whose children were not all deleted.
        let api_ids = r.apis.find_ids_by_environment(env).await?;
        if self.parallel_subcascades {
            try_join_all(api_ids.iter().map(|id| self.delete_api(id))).await?;
        } else {
            for id in &api_ids {
                self.delete_api(id).await?;
            }
        }
        r.apis.delete_by_environment(env).await?;

        let application_ids = r.applications.find_ids_by_environment(env).await?;
        if self.parallel_subcascades {
            try_join_all(application_ids.iter().map(|id| self.delete_application(id))).await?;
        } else {
            for id in &application_ids {
                self.delete_application(id).await?;
            }
        }
        r.applications.delete_by_environment(env).await?;

        self.delete_pages(env, by_env).await?;
        r.subscriptions.delete_by_environment(env).await?;
        r.api_keys.delete_by_environment(env).await?;
        for plan_id in r.plans.find_ids_by_environment(env).await? {
            r.flows.delete_by_reference(&plan_id, ReferenceType::Plan).await?;
        }
        r.plans.delete_by_environment(env).await?;
        for alert in r.alert_service.find_by_reference(by_env, env).await? {
            r.alert_service.delete(&alert.id, env).await?;
        }
        r.api_headers.delete_by_environment(env).await?;
        r.access_points.delete_by_reference(env, by_env).await?;
        r.parameters.delete_by_reference(env, by_env).await?;
        r.audits.delete_by_reference(env, by_env).await?;
        r.portal_menu_links.delete_by_environment(env).await?;
        r.custom_user_fields.delete_by_reference(env, by_env).await?;
        for group_id in r.groups.find_ids_by_environment(env).await? {
            r.memberships.delete_by_reference(&group_id, ReferenceType::Group).await?;
            r.invitations.delete_by_reference(&group_id, ReferenceType::Group).await?;
        }
        r.groups.delete_by_environment(env).await?;
        r.memberships.delete_by_reference(env, by_env).await?;
        r.roles.delete_by_reference(env, by_env).await?;
        r.categories.delete_by_environment(env).await?;
        r.dashboards.delete_by_reference(env, by_env).await?;
        r.dictionaries.delete_by_environment(env).await?;
        r.event_service.delete_or_update_events_by_environment(env).await?;
        r.scoring_rulesets.delete_by_reference(env, by_env).await?;
        r.portal_notification_configs.delete_by_reference(env, by_env).await?;
        r.generic_notification_configs.delete_by_reference(env, by_env).await?;
        r.shared_policy_groups.delete_by_environment(env).await?;
        r.shared_policy_group_history.delete_by_environment(env).await?;
        r.themes.delete_by_reference(env, by_env).await?;
        r.identity_provider_activations.delete_by_reference(env, by_env).await?;
        r.commands.delete_by_environment(env).await?;
        r.integrations.delete_by_environment(env).await?;
        r.async_jobs.delete_by_environment(env).await?;
        r.media.delete_by_environment(env).await?;
        r.metadata.delete_by_reference(env, by_env).await?;
        Ok(())
    }

    async fn delete_api(&self, api_id: &str) -> StepResult {
        let r = self.repos;
        let by_api = ReferenceType::Api;
        tracing::debug!(api_id, "Deleting API dependents");

        for alert in r.alert_service.find_by_reference(by_api, api_id).await? {
            r.alert_service.delete(&alert.id, api_id).await?;
        }
        r.event_service.delete_api_events(api_id).await?;
        r.search_engine
            .delete(&self.ctx, SearchDocument::Api(api_id.to_string()))
            .await?;
        self.delete_pages(api_id, by_api).await?;
        r.api_category_orders.delete_by_parent(api_id).await?;
        r.api_quality_rules.delete_by_parent(api_id).await?;
        r.audits.delete_by_reference(api_id, by_api).await?;
        r.flows.delete_by_reference(api_id, by_api).await?;
        r.generic_notification_configs.delete_by_reference(api_id, by_api).await?;
        r.invitations.delete_by_reference(api_id, by_api).await?;
        r.media.delete_by_parent(api_id).await?;
        r.memberships.delete_by_reference(api_id, by_api).await?;
        r.metadata.delete_by_reference(api_id, by_api).await?;
        r.portal_notification_configs.delete_by_reference(api_id, by_api).await?;
        r.scoring_reports.delete_by_parent(api_id).await?;
        r.workflows.delete_by_reference(api_id, by_api).await?;
        for rating_id in r.ratings.find_ids_by_reference(api_id, by_api).await? {
            r.rating_answers.delete_by_parent(&rating_id).await?;
        }
        r.ratings.delete_by_reference(api_id, by_api).await?;
        Ok(())
    }

    async fn delete_application(&self, application_id: &str) -> StepResult {
        let r = self.repos;
        let by_app = ReferenceType::Application;
        tracing::debug!(application_id, "Deleting application dependents");

        r.application_alert_service.delete_all(application_id).await?;
        r.generic_notification_configs.delete_by_reference(application_id, by_app).await?;
        r.invitations.delete_by_reference(application_id, by_app).await?;
        r.memberships.delete_by_reference(application_id, by_app).await?;
        r.metadata.delete_by_reference(application_id, by_app).await?;
        r.portal_notification_configs.delete_by_reference(application_id, by_app).await?;
        r.workflows.delete_by_reference(application_id, by_app).await?;
        r.audits.delete_by_reference(application_id, by_app).await?;
        Ok(())
    }

    async fn delete_pages(&self, reference_id: &str, reference_type: ReferenceType) -> StepResult {
        let r = self.repos;
        for page_id in r.pages.find_ids_by_reference(reference_id, reference_type).await? {
            r.search_engine
                .delete(&self.ctx, SearchDocument::Page(page_id.clone()))
                .await?;
            r.page_revisions.delete_by_parent(&page_id).await?;
        }
        r.pages.delete_by_reference(reference_id, reference_type).await?;
        Ok(())
    }
}

pub struct DeleteEnvironmentHandler {
    repos: Repositories,
    parallel_subcascades: bool,
}

impl DeleteEnvironmentHandler {
    pub fn new(repos: Repositories) -> Self {
        Self {
            repos,
            parallel_subcascades: false,
        }
    }

    pub fn with_parallel_subcascades(mut self, enabled: bool) -> Self {
        self.parallel_subcascades = enabled;
        self
    }
}

#[async_trait]
impl CommandHandler for DeleteEnvironmentHandler {
    fn command_type(&self) -> CommandType {
        CommandType::DeleteEnvironment
    }

    fn capabilities(&self) -> &'static [Capability] {
        CAPABILITIES
    }

    async fn handle(&self, command: &Command) -> Outcome {
        let CommandPayload::DeleteEnvironment(payload) = &command.payload else {
            return unexpected_payload(CommandType::DeleteEnvironment, command);
        };
        let failed = || {
            format!(
                "Error occurred when deleting environment with id [{}].",
                payload.external_id
            )
        };
        let mut tracker = StageTracker::new(&command.id, &payload.external_id);

        let resolved = tracker
            .within(
                CascadeStage::Start,
                TargetResolver::new(&self.repos).resolve_environment(&payload.external_id),
            )
            .await;
        let target = match resolved {
            Ok(Some(target)) => target,
            Ok(None) => {
                tracing::info!(
                    command_id = %command.id,
                    external_id = %payload.external_id,
                    "Environment not found, nothing to delete"
                );
                return Outcome::NotFoundTreatedAsOk;
            }
            Err(e) => return failure(e, failed()),
        };

        tracing::info!(
            command_id = %command.id,
            external_id = %payload.external_id,
            environment_id = %target.internal_id,
            "Deleting environment"
        );
        let cascade = EnvironmentCascade::new(&self.repos, &target, &payload.user_id)
            .parallel_subcascades(self.parallel_subcascades);

        match cascade.run(&mut tracker).await {
            Ok(()) => {
                tracing::info!(
                    command_id = %command.id,
                    external_id = %payload.external_id,
                    "Environment deleted"
                );
                Outcome::ok()
            }
            Err(e) => failure(e, failed()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_core::{Api, DeleteEnvironmentPayload, Environment, LifecycleState, Organization};
    use keel_repository::{MemoryStore, Record, StoreFixture};
    use pretty_assertions::assert_eq;

    fn store() -> MemoryStore {
        MemoryStore::from_fixture(
            StoreFixture {
                organizations: vec![Organization {
                    id: "org#1".to_string(),
                    external_id: "cockpit-org".to_string(),
                    name: String::new(),
                }],
                environments: vec![Environment {
                    id: "env#1".to_string(),
                    external_id: "cockpit-env".to_string(),
                    organization_id: "org#1".to_string(),
                    name: String::new(),
                }],
                apis: vec![Api {
                    id: "api#1".to_string(),
                    environment_id: "env#1".to_string(),
                    name: "Echo".to_string(),
                    lifecycle_state: LifecycleState::Started,
                }],
                ..Default::default()
            }
            .record(
                Capability::Page,
                Record::new("page#1").referencing(ReferenceType::Api, "api#1"),
            )
            .record(Capability::PageRevision, Record::new("rev#1").child_of("page#1"))
            .record(Capability::Plan, Record::new("plan#1").in_environment("env#1"))
            .record(
                Capability::Flow,
                Record::new("flow#1").referencing(ReferenceType::Plan, "plan#1"),
            ),
        )
    }

    fn command(external_id: &str) -> Command {
        Command::new(
            "cmd-1",
            CommandPayload::DeleteEnvironment(DeleteEnvironmentPayload {
                external_id: external_id.to_string(),
                user_id: "user#1".to_string(),
            }),
        )
    }

    #[tokio::test]
    async fn test_cascade_follows_dependents() {
        let store = store();
        let handler = DeleteEnvironmentHandler::new(store.repositories());

        let outcome = handler.handle(&command("cockpit-env")).await;
        assert_eq!(outcome, Outcome::ok());

        assert!(store.was_called(Capability::ApiStateService, "stop", "api#1"));
        assert!(store.was_called(Capability::PageRevision, "delete_by_parent", "page#1"));
        assert!(store.was_called(Capability::Flow, "delete_by_reference", "PLAN:plan#1"));
        assert_eq!(store.count(Capability::Environment), 0);
        assert_eq!(store.count(Capability::Page), 0);
        assert_eq!(store.count(Capability::Flow), 0);
    }

    #[tokio::test]
    async fn test_disable_runs_before_deletion() {
        let store = store();
        DeleteEnvironmentHandler::new(store.repositories())
            .handle(&command("cockpit-env"))
            .await;

        let journal = store.journal();
        let position = |capability: Capability, operation: &str| {
            journal
                .iter()
                .position(|e| e.capability == capability && e.operation == operation)
                .unwrap()
        };
        let delete_apis = position(Capability::Api, "delete_by_environment");
        assert!(position(Capability::ApiStateService, "stop") < delete_apis);
        assert!(delete_apis < position(Capability::Environment, "delete"));
        assert_eq!(journal.last().unwrap().capability, Capability::Environment);
    }

    #[tokio::test]
    async fn test_parallel_subcascades_reach_same_state() {
        let sequential = store();
        let parallel = store();

        DeleteEnvironmentHandler::new(sequential.repositories())
            .handle(&command("cockpit-env"))
            .await;
        DeleteEnvironmentHandler::new(parallel.repositories())
            .with_parallel_subcascades(true)
            .handle(&command("cockpit-env"))
            .await;

        for capability in Capability::ALL {
            assert_eq!(sequential.count(capability), parallel.count(capability), "{capability:?}");
        }
        assert_eq!(sequential.touched_capabilities(), parallel.touched_capabilities());
    }

    #[tokio::test]
    async fn test_missing_environment_is_success() {
        let store = store();
        let handler = DeleteEnvironmentHandler::new(store.repositories());

        let outcome = handler.handle(&command("unknown-env")).await;
        assert_eq!(outcome, Outcome::NotFoundTreatedAsOk);
        assert!(store.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_failure_reports_stage_and_stable_message() {
        let store = store();
        store.fail_on(Capability::PageRevision, "delete_by_parent");
        let handler = DeleteEnvironmentHandler::new(store.repositories());

        let outcome = handler.handle(&command("cockpit-env")).await;
        assert_eq!(
            outcome,
            Outcome::error_at(
                "Error occurred when deleting environment with id [cockpit-env].",
                "CASCADE_DELETE"
            )
        );
        assert_eq!(store.count(Capability::Environment), 1);
    }

    #[tokio::test]
    async fn test_redelivery_finishes_pages_left_by_failure() {
        let store = store();
        store.fail_on(Capability::PageRevision, "delete_by_parent");
        let handler = DeleteEnvironmentHandler::new(store.repositories());
        assert!(!handler.handle(&command("cockpit-env")).await.is_success());
        assert_eq!(store.count(Capability::Page), 1);

        store.clear_faults();
        let outcome = handler.handle(&command("cockpit-env")).await;

        assert_eq!(outcome, Outcome::ok());
        assert_eq!(store.count(Capability::PageRevision), 0);
        assert_eq!(store.count(Capability::Page), 0);
        assert_eq!(store.count(Capability::Environment), 0);
    }

    #[tokio::test]
    async fn test_empty_external_id_is_invalid() {
        let store = store();
        let outcome = DeleteEnvironmentHandler::new(store.repositories())
            .handle(&command(""))
            .await;

        assert!(matches!(
            outcome,
            Outcome::Err(ref f) if f.message.starts_with("Invalid command:")
        ));
        assert!(store.journal().is_empty());
    }
}
