//! The capability set handed to the engine.

use crate::repository::{
    ApiRepository, CommandRepository, EnvironmentRepository, EnvironmentScoped, MediaRepository,
    MembershipRepository, OrganizationRepository, ParentScoped, ReferenceScoped, RoleRepository,
    TokenRepository, UserRepository,
};
use crate::service::{
    AccessPointService, AlertService, ApiStateService, ApplicationAlertService, DictionaryService,
    EventService, IdentityProviderActivationService, SearchEngineService,
};
use std::sync::Arc;

/// One collaborator per wired capability.
///
/// Cheap to clone. Handlers hold a clone and never see concrete storage types.
#[derive(Clone)]
pub struct Repositories {
    // ===== Targets =====
    pub organizations: Arc<dyn OrganizationRepository>,
    pub environments: Arc<dyn EnvironmentRepository>,
    pub users: Arc<dyn UserRepository>,

    // ===== Typed =====
    pub apis: Arc<dyn ApiRepository>,
    pub roles: Arc<dyn RoleRepository>,
    pub memberships: Arc<dyn MembershipRepository>,
    pub tokens: Arc<dyn TokenRepository>,
    pub media: Arc<dyn MediaRepository>,
    pub commands: Arc<dyn CommandRepository>,

    // ===== Environment-scoped =====
    pub applications: Arc<dyn EnvironmentScoped>,
    pub subscriptions: Arc<dyn EnvironmentScoped>,
    pub api_keys: Arc<dyn EnvironmentScoped>,
    pub plans: Arc<dyn EnvironmentScoped>,
    pub api_headers: Arc<dyn EnvironmentScoped>,
    pub portal_menu_links: Arc<dyn EnvironmentScoped>,
    pub groups: Arc<dyn EnvironmentScoped>,
    pub categories: Arc<dyn EnvironmentScoped>,
    pub dictionaries: Arc<dyn EnvironmentScoped>,
    pub shared_policy_groups: Arc<dyn EnvironmentScoped>,
    pub shared_policy_group_history: Arc<dyn EnvironmentScoped>,
    pub integrations: Arc<dyn EnvironmentScoped>,
    pub async_jobs: Arc<dyn EnvironmentScoped>,

    // ===== Parent-scoped =====
    pub api_category_orders: Arc<dyn ParentScoped>,
    pub api_quality_rules: Arc<dyn ParentScoped>,
    pub scoring_reports: Arc<dyn ParentScoped>,
    pub page_revisions: Arc<dyn ParentScoped>,
    pub rating_answers: Arc<dyn ParentScoped>,

    // ===== Reference-scoped =====
    pub pages: Arc<dyn ReferenceScoped>,
    pub ratings: Arc<dyn ReferenceScoped>,
    pub audits: Arc<dyn ReferenceScoped>,
    pub flows: Arc<dyn ReferenceScoped>,
    pub generic_notification_configs: Arc<dyn ReferenceScoped>,
    pub portal_notification_configs: Arc<dyn ReferenceScoped>,
    pub invitations: Arc<dyn ReferenceScoped>,
    pub metadata: Arc<dyn ReferenceScoped>,
    pub workflows: Arc<dyn ReferenceScoped>,
    pub access_points: Arc<dyn ReferenceScoped>,
    pub parameters: Arc<dyn ReferenceScoped>,
    pub custom_user_fields: Arc<dyn ReferenceScoped>,
    pub dashboards: Arc<dyn ReferenceScoped>,
    pub scoring_rulesets: Arc<dyn ReferenceScoped>,
    pub themes: Arc<dyn ReferenceScoped>,
    pub identity_providers: Arc<dyn ReferenceScoped>,
    pub identity_provider_activations: Arc<dyn ReferenceScoped>,
    pub tags: Arc<dyn ReferenceScoped>,
    pub tenants: Arc<dyn ReferenceScoped>,
    pub notification_templates: Arc<dyn ReferenceScoped>,

    // ===== Upstream services =====
    pub api_state: Arc<dyn ApiStateService>,
    pub dictionary_service: Arc<dyn DictionaryService>,
    pub identity_provider_activation_service: Arc<dyn IdentityProviderActivationService>,
    pub access_point_service: Arc<dyn AccessPointService>,
    pub search_engine: Arc<dyn SearchEngineService>,
    pub alert_service: Arc<dyn AlertService>,
    pub application_alert_service: Arc<dyn ApplicationAlertService>,
    pub event_service: Arc<dyn EventService>,
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repositories").finish_non_exhaustive()
    }
}
