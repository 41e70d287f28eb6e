//! The closed set of storage and service collaborators the engine may call.
//!
//! This table is maintained by hand. Adding an entity kind means adding a
//! variant here, listing it in [`Capability::ALL`], and either wiring it into a
//! cascade or exempting it in the runtime's consistency audit.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a capability is raw storage or a higher-level service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    Repository,
    Service,
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Repository => write!(f, "repository"),
            Self::Service => write!(f, "service"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    // ===== Repositories =====
    AccessPoint,
    AlertTrigger,
    Api,
    ApiCategoryOrder,
    ApiHeader,
    ApiKey,
    ApiQualityRule,
    Application,
    AsyncJob,
    Audit,
    Category,
    Command,
    CustomUserFields,
    Dashboard,
    Dictionary,
    Environment,
    EventLatest,
    Flow,
    GenericNotificationConfig,
    Group,
    IdentityProvider,
    IdentityProviderActivation,
    Installation,
    Integration,
    Invitation,
    Media,
    Membership,
    Metadata,
    NotificationTemplate,
    Organization,
    Page,
    PageRevision,
    Parameter,
    Plan,
    PortalMenuLink,
    PortalNotificationConfig,
    Rating,
    RatingAnswer,
    Role,
    ScoringReport,
    ScoringRuleset,
    SharedPolicyGroup,
    SharedPolicyGroupHistory,
    Subscription,
    Tag,
    Tenant,
    Theme,
    Token,
    User,
    Workflow,

    // ===== Upstream services =====
    AccessPointService,
    AlertService,
    ApiStateService,
    ApplicationAlertService,
    DictionaryService,
    EventService,
    IdentityProviderActivationService,
    SearchEngineService,
}

impl Capability {
    /// Every capability, in declaration order.
    pub const ALL: [Capability; 58] = [
        Capability::AccessPoint,
        Capability::AlertTrigger,
        Capability::Api,
        Capability::ApiCategoryOrder,
        Capability::ApiHeader,
        Capability::ApiKey,
        Capability::ApiQualityRule,
        Capability::Application,
        Capability::AsyncJob,
        Capability::Audit,
        Capability::Category,
        Capability::Command,
        Capability::CustomUserFields,
        Capability::Dashboard,
        Capability::Dictionary,
        Capability::Environment,
        Capability::EventLatest,
        Capability::Flow,
        Capability::GenericNotificationConfig,
        Capability::Group,
        Capability::IdentityProvider,
        Capability::IdentityProviderActivation,
        Capability::Installation,
        Capability::Integration,
        Capability::Invitation,
        Capability::Media,
        Capability::Membership,
        Capability::Metadata,
        Capability::NotificationTemplate,
        Capability::Organization,
        Capability::Page,
        Capability::PageRevision,
        Capability::Parameter,
        Capability::Plan,
        Capability::PortalMenuLink,
        Capability::PortalNotificationConfig,
        Capability::Rating,
        Capability::RatingAnswer,
        Capability::Role,
        Capability::ScoringReport,
        Capability::ScoringRuleset,
        Capability::SharedPolicyGroup,
        Capability::SharedPolicyGroupHistory,
        Capability::Subscription,
        Capability::Tag,
        Capability::Tenant,
        Capability::Theme,
        Capability::Token,
        Capability::User,
        Capability::Workflow,
        Capability::AccessPointService,
        Capability::AlertService,
        Capability::ApiStateService,
        Capability::ApplicationAlertService,
        Capability::DictionaryService,
        Capability::EventService,
        Capability::IdentityProviderActivationService,
        Capability::SearchEngineService,
    ];

    pub fn kind(&self) -> CapabilityKind {
        match self {
            Self::AccessPointService
            | Self::AlertService
            | Self::ApiStateService
            | Self::ApplicationAlertService
            | Self::DictionaryService
            | Self::EventService
            | Self::IdentityProviderActivationService
            | Self::SearchEngineService => CapabilityKind::Service,
            _ => CapabilityKind::Repository,
        }
    }

    /// Stable snake_case name, identical to the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessPoint => "access_point",
            Self::AlertTrigger => "alert_trigger",
            Self::Api => "api",
            Self::ApiCategoryOrder => "api_category_order",
            Self::ApiHeader => "api_header",
            Self::ApiKey => "api_key",
            Self::ApiQualityRule => "api_quality_rule",
            Self::Application => "application",
            Self::AsyncJob => "async_job",
            Self::Audit => "audit",
            Self::Category => "category",
            Self::Command => "command",
            Self::CustomUserFields => "custom_user_fields",
            Self::Dashboard => "dashboard",
            Self::Dictionary => "dictionary",
            Self::Environment => "environment",
            Self::EventLatest => "event_latest",
            Self::Flow => "flow",
            Self::GenericNotificationConfig => "generic_notification_config",
            Self::Group => "group",
            Self::IdentityProvider => "identity_provider",
            Self::IdentityProviderActivation => "identity_provider_activation",
            Self::Installation => "installation",
            Self::Integration => "integration",
            Self::Invitation => "invitation",
            Self::Media => "media",
            Self::Membership => "membership",
            Self::Metadata => "metadata",
            Self::NotificationTemplate => "notification_template",
            Self::Organization => "organization",
            Self::Page => "page",
            Self::PageRevision => "page_revision",
            Self::Parameter => "parameter",
            Self::Plan => "plan",
            Self::PortalMenuLink => "portal_menu_link",
            Self::PortalNotificationConfig => "portal_notification_config",
            Self::Rating => "rating",
            Self::RatingAnswer => "rating_answer",
            Self::Role => "role",
            Self::ScoringReport => "scoring_report",
            Self::ScoringRuleset => "scoring_ruleset",
            Self::SharedPolicyGroup => "shared_policy_group",
            Self::SharedPolicyGroupHistory => "shared_policy_group_history",
            Self::Subscription => "subscription",
            Self::Tag => "tag",
            Self::Tenant => "tenant",
            Self::Theme => "theme",
            Self::Token => "token",
            Self::User => "user",
            Self::Workflow => "workflow",
            Self::AccessPointService => "access_point_service",
            Self::AlertService => "alert_service",
            Self::ApiStateService => "api_state_service",
            Self::ApplicationAlertService => "application_alert_service",
            Self::DictionaryService => "dictionary_service",
            Self::EventService => "event_service",
            Self::IdentityProviderActivationService => "identity_provider_activation_service",
            Self::SearchEngineService => "search_engine_service",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
