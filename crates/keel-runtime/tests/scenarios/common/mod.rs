//! Shared fixtures for the scenario tests.
//!
//! `populated_store()` holds:
//! - organization `org#1` with environments `env#2` (the target of most
//!   scenarios) and `env#3` (a neighbour that must survive every cascade)
//! - in `env#2`: APIs `api#1` (started) and `api#2`, applications `app#1`,
//!   `app#2`, plans, groups, subscriptions, and one record of every
//!   environment-scoped kind
//! - organization `org#9` with no environments, its users, tokens and
//!   organization-scoped records

#![allow(dead_code)]

use keel_audit::AuditLogger;
use keel_core::{
    Alert, Api, Capability, Command, CommandPayload, CredentialScope, DeleteEnvironmentPayload,
    DeleteOrganizationPayload, DeleteUserPayload, Dictionary, Environment, LifecycleState,
    Membership, MemberType, Organization, ProvisionCredentialPayload, ReferenceType, Role,
    RoleScope, RuntimeConfig, SearchDocument, Token, User,
};
use keel_repository::{MemoryStore, Record, StoreFixture};
use keel_runtime::DispatchRegistry;
use std::collections::BTreeSet;

// =============================================================================
// IDENTIFIERS
// =============================================================================

pub const ORG: &str = "org#1";
pub const ORG_EXT: &str = "cockpit-org#1";
pub const ENV: &str = "env#2";
pub const ENV_EXT: &str = "cockpit-env#2";
pub const NEIGHBOUR_ENV: &str = "env#3";
pub const EMPTY_ORG: &str = "org#9";
pub const EMPTY_ORG_EXT: &str = "cockpit-org#9";

// =============================================================================
// FIXTURE
// =============================================================================

fn organization(id: &str, external_id: &str) -> Organization {
    Organization {
        id: id.to_string(),
        external_id: external_id.to_string(),
        name: String::new(),
    }
}

fn environment(id: &str, external_id: &str, organization_id: &str) -> Environment {
    Environment {
        id: id.to_string(),
        external_id: external_id.to_string(),
        organization_id: organization_id.to_string(),
        name: String::new(),
    }
}

fn api(id: &str, environment_id: &str, state: LifecycleState) -> Api {
    Api {
        id: id.to_string(),
        environment_id: environment_id.to_string(),
        name: id.to_string(),
        lifecycle_state: state,
    }
}

pub fn role(id: &str, holder: (ReferenceType, &str), scope: RoleScope, name: &str) -> Role {
    Role {
        id: id.to_string(),
        reference_id: holder.1.to_string(),
        reference_type: holder.0,
        scope,
        name: name.to_string(),
    }
}

fn membership(id: &str, member_id: &str, reference: (ReferenceType, &str)) -> Membership {
    Membership {
        id: id.to_string(),
        member_id: member_id.to_string(),
        member_type: MemberType::User,
        reference_id: reference.1.to_string(),
        reference_type: reference.0,
        role_id: "role#org-user".to_string(),
    }
}

fn alert(id: &str, reference: (ReferenceType, &str)) -> Alert {
    Alert {
        id: id.to_string(),
        reference_type: reference.0,
        reference_id: reference.1.to_string(),
        name: String::new(),
    }
}

fn user(id: &str, organization_id: &str, external_id: &str) -> User {
    let mut user = User::service_account(organization_id, external_id, external_id);
    user.id = id.to_string();
    user
}

fn on(reference_type: ReferenceType, id: &str, record_id: &str) -> Record {
    Record::new(record_id).referencing(reference_type, id)
}

fn in_env(environment_id: &str, record_id: &str) -> Record {
    Record::new(record_id).in_environment(environment_id)
}

fn child(parent_id: &str, record_id: &str) -> Record {
    Record::new(record_id).child_of(parent_id)
}

/// Records owned by one environment, suffixed to stay unique across environments.
fn environment_records(fixture: StoreFixture, env: &str, suffix: &str) -> StoreFixture {
    use Capability as C;
    use ReferenceType as R;
    let id = |name: &str| format!("{name}@env{suffix}");

    let mut fixture = fixture;
    for kind in [
        C::Subscription,
        C::ApiKey,
        C::ApiHeader,
        C::PortalMenuLink,
        C::Category,
        C::SharedPolicyGroup,
        C::SharedPolicyGroupHistory,
        C::Integration,
        C::AsyncJob,
        C::Command,
        C::Media,
    ] {
        fixture = fixture.record(kind, in_env(env, &id(kind.as_str())));
    }
    for kind in [
        C::AccessPoint,
        C::Parameter,
        C::Audit,
        C::CustomUserFields,
        C::Dashboard,
        C::ScoringRuleset,
        C::PortalNotificationConfig,
        C::GenericNotificationConfig,
        C::Theme,
        C::IdentityProviderActivation,
        C::Metadata,
    ] {
        fixture = fixture.record(kind, on(R::Environment, env, &id(kind.as_str())));
    }
    fixture
        .record(C::Page, on(R::Environment, env, &id("page")))
        .record(C::PageRevision, child(&id("page"), &id("page_revision")))
        .record(C::EventLatest, in_env(env, &id("event")))
}

pub fn populated_fixture() -> StoreFixture {
    use Capability as C;
    use ReferenceType as R;

    let mut fixture = StoreFixture {
        organizations: vec![organization(ORG, ORG_EXT), organization(EMPTY_ORG, EMPTY_ORG_EXT)],
        environments: vec![
            environment(ENV, ENV_EXT, ORG),
            environment(NEIGHBOUR_ENV, "cockpit-env#3", ORG),
        ],
        apis: vec![
            api("api#1", ENV, LifecycleState::Started),
            api("api#2", ENV, LifecycleState::Stopped),
            api("api#9", NEIGHBOUR_ENV, LifecycleState::Started),
        ],
        dictionaries: vec![
            Dictionary {
                id: "dictionary#1".to_string(),
                environment_id: ENV.to_string(),
                name: String::new(),
                state: LifecycleState::Started,
            },
            Dictionary {
                id: "dictionary#9".to_string(),
                environment_id: NEIGHBOUR_ENV.to_string(),
                name: String::new(),
                state: LifecycleState::Started,
            },
        ],
        users: vec![
            user("user#1", EMPTY_ORG, "sa-1"),
            user("user#2", EMPTY_ORG, "sa-2"),
        ],
        roles: vec![
            role("role#org-user", (R::Organization, ORG), RoleScope::Organization, "USER"),
            role("role#org-admin", (R::Organization, ORG), RoleScope::Organization, "ADMIN"),
            role("role#env-admin", (R::Organization, ORG), RoleScope::Environment, "ADMIN"),
            role(
                "role#env-publisher",
                (R::Organization, ORG),
                RoleScope::Environment,
                "API_PUBLISHER",
            ),
            role("role#env-local", (R::Environment, ENV), RoleScope::Environment, "CUSTOM"),
            role("role#org9", (R::Organization, EMPTY_ORG), RoleScope::Organization, "USER"),
        ],
        memberships: vec![
            membership("membership#api1", "user#x", (R::Api, "api#1")),
            membership("membership#api2", "user#x", (R::Api, "api#2")),
            membership("membership#app1", "user#x", (R::Application, "app#1")),
            membership("membership#group1", "user#x", (R::Group, "group#1")),
            membership("membership#group2", "user#x", (R::Group, "group#2")),
            membership("membership#env", "user#x", (R::Environment, ENV)),
            membership("membership#env9", "user#x", (R::Environment, NEIGHBOUR_ENV)),
            membership("membership#user1", "user#1", (R::Organization, EMPTY_ORG)),
            membership("membership#org9", "group#org9", (R::Organization, EMPTY_ORG)),
        ],
        tokens: vec![
            Token::for_user("user#1", "ci", "secret-1"),
            Token::for_user("user#2", "ci", "secret-2"),
        ],
        alerts: vec![
            alert("alert#api1", (R::Api, "api#1")),
            alert("alert#env", (R::Environment, ENV)),
            alert("alert#app1", (R::Application, "app#1")),
            alert("alert#env9", (R::Environment, NEIGHBOUR_ENV)),
        ],
        search_documents: vec![
            SearchDocument::Api("api#1".to_string()),
            SearchDocument::Api("api#2".to_string()),
            SearchDocument::Page("page#api1".to_string()),
            SearchDocument::Api("api#9".to_string()),
        ],
        ..Default::default()
    };

    // Per API.
    for api_id in ["api#1", "api#2"] {
        for kind in [
            C::Audit,
            C::Flow,
            C::GenericNotificationConfig,
            C::Invitation,
            C::Metadata,
            C::PortalNotificationConfig,
            C::Workflow,
        ] {
            let id = format!("{}@{api_id}", kind.as_str());
            fixture = fixture.record(kind, on(R::Api, api_id, &id));
        }
        for kind in [C::ApiCategoryOrder, C::ApiQualityRule, C::ScoringReport, C::Media] {
            fixture = fixture.record(kind, child(api_id, &format!("{}@{api_id}", kind.as_str())));
        }
        fixture = fixture.record(C::EventLatest, on(R::Api, api_id, &format!("event@{api_id}")));
    }
    fixture = fixture
        .record(C::Page, on(R::Api, "api#1", "page#api1"))
        .record(C::PageRevision, child("page#api1", "revision#api1"))
        .record(C::Rating, on(R::Api, "api#1", "rating#1"))
        .record(C::RatingAnswer, child("rating#1", "answer#1"));

    // Applications, plans, groups.
    for app_id in ["app#1", "app#2"] {
        fixture = fixture.record(C::Application, in_env(ENV, app_id));
        for kind in [
            C::GenericNotificationConfig,
            C::Invitation,
            C::Metadata,
            C::PortalNotificationConfig,
            C::Workflow,
            C::Audit,
        ] {
            let id = format!("{}@{app_id}", kind.as_str());
            fixture = fixture.record(kind, on(R::Application, app_id, &id));
        }
    }
    for plan_id in ["plan#1", "plan#2"] {
        fixture = fixture
            .record(C::Plan, in_env(ENV, plan_id))
            .record(C::Flow, on(R::Plan, plan_id, &format!("flow@{plan_id}")));
    }
    for group_id in ["group#1", "group#2"] {
        fixture = fixture
            .record(C::Group, in_env(ENV, group_id))
            .record(C::Invitation, on(R::Group, group_id, &format!("invitation@{group_id}")));
    }
    for subscription_id in ["subscription#1", "subscription#2"] {
        fixture = fixture.record(C::Subscription, in_env(ENV, subscription_id));
    }

    fixture = environment_records(fixture, ENV, "#2");
    fixture = environment_records(fixture, NEIGHBOUR_ENV, "#3");

    // Organization-scoped records of the empty organization.
    for kind in [
        C::Parameter,
        C::CustomUserFields,
        C::Flow,
        C::IdentityProvider,
        C::IdentityProviderActivation,
        C::AccessPoint,
        C::Tag,
        C::Tenant,
        C::NotificationTemplate,
        C::Command,
        C::Audit,
    ] {
        let id = format!("{}@org9", kind.as_str());
        fixture = fixture.record(kind, on(R::Organization, EMPTY_ORG, &id));
    }

    fixture
}

pub fn populated_store() -> MemoryStore {
    MemoryStore::from_fixture(populated_fixture())
}

pub fn registry(store: &MemoryStore, audit: AuditLogger) -> DispatchRegistry {
    DispatchRegistry::standard(store.repositories(), audit, &RuntimeConfig::default())
}

// =============================================================================
// COMMANDS
// =============================================================================

pub fn delete_environment(id: &str, external_id: &str) -> Command {
    Command::new(
        id,
        CommandPayload::DeleteEnvironment(DeleteEnvironmentPayload {
            external_id: external_id.to_string(),
            user_id: "user#admin".to_string(),
        }),
    )
}

pub fn delete_organization(id: &str, external_id: &str) -> Command {
    Command::new(
        id,
        CommandPayload::DeleteOrganization(DeleteOrganizationPayload {
            external_id: external_id.to_string(),
            user_id: "user#admin".to_string(),
        }),
    )
}

pub fn delete_user(id: &str, organization_external_id: &str, user_external_id: &str) -> Command {
    Command::new(
        id,
        CommandPayload::DeleteUser(DeleteUserPayload {
            organization_external_id: organization_external_id.to_string(),
            user_external_id: user_external_id.to_string(),
        }),
    )
}

pub fn provision(id: &str, user_external_id: &str, scope: CredentialScope) -> Command {
    Command::new(
        id,
        CommandPayload::ProvisionCredential(ProvisionCredentialPayload {
            organization_external_id: ORG_EXT.to_string(),
            environment_external_id: ENV_EXT.to_string(),
            user_external_id: user_external_id.to_string(),
            name: format!("{user_external_id} token"),
            scope,
        }),
    )
}

// =============================================================================
// ASSERTIONS
// =============================================================================

pub fn declared(registry: &DispatchRegistry, command: &Command) -> BTreeSet<Capability> {
    registry
        .get(command.command_type())
        .map(|handler| handler.capabilities().iter().copied().collect())
        .unwrap_or_default()
}
