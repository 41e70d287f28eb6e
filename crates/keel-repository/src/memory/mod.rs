//! In-memory implementation of every collaborator.
//!
//! `MemoryStore` backs tests and the CLI. Besides holding data it keeps a
//! journal of every call made through it and can be told to fail a given
//! `(capability, operation)` pair, which is how tests drive error paths
//! without mocks.

mod collection;
mod fixture;

pub use collection::MemoryCollection;
pub use fixture::{FixtureError, Record, StoreFixture, TYPED_CAPABILITIES};

use crate::error::{RepositoryError, Result};
use crate::repositories::Repositories;
use keel_core::{
    Alert, Api, Capability, Dictionary, Environment, Membership, Organization, Role, SearchDocument,
    Token, User,
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One call made through the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalEntry {
    pub capability: Capability,
    pub operation: &'static str,
    pub argument: String,
}

impl JournalEntry {
    /// Everything except lookups.
    pub fn is_mutation(&self) -> bool {
        !self.operation.starts_with("find")
    }
}

#[derive(Debug, Default)]
pub(crate) struct StoreState {
    pub(crate) organizations: BTreeMap<String, Organization>,
    pub(crate) environments: BTreeMap<String, Environment>,
    pub(crate) apis: BTreeMap<String, Api>,
    pub(crate) dictionaries: BTreeMap<String, Dictionary>,
    pub(crate) users: BTreeMap<String, User>,
    pub(crate) roles: BTreeMap<String, Role>,
    pub(crate) memberships: BTreeMap<String, Membership>,
    pub(crate) tokens: BTreeMap<String, Token>,
    pub(crate) alerts: BTreeMap<String, Alert>,
    pub(crate) search_documents: BTreeSet<SearchDocument>,
    pub(crate) records: BTreeMap<Capability, BTreeMap<String, Record>>,
    journal: Vec<JournalEntry>,
    faults: HashSet<(Capability, &'static str)>,
}

impl StoreState {
    /// Ids of the generic records of `capability` matching `predicate`.
    pub(crate) fn select_records(
        &self,
        capability: Capability,
        predicate: impl Fn(&Record) -> bool,
    ) -> Vec<String> {
        match self.records.get(&capability) {
            Some(records) => select(records, predicate),
            None => vec![],
        }
    }

    /// Remove the generic records of `capability` matching `predicate`.
    pub(crate) fn drain_records(
        &mut self,
        capability: Capability,
        predicate: impl Fn(&Record) -> bool,
    ) -> Vec<String> {
        match self.records.get_mut(&capability) {
            Some(records) => drain(records, predicate),
            None => vec![],
        }
    }

    /// Remove `ids` from whichever list holds `capability`.
    pub(crate) fn remove(&mut self, capability: Capability, ids: &[String]) {
        for id in ids {
            match capability {
                Capability::Api => {
                    self.apis.remove(id);
                }
                Capability::Dictionary => {
                    self.dictionaries.remove(id);
                }
                Capability::User => {
                    self.users.remove(id);
                }
                Capability::Role => {
                    self.roles.remove(id);
                }
                Capability::Membership => {
                    self.memberships.remove(id);
                }
                Capability::Token => {
                    self.tokens.remove(id);
                }
                _ => {
                    if let Some(records) = self.records.get_mut(&capability) {
                        records.remove(id);
                    }
                }
            }
        }
    }
}

/// Keys of every value matching `predicate`, in order.
pub(crate) fn select<T>(map: &BTreeMap<String, T>, predicate: impl Fn(&T) -> bool) -> Vec<String> {
    map.iter()
        .filter(|(_, value)| predicate(value))
        .map(|(id, _)| id.clone())
        .collect()
}

/// Remove every value matching `predicate`; returns their keys in order.
pub(crate) fn drain<T>(
    map: &mut BTreeMap<String, T>,
    predicate: impl Fn(&T) -> bool,
) -> Vec<String> {
    let ids = select(map, predicate);
    for id in &ids {
        map.remove(id);
    }
    ids
}

/// Journaling, fault-injectable in-memory store.
///
/// Cheap to clone; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(fixture: StoreFixture) -> Self {
        fn keyed<T>(items: Vec<T>, id: impl Fn(&T) -> String) -> BTreeMap<String, T> {
            items.into_iter().map(|item| (id(&item), item)).collect()
        }

        let records = fixture
            .records
            .into_iter()
            .map(|(capability, records)| (capability, keyed(records, |r| r.id.clone())))
            .collect();

        let state = StoreState {
            organizations: keyed(fixture.organizations, |o| o.id.clone()),
            environments: keyed(fixture.environments, |e| e.id.clone()),
            apis: keyed(fixture.apis, |a| a.id.clone()),
            dictionaries: keyed(fixture.dictionaries, |d| d.id.clone()),
            users: keyed(fixture.users, |u| u.id.clone()),
            roles: keyed(fixture.roles, |r| r.id.clone()),
            memberships: keyed(fixture.memberships, |m| m.id.clone()),
            tokens: keyed(fixture.tokens, |t| t.id.clone()),
            alerts: keyed(fixture.alerts, |a| a.id.clone()),
            search_documents: fixture.search_documents.into_iter().collect(),
            records,
            ..Default::default()
        };

        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        // A panicking test thread must not take the store down with it.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Journal a call, honour injected faults, then apply `op`.
    pub(crate) fn call<T>(
        &self,
        capability: Capability,
        operation: &'static str,
        argument: String,
        op: impl FnOnce(&mut StoreState) -> Result<T>,
    ) -> Result<T> {
        let mut state = self.lock();
        state.journal.push(JournalEntry {
            capability,
            operation,
            argument,
        });
        if state.faults.contains(&(capability, operation)) {
            tracing::debug!(%capability, operation, "Injected fault");
            return Err(RepositoryError::unavailable(
                capability,
                format!("injected failure on {operation}"),
            ));
        }
        op(&mut state)
    }

    /// Handle implementing every collaborator trait for `capability`.
    pub fn collection(&self, capability: Capability) -> MemoryCollection {
        MemoryCollection::new(capability, self.clone())
    }

    /// Wire every capability to this store.
    pub fn repositories(&self) -> Repositories {
        let c = |capability| Arc::new(self.collection(capability));
        Repositories {
            organizations: c(Capability::Organization),
            environments: c(Capability::Environment),
            users: c(Capability::User),
            apis: c(Capability::Api),
            roles: c(Capability::Role),
            memberships: c(Capability::Membership),
            tokens: c(Capability::Token),
            media: c(Capability::Media),
            commands: c(Capability::Command),
            applications: c(Capability::Application),
            subscriptions: c(Capability::Subscription),
            api_keys: c(Capability::ApiKey),
            plans: c(Capability::Plan),
            api_headers: c(Capability::ApiHeader),
            portal_menu_links: c(Capability::PortalMenuLink),
            groups: c(Capability::Group),
            categories: c(Capability::Category),
            dictionaries: c(Capability::Dictionary),
            shared_policy_groups: c(Capability::SharedPolicyGroup),
            shared_policy_group_history: c(Capability::SharedPolicyGroupHistory),
            integrations: c(Capability::Integration),
            async_jobs: c(Capability::AsyncJob),
            api_category_orders: c(Capability::ApiCategoryOrder),
            api_quality_rules: c(Capability::ApiQualityRule),
            scoring_reports: c(Capability::ScoringReport),
            page_revisions: c(Capability::PageRevision),
            rating_answers: c(Capability::RatingAnswer),
            pages: c(Capability::Page),
            ratings: c(Capability::Rating),
            audits: c(Capability::Audit),
            flows: c(Capability::Flow),
            generic_notification_configs: c(Capability::GenericNotificationConfig),
            portal_notification_configs: c(Capability::PortalNotificationConfig),
            invitations: c(Capability::Invitation),
            metadata: c(Capability::Metadata),
            workflows: c(Capability::Workflow),
            access_points: c(Capability::AccessPoint),
            parameters: c(Capability::Parameter),
            custom_user_fields: c(Capability::CustomUserFields),
            dashboards: c(Capability::Dashboard),
            scoring_rulesets: c(Capability::ScoringRuleset),
            themes: c(Capability::Theme),
            identity_providers: c(Capability::IdentityProvider),
            identity_provider_activations: c(Capability::IdentityProviderActivation),
            tags: c(Capability::Tag),
            tenants: c(Capability::Tenant),
            notification_templates: c(Capability::NotificationTemplate),
            api_state: c(Capability::ApiStateService),
            dictionary_service: c(Capability::DictionaryService),
            identity_provider_activation_service: c(Capability::IdentityProviderActivationService),
            access_point_service: c(Capability::AccessPointService),
            search_engine: c(Capability::SearchEngineService),
            alert_service: c(Capability::AlertService),
            application_alert_service: c(Capability::ApplicationAlertService),
            event_service: c(Capability::EventService),
        }
    }

    // ===== Fault injection =====

    /// Make every subsequent `operation` call on `capability` fail as unavailable.
    pub fn fail_on(&self, capability: Capability, operation: &'static str) {
        self.lock().faults.insert((capability, operation));
    }

    pub fn clear_faults(&self) {
        self.lock().faults.clear();
    }

    // ===== Journal =====

    pub fn journal(&self) -> Vec<JournalEntry> {
        self.lock().journal.clone()
    }

    pub fn clear_journal(&self) {
        self.lock().journal.clear();
    }

    pub fn mutations(&self) -> Vec<JournalEntry> {
        self.lock()
            .journal
            .iter()
            .filter(|entry| entry.is_mutation())
            .cloned()
            .collect()
    }

    /// Capabilities that received at least one call.
    pub fn touched_capabilities(&self) -> BTreeSet<Capability> {
        self.lock().journal.iter().map(|entry| entry.capability).collect()
    }

    /// Whether `operation` was called on `capability` with `argument`.
    pub fn was_called(&self, capability: Capability, operation: &str, argument: &str) -> bool {
        self.lock().journal.iter().any(|entry| {
            entry.capability == capability
                && entry.operation == operation
                && entry.argument == argument
        })
    }

    // ===== Inspection =====

    /// Number of records currently held for a repository capability.
    pub fn count(&self, capability: Capability) -> usize {
        let state = self.lock();
        match capability {
            Capability::Organization => state.organizations.len(),
            Capability::Environment => state.environments.len(),
            Capability::Api => state.apis.len(),
            Capability::Dictionary => state.dictionaries.len(),
            Capability::User => state.users.len(),
            Capability::Role => state.roles.len(),
            Capability::Membership => state.memberships.len(),
            Capability::Token => state.tokens.len(),
            Capability::AlertTrigger => state.alerts.len(),
            Capability::SearchEngineService => state.search_documents.len(),
            other => state.records.get(&other).map_or(0, BTreeMap::len),
        }
    }

    pub fn contains(&self, capability: Capability, id: &str) -> bool {
        let state = self.lock();
        match capability {
            Capability::Organization => state.organizations.contains_key(id),
            Capability::Environment => state.environments.contains_key(id),
            Capability::Api => state.apis.contains_key(id),
            Capability::Dictionary => state.dictionaries.contains_key(id),
            Capability::User => state.users.contains_key(id),
            Capability::Role => state.roles.contains_key(id),
            Capability::Membership => state.memberships.contains_key(id),
            Capability::Token => state.tokens.contains_key(id),
            Capability::AlertTrigger => state.alerts.contains_key(id),
            other => state
                .records
                .get(&other)
                .is_some_and(|records| records.contains_key(id)),
        }
    }

    pub fn api(&self, id: &str) -> Option<Api> {
        self.lock().apis.get(id).cloned()
    }

    pub fn dictionary(&self, id: &str) -> Option<Dictionary> {
        self.lock().dictionaries.get(id).cloned()
    }

    pub fn users(&self) -> Vec<User> {
        self.lock().users.values().cloned().collect()
    }

    pub fn memberships(&self) -> Vec<Membership> {
        self.lock().memberships.values().cloned().collect()
    }

    pub fn tokens(&self) -> Vec<Token> {
        self.lock().tokens.values().cloned().collect()
    }
}
