use super::{MemoryStore, StoreState, drain, select};
use crate::error::{RepositoryError, Result};
use crate::repository::{
    ApiRepository, EnvironmentRepository, EnvironmentScoped, MembershipRepository,
    OrganizationRepository, ParentScoped, ReferenceScoped, RoleRepository, TokenRepository,
    UserRepository,
};
use crate::service::{
    AccessPointService, AlertService, ApiStateService, ApplicationAlertService, DictionaryService,
    EventService, IdentityProviderActivationService, SearchEngineService,
};
use async_trait::async_trait;
use keel_core::{
    Alert, Api, Capability, Dictionary, Environment, ExecutionContext, LifecycleState, Membership,
    Organization, ReferenceType, Role, RoleScope, SearchDocument, Token, User,
};

/// A [`MemoryStore`] seen through one capability.
///
/// Implements every collaborator trait; calls are journaled under the
/// capability the handle was created for.
#[derive(Debug, Clone)]
pub struct MemoryCollection {
    capability: Capability,
    store: MemoryStore,
}

impl MemoryCollection {
    pub(crate) fn new(capability: Capability, store: MemoryStore) -> Self {
        Self { capability, store }
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }
}

fn reference_argument(reference_type: ReferenceType, reference_id: &str) -> String {
    format!("{reference_type}:{reference_id}")
}

fn ids_by_reference(
    state: &StoreState,
    capability: Capability,
    reference_id: &str,
    reference_type: ReferenceType,
) -> Vec<String> {
    match capability {
        Capability::Role => select(&state.roles, |r| {
            r.reference_type == reference_type && r.reference_id == reference_id
        }),
        Capability::Membership => select(&state.memberships, |m| {
            m.reference_type == reference_type && m.reference_id == reference_id
        }),
        Capability::Token => select(&state.tokens, |t| {
            t.reference_type == reference_type && t.reference_id == reference_id
        }),
        _ => state.select_records(capability, |r| r.references(reference_type, reference_id)),
    }
}

fn ids_by_environment(
    state: &StoreState,
    capability: Capability,
    environment_id: &str,
) -> Vec<String> {
    match capability {
        Capability::Api => select(&state.apis, |a| a.environment_id == environment_id),
        Capability::Dictionary => {
            select(&state.dictionaries, |d| d.environment_id == environment_id)
        }
        _ => state.select_records(capability, |r| {
            r.environment_id.as_deref() == Some(environment_id)
        }),
    }
}

// ===== Generic shapes =====

#[async_trait]
impl ReferenceScoped for MemoryCollection {
    async fn find_ids_by_reference(
        &self,
        reference_id: &str,
        reference_type: ReferenceType,
    ) -> Result<Vec<String>> {
        let capability = self.capability;
        self.store.call(
            capability,
            "find_ids_by_reference",
            reference_argument(reference_type, reference_id),
            |state| Ok(ids_by_reference(state, capability, reference_id, reference_type)),
        )
    }

    async fn delete_by_reference(
        &self,
        reference_id: &str,
        reference_type: ReferenceType,
    ) -> Result<Vec<String>> {
        let capability = self.capability;
        self.store.call(
            capability,
            "delete_by_reference",
            reference_argument(reference_type, reference_id),
            |state| {
                let ids = ids_by_reference(state, capability, reference_id, reference_type);
                state.remove(capability, &ids);
                Ok(ids)
            },
        )
    }
}

#[async_trait]
impl EnvironmentScoped for MemoryCollection {
    async fn find_ids_by_environment(&self, environment_id: &str) -> Result<Vec<String>> {
        let capability = self.capability;
        self.store
            .call(capability, "find_ids_by_environment", environment_id.to_string(), |state| {
                Ok(ids_by_environment(state, capability, environment_id))
            })
    }

    async fn delete_by_environment(&self, environment_id: &str) -> Result<Vec<String>> {
        let capability = self.capability;
        self.store
            .call(capability, "delete_by_environment", environment_id.to_string(), |state| {
                let ids = ids_by_environment(state, capability, environment_id);
                state.remove(capability, &ids);
                Ok(ids)
            })
    }
}

#[async_trait]
impl ParentScoped for MemoryCollection {
    async fn delete_by_parent(&self, parent_id: &str) -> Result<Vec<String>> {
        let capability = self.capability;
        self.store
            .call(capability, "delete_by_parent", parent_id.to_string(), |state| {
                Ok(state.drain_records(capability, |r| r.parent_id.as_deref() == Some(parent_id)))
            })
    }
}

// ===== Typed repositories =====

#[async_trait]
impl OrganizationRepository for MemoryCollection {
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<Organization>> {
        self.store
            .call(self.capability, "find_by_external_id", external_id.to_string(), |state| {
                Ok(state
                    .organizations
                    .values()
                    .find(|o| o.external_id == external_id)
                    .cloned())
            })
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.store.call(self.capability, "delete", id.to_string(), |state| {
            state.organizations.remove(id);
            Ok(())
        })
    }
}

#[async_trait]
impl EnvironmentRepository for MemoryCollection {
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<Environment>> {
        self.store
            .call(self.capability, "find_by_external_id", external_id.to_string(), |state| {
                Ok(state
                    .environments
                    .values()
                    .find(|e| e.external_id == external_id)
                    .cloned())
            })
    }

    async fn find_by_organization(&self, organization_id: &str) -> Result<Vec<Environment>> {
        self.store
            .call(self.capability, "find_by_organization", organization_id.to_string(), |state| {
                Ok(state
                    .environments
                    .values()
                    .filter(|e| e.organization_id == organization_id)
                    .cloned()
                    .collect())
            })
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.store.call(self.capability, "delete", id.to_string(), |state| {
            state.environments.remove(id);
            Ok(())
        })
    }
}

#[async_trait]
impl ApiRepository for MemoryCollection {
    async fn find_started_by_environment(&self, environment_id: &str) -> Result<Vec<Api>> {
        self.store.call(
            self.capability,
            "find_started_by_environment",
            environment_id.to_string(),
            |state| {
                Ok(state
                    .apis
                    .values()
                    .filter(|a| {
                        a.environment_id == environment_id
                            && a.lifecycle_state == LifecycleState::Started
                    })
                    .cloned()
                    .collect())
            },
        )
    }
}

#[async_trait]
impl UserRepository for MemoryCollection {
    async fn find_by_external_id(
        &self,
        organization_id: &str,
        external_id: &str,
    ) -> Result<Option<User>> {
        self.store.call(
            self.capability,
            "find_by_external_id",
            format!("{organization_id}/{external_id}"),
            |state| {
                Ok(state
                    .users
                    .values()
                    .find(|u| u.organization_id == organization_id && u.external_id == external_id)
                    .cloned())
            },
        )
    }

    async fn create(&self, user: User) -> Result<User> {
        let capability = self.capability;
        self.store.call(capability, "create", user.id.clone(), |state| {
            let duplicate = state.users.contains_key(&user.id)
                || state
                    .users
                    .values()
                    .any(|u| {
                        u.organization_id == user.organization_id
                            && u.external_id == user.external_id
                    });
            if duplicate {
                return Err(RepositoryError::conflict(
                    capability,
                    format!("user [{}] already exists", user.external_id),
                ));
            }
            state.users.insert(user.id.clone(), user.clone());
            Ok(user)
        })
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.store.call(self.capability, "delete", id.to_string(), |state| {
            state.users.remove(id);
            Ok(())
        })
    }

    async fn find_ids_by_organization(&self, organization_id: &str) -> Result<Vec<String>> {
        self.store.call(
            self.capability,
            "find_ids_by_organization",
            organization_id.to_string(),
            |state| Ok(select(&state.users, |u| u.organization_id == organization_id)),
        )
    }

    async fn delete_by_organization(&self, organization_id: &str) -> Result<Vec<String>> {
        self.store
            .call(self.capability, "delete_by_organization", organization_id.to_string(), |state| {
                Ok(drain(&mut state.users, |u| u.organization_id == organization_id))
            })
    }
}

#[async_trait]
impl RoleRepository for MemoryCollection {
    async fn find_by_scope_and_name(
        &self,
        scope: RoleScope,
        name: &str,
        organization_id: &str,
    ) -> Result<Option<Role>> {
        self.store.call(
            self.capability,
            "find_by_scope_and_name",
            format!("{scope}/{name}/{organization_id}"),
            |state| {
                Ok(state
                    .roles
                    .values()
                    .find(|r| {
                        r.scope == scope
                            && r.name == name
                            && r.reference_type == ReferenceType::Organization
                            && r.reference_id == organization_id
                    })
                    .cloned())
            },
        )
    }
}

#[async_trait]
impl MembershipRepository for MemoryCollection {
    async fn create(&self, membership: Membership) -> Result<Membership> {
        let capability = self.capability;
        self.store.call(capability, "create", membership.id.clone(), |state| {
            if state.memberships.contains_key(&membership.id) {
                return Err(RepositoryError::conflict(
                    capability,
                    format!("membership [{}] already exists", membership.id),
                ));
            }
            state.memberships.insert(membership.id.clone(), membership.clone());
            Ok(membership)
        })
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.store.call(self.capability, "delete", id.to_string(), |state| {
            state.memberships.remove(id);
            Ok(())
        })
    }

    async fn find_by_member(&self, member_id: &str) -> Result<Vec<Membership>> {
        self.store
            .call(self.capability, "find_by_member", member_id.to_string(), |state| {
                Ok(state
                    .memberships
                    .values()
                    .filter(|m| m.member_id == member_id)
                    .cloned()
                    .collect())
            })
    }

    async fn delete_by_member(&self, member_id: &str) -> Result<Vec<String>> {
        self.store
            .call(self.capability, "delete_by_member", member_id.to_string(), |state| {
                Ok(drain(&mut state.memberships, |m| m.member_id == member_id))
            })
    }
}

#[async_trait]
impl TokenRepository for MemoryCollection {
    async fn create(&self, token: Token) -> Result<Token> {
        let capability = self.capability;
        self.store.call(capability, "create", token.id.clone(), |state| {
            if state.tokens.contains_key(&token.id) {
                return Err(RepositoryError::conflict(
                    capability,
                    format!("token [{}] already exists", token.id),
                ));
            }
            state.tokens.insert(token.id.clone(), token.clone());
            Ok(token)
        })
    }

    async fn find_by_user(&self, user_id: &str) -> Result<Vec<Token>> {
        self.store.call(self.capability, "find_by_user", user_id.to_string(), |state| {
            Ok(state
                .tokens
                .values()
                .filter(|t| t.reference_type == ReferenceType::User && t.reference_id == user_id)
                .cloned()
                .collect())
        })
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.store.call(self.capability, "delete", id.to_string(), |state| {
            state.tokens.remove(id);
            Ok(())
        })
    }
}

// ===== Upstream services =====

#[async_trait]
impl ApiStateService for MemoryCollection {
    async fn stop(&self, _ctx: &ExecutionContext, api_id: &str, _user_id: &str) -> Result<()> {
        self.store.call(self.capability, "stop", api_id.to_string(), |state| {
            match state.apis.get_mut(api_id) {
                Some(api) => {
                    api.lifecycle_state = LifecycleState::Stopped;
                    Ok(())
                }
                None => Err(RepositoryError::not_found(Capability::Api, api_id)),
            }
        })
    }
}

#[async_trait]
impl DictionaryService for MemoryCollection {
    async fn find_all(&self, ctx: &ExecutionContext) -> Result<Vec<Dictionary>> {
        let environment_id = ctx.environment_id.clone().unwrap_or_default();
        self.store
            .call(self.capability, "find_all", environment_id.clone(), |state| {
                Ok(state
                    .dictionaries
                    .values()
                    .filter(|d| d.environment_id == environment_id)
                    .cloned()
                    .collect())
            })
    }

    async fn stop(&self, _ctx: &ExecutionContext, dictionary_id: &str) -> Result<()> {
        self.store.call(self.capability, "stop", dictionary_id.to_string(), |state| {
            match state.dictionaries.get_mut(dictionary_id) {
                Some(dictionary) => {
                    dictionary.state = LifecycleState::Stopped;
                    Ok(())
                }
                None => Err(RepositoryError::not_found(Capability::Dictionary, dictionary_id)),
            }
        })
    }
}

#[async_trait]
impl IdentityProviderActivationService for MemoryCollection {
    async fn remove_all_from_target(
        &self,
        _ctx: &ExecutionContext,
        reference_id: &str,
        reference_type: ReferenceType,
    ) -> Result<()> {
        self.store.call(
            self.capability,
            "remove_all_from_target",
            reference_argument(reference_type, reference_id),
            |state| {
                state.drain_records(Capability::IdentityProviderActivation, |r| {
                    r.references(reference_type, reference_id)
                });
                Ok(())
            },
        )
    }
}

#[async_trait]
impl AccessPointService for MemoryCollection {
    async fn delete_access_points(
        &self,
        reference_type: ReferenceType,
        reference_id: &str,
    ) -> Result<()> {
        self.store.call(
            self.capability,
            "delete_access_points",
            reference_argument(reference_type, reference_id),
            |state| {
                state.drain_records(Capability::AccessPoint, |r| {
                    r.references(reference_type, reference_id)
                });
                Ok(())
            },
        )
    }
}

#[async_trait]
impl SearchEngineService for MemoryCollection {
    async fn delete(&self, _ctx: &ExecutionContext, document: SearchDocument) -> Result<()> {
        let argument = match &document {
            SearchDocument::Api(id) => format!("api:{id}"),
            SearchDocument::Page(id) => format!("page:{id}"),
        };
        self.store.call(self.capability, "delete", argument, |state| {
            state.search_documents.remove(&document);
            Ok(())
        })
    }
}

#[async_trait]
impl AlertService for MemoryCollection {
    async fn find_by_reference(
        &self,
        reference_type: ReferenceType,
        reference_id: &str,
    ) -> Result<Vec<Alert>> {
        self.store.call(
            self.capability,
            "find_by_reference",
            reference_argument(reference_type, reference_id),
            |state| {
                Ok(state
                    .alerts
                    .values()
                    .filter(|a| {
                        a.reference_type == reference_type && a.reference_id == reference_id
                    })
                    .cloned()
                    .collect())
            },
        )
    }

    async fn delete(&self, alert_id: &str, reference_id: &str) -> Result<()> {
        self.store
            .call(self.capability, "delete", format!("{reference_id}/{alert_id}"), |state| {
                state.alerts.remove(alert_id);
                Ok(())
            })
    }
}

#[async_trait]
impl ApplicationAlertService for MemoryCollection {
    async fn delete_all(&self, application_id: &str) -> Result<()> {
        self.store
            .call(self.capability, "delete_all", application_id.to_string(), |state| {
                drain(&mut state.alerts, |a| {
                    a.reference_type == ReferenceType::Application
                        && a.reference_id == application_id
                });
                Ok(())
            })
    }
}

#[async_trait]
impl EventService for MemoryCollection {
    async fn delete_api_events(&self, api_id: &str) -> Result<()> {
        self.store
            .call(self.capability, "delete_api_events", api_id.to_string(), |state| {
                state.drain_records(Capability::EventLatest, |r| {
                    r.references(ReferenceType::Api, api_id)
                });
                Ok(())
            })
    }

    async fn delete_or_update_events_by_environment(&self, environment_id: &str) -> Result<()> {
        self.store.call(
            self.capability,
            "delete_or_update_events_by_environment",
            environment_id.to_string(),
            |state| {
                state.drain_records(Capability::EventLatest, |r| {
                    r.environment_id.as_deref() == Some(environment_id)
                });
                Ok(())
            },
        )
    }
}
