//! Repository collaborator contracts.
//!
//! Bulk deletes are idempotent: deleting nothing succeeds and returns an empty
//! list. The returned ids are the records actually removed, in a stable order.
//!
//! Child cascades are seeded from the `find_ids_*` lookups, taken before the
//! parents are deleted, so a cascade interrupted half-way still finds the
//! children of parents it already removed when it is run again. Parents are
//! only deleted once their children are gone.

use crate::error::Result;
use async_trait::async_trait;
use keel_core::{
    Api, Environment, Membership, Organization, ReferenceType, Role, RoleScope, Token, User,
};

/// Records hanging off a typed reference (`ENVIRONMENT`, `API`, `GROUP`, ...).
#[async_trait]
pub trait ReferenceScoped: Send + Sync {
    async fn find_ids_by_reference(
        &self,
        reference_id: &str,
        reference_type: ReferenceType,
    ) -> Result<Vec<String>>;

    async fn delete_by_reference(
        &self,
        reference_id: &str,
        reference_type: ReferenceType,
    ) -> Result<Vec<String>>;
}

/// Records owned by an environment.
#[async_trait]
pub trait EnvironmentScoped: Send + Sync {
    async fn find_ids_by_environment(&self, environment_id: &str) -> Result<Vec<String>>;

    async fn delete_by_environment(&self, environment_id: &str) -> Result<Vec<String>>;
}

/// Records owned by a single parent record (an API, a page, a rating).
#[async_trait]
pub trait ParentScoped: Send + Sync {
    async fn delete_by_parent(&self, parent_id: &str) -> Result<Vec<String>>;
}

#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<Organization>>;

    /// Idempotent.
    async fn delete(&self, id: &str) -> Result<()>;
}

#[async_trait]
pub trait EnvironmentRepository: Send + Sync {
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<Environment>>;

    async fn find_by_organization(&self, organization_id: &str) -> Result<Vec<Environment>>;

    /// Idempotent.
    async fn delete(&self, id: &str) -> Result<()>;
}

#[async_trait]
pub trait ApiRepository: EnvironmentScoped {
    /// APIs of the environment currently deployed on the gateway.
    async fn find_started_by_environment(&self, environment_id: &str) -> Result<Vec<Api>>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_external_id(
        &self,
        organization_id: &str,
        external_id: &str,
    ) -> Result<Option<User>>;

    /// Fails with `Conflict` when the organization already holds a user with
    /// the same external id.
    async fn create(&self, user: User) -> Result<User>;

    /// Idempotent.
    async fn delete(&self, id: &str) -> Result<()>;

    async fn find_ids_by_organization(&self, organization_id: &str) -> Result<Vec<String>>;

    async fn delete_by_organization(&self, organization_id: &str) -> Result<Vec<String>>;
}

#[async_trait]
pub trait RoleRepository: ReferenceScoped {
    /// Look up a role defined by `organization_id`.
    async fn find_by_scope_and_name(
        &self,
        scope: RoleScope,
        name: &str,
        organization_id: &str,
    ) -> Result<Option<Role>>;
}

#[async_trait]
pub trait MembershipRepository: ReferenceScoped {
    async fn create(&self, membership: Membership) -> Result<Membership>;

    /// Idempotent.
    async fn delete(&self, id: &str) -> Result<()>;

    async fn find_by_member(&self, member_id: &str) -> Result<Vec<Membership>>;

    /// Every membership held by `member_id`, whatever it points at.
    async fn delete_by_member(&self, member_id: &str) -> Result<Vec<String>>;
}

#[async_trait]
pub trait TokenRepository: ReferenceScoped {
    async fn create(&self, token: Token) -> Result<Token>;

    async fn find_by_user(&self, user_id: &str) -> Result<Vec<Token>>;

    /// Idempotent.
    async fn delete(&self, id: &str) -> Result<()>;
}

/// Media are stored per environment and, for API media, per API.
pub trait MediaRepository: EnvironmentScoped + ParentScoped {}

impl<T: EnvironmentScoped + ParentScoped> MediaRepository for T {}

/// Commands are stored per environment or per organization.
pub trait CommandRepository: EnvironmentScoped + ReferenceScoped {}

impl<T: EnvironmentScoped + ReferenceScoped> CommandRepository for T {}
