//! # keel-repository
//!
//! Collaborator contracts consumed by the Keel engine.
//!
//! - [`repository`]: storage collaborators, one per entity kind. Bulk deletes
//!   are idempotent and return the ids they removed.
//! - [`service`]: upstream services owning effects outside raw storage.
//! - [`Repositories`]: the wired capability set handed to handlers.
//! - [`MemoryStore`]: an in-memory implementation of all of the above that
//!   journals every call and supports fault injection.

pub mod error;
pub mod memory;
pub mod repositories;
pub mod repository;
pub mod service;

pub use error::{RepositoryError, Result};
pub use memory::{FixtureError, JournalEntry, MemoryCollection, MemoryStore, Record, StoreFixture};
pub use repositories::Repositories;
pub use repository::{
    ApiRepository, CommandRepository, EnvironmentRepository, EnvironmentScoped, MediaRepository,
    MembershipRepository, OrganizationRepository, ParentScoped, ReferenceScoped, RoleRepository,
    TokenRepository, UserRepository,
};
pub use service::{
    AccessPointService, AlertService, ApiStateService, ApplicationAlertService, DictionaryService,
    EventService, IdentityProviderActivationService, SearchEngineService,
};
