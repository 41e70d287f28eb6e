//! Upstream service collaborators.
//!
//! These own effects outside raw storage (gateway deployment, the search
//! index, alert engines). They share the repository error contract.

use crate::error::Result;
use async_trait::async_trait;
use keel_core::{Alert, Dictionary, ExecutionContext, ReferenceType, SearchDocument};

#[async_trait]
pub trait ApiStateService: Send + Sync {
    /// Undeploy an API from the gateway on behalf of `user_id`.
    async fn stop(&self, ctx: &ExecutionContext, api_id: &str, user_id: &str) -> Result<()>;
}

#[async_trait]
pub trait DictionaryService: Send + Sync {
    /// Dictionaries of the context's environment.
    async fn find_all(&self, ctx: &ExecutionContext) -> Result<Vec<Dictionary>>;

    async fn stop(&self, ctx: &ExecutionContext, dictionary_id: &str) -> Result<()>;
}

#[async_trait]
pub trait IdentityProviderActivationService: Send + Sync {
    /// Deactivate every identity provider activated on the target.
    async fn remove_all_from_target(
        &self,
        ctx: &ExecutionContext,
        reference_id: &str,
        reference_type: ReferenceType,
    ) -> Result<()>;
}

#[async_trait]
pub trait AccessPointService: Send + Sync {
    /// Release the externally visible hosts and paths of the reference.
    async fn delete_access_points(
        &self,
        reference_type: ReferenceType,
        reference_id: &str,
    ) -> Result<()>;
}

#[async_trait]
pub trait SearchEngineService: Send + Sync {
    async fn delete(&self, ctx: &ExecutionContext, document: SearchDocument) -> Result<()>;
}

#[async_trait]
pub trait AlertService: Send + Sync {
    async fn find_by_reference(
        &self,
        reference_type: ReferenceType,
        reference_id: &str,
    ) -> Result<Vec<Alert>>;

    /// Delete one alert trigger. `reference_id` is the owner it was found under.
    async fn delete(&self, alert_id: &str, reference_id: &str) -> Result<()>;
}

#[async_trait]
pub trait ApplicationAlertService: Send + Sync {
    async fn delete_all(&self, application_id: &str) -> Result<()>;
}

#[async_trait]
pub trait EventService: Send + Sync {
    async fn delete_api_events(&self, api_id: &str) -> Result<()>;

    /// Delete events owned only by the environment; detach shared ones.
    async fn delete_or_update_events_by_environment(&self, environment_id: &str) -> Result<()>;
}
