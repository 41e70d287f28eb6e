//! `DELETE_ENVIRONMENT` scenarios.

use super::common::*;
use keel_audit::{AuditEventType, AuditLogger};
use keel_core::{Capability, CommandStatus, LifecycleState};
use pretty_assertions::assert_eq;

// =============================================================================
// FULL CASCADE
// =============================================================================

#[tokio::test]
async fn test_delete_environment_env2() {
    let store = populated_store();
    let registry = registry(&store, AuditLogger::disabled());

    let reply = registry
        .dispatch(&delete_environment("cmd-env2", ENV_EXT))
        .await
        .unwrap();

    assert_eq!(reply.command_id, "cmd-env2");
    assert_eq!(reply.status, CommandStatus::Succeeded);

    // Per API.
    for api in ["api#1", "api#2"] {
        let reference = format!("API:{api}");
        for capability in [
            Capability::Membership,
            Capability::GenericNotificationConfig,
            Capability::PortalNotificationConfig,
            Capability::Page,
        ] {
            assert!(store.was_called(capability, "delete_by_reference", &reference));
        }
    }

    // Per group.
    for group in ["group#1", "group#2"] {
        let reference = format!("GROUP:{group}");
        assert!(store.was_called(Capability::Membership, "delete_by_reference", &reference));
        assert!(store.was_called(Capability::Invitation, "delete_by_reference", &reference));
    }

    // Environment level.
    let reference = format!("ENVIRONMENT:{ENV}");
    for capability in [
        Capability::Parameter,
        Capability::Audit,
        Capability::CustomUserFields,
        Capability::Role,
        Capability::Theme,
    ] {
        assert!(
            store.was_called(capability, "delete_by_reference", &reference),
            "{capability:?}"
        );
    }
    for capability in [Capability::Category, Capability::Command, Capability::Subscription] {
        assert!(store.was_called(capability, "delete_by_environment", ENV), "{capability:?}");
    }

    assert!(!store.contains(Capability::Environment, ENV));
}

#[tokio::test]
async fn test_started_apis_are_stopped_first() {
    let store = populated_store();
    let registry = registry(&store, AuditLogger::disabled());

    registry.dispatch(&delete_environment("cmd-1", ENV_EXT)).await;

    assert!(store.was_called(Capability::ApiStateService, "stop", "api#1"));
    assert!(!store.was_called(Capability::ApiStateService, "stop", "api#2"));
    assert!(store.was_called(Capability::DictionaryService, "stop", "dictionary#1"));

    let journal = store.journal();
    let first_delete = journal
        .iter()
        .position(|e| e.operation.starts_with("delete_by"))
        .unwrap();
    let last_stop = journal
        .iter()
        .rposition(|e| e.operation == "stop" || e.operation == "remove_all_from_target")
        .unwrap();
    assert!(last_stop < first_delete);
}

#[tokio::test]
async fn test_neighbour_environment_is_untouched() {
    let store = populated_store();
    let registry = registry(&store, AuditLogger::disabled());

    registry.dispatch(&delete_environment("cmd-1", ENV_EXT)).await;

    assert!(store.contains(Capability::Environment, NEIGHBOUR_ENV));
    assert_eq!(store.api("api#9").unwrap().lifecycle_state, LifecycleState::Started);
    assert!(store.contains(Capability::Dictionary, "dictionary#9"));
    assert!(store.contains(Capability::AlertTrigger, "alert#env9"));
    assert!(store.contains(Capability::Membership, "membership#env9"));
    assert!(store.contains(Capability::Subscription, "subscription@env#3"));
    assert!(store.contains(Capability::Parameter, "parameter@env#3"));
    assert!(store.contains(Capability::Page, "page@env#3"));
    assert_eq!(store.count(Capability::SearchEngineService), 1);

    // Everything owned by env#2 is gone.
    assert_eq!(store.count(Capability::Api), 1);
    assert_eq!(store.count(Capability::Application), 0);
    assert_eq!(store.count(Capability::Plan), 0);
    assert_eq!(store.count(Capability::Group), 0);
    assert_eq!(store.count(Capability::Rating), 0);
    assert_eq!(store.count(Capability::RatingAnswer), 0);
    assert_eq!(store.count(Capability::PageRevision), 1);
    assert_eq!(store.count(Capability::EventLatest), 1);
    assert_eq!(store.count(Capability::AlertTrigger), 1);
}

// =============================================================================
// IDEMPOTENCE AND RE-DELIVERY
// =============================================================================

#[tokio::test]
async fn test_second_delivery_performs_no_mutation() {
    let store = populated_store();
    let registry = registry(&store, AuditLogger::disabled());

    let first = registry.dispatch(&delete_environment("cmd-1", ENV_EXT)).await.unwrap();
    store.clear_journal();
    let second = registry.dispatch(&delete_environment("cmd-1", ENV_EXT)).await.unwrap();

    assert!(first.is_success());
    assert!(second.is_success());
    assert!(store.mutations().is_empty());
}

#[tokio::test]
async fn test_unknown_environment_succeeds() {
    let store = populated_store();
    let audit = AuditLogger::in_memory();
    let registry = registry(&store, audit.clone());

    let reply = registry
        .dispatch(&delete_environment("cmd-ghost", "cockpit-env#404"))
        .await
        .unwrap();

    assert_eq!(reply.status, CommandStatus::Succeeded);
    assert!(reply.error_details.is_none());
    assert!(store.mutations().is_empty());

    let events = audit.for_command("cmd-ghost").await.unwrap();
    assert_eq!(events.last().unwrap().event_type, AuditEventType::TargetNotFound);
}

#[tokio::test]
async fn test_partial_failure_is_completed_by_redelivery() {
    let store = populated_store();
    let audit = AuditLogger::in_memory();
    let registry = registry(&store, audit.clone());
    store.fail_on(Capability::Plan, "delete_by_environment");

    let reply = registry.dispatch(&delete_environment("cmd-1", ENV_EXT)).await.unwrap();
    assert_eq!(reply.status, CommandStatus::Error);
    assert_eq!(
        reply.error_details.as_deref(),
        Some("Error occurred when deleting environment with id [cockpit-env#2].")
    );

    // Steps before the failure stay applied; no rollback.
    assert_eq!(store.count(Capability::Application), 0);
    assert!(store.contains(Capability::Environment, ENV));
    assert!(store.contains(Capability::Plan, "plan#1"));

    let failed = audit.for_command("cmd-1").await.unwrap();
    let failed = failed.last().unwrap();
    assert_eq!(failed.event_type, AuditEventType::CommandFailed);
    assert_eq!(failed.stage.as_deref(), Some("CASCADE_DELETE"));

    store.clear_faults();
    let retry = registry.dispatch(&delete_environment("cmd-1", ENV_EXT)).await.unwrap();
    assert!(retry.is_success());
    assert!(!store.contains(Capability::Environment, ENV));
    assert_eq!(store.count(Capability::Plan), 0);
}

/// Fail `operation` once, redeliver, and compare with an uninterrupted run.
async fn assert_redelivery_matches_clean_run(capability: Capability, operation: &'static str) {
    let clean = populated_store();
    let reply = registry(&clean, AuditLogger::disabled())
        .dispatch(&delete_environment("cmd-1", ENV_EXT))
        .await
        .unwrap();
    assert!(reply.is_success());

    let store = populated_store();
    let registry = registry(&store, AuditLogger::disabled());
    store.fail_on(capability, operation);
    let first = registry.dispatch(&delete_environment("cmd-1", ENV_EXT)).await.unwrap();
    assert_eq!(first.status, CommandStatus::Error, "{capability:?}::{operation}");
    assert!(store.contains(Capability::Environment, ENV));

    store.clear_faults();
    let retry = registry.dispatch(&delete_environment("cmd-1", ENV_EXT)).await.unwrap();
    assert!(retry.is_success());
    for kind in Capability::ALL {
        assert_eq!(
            store.count(kind),
            clean.count(kind),
            "{kind:?} after failing {capability:?}::{operation}"
        );
    }
}

#[tokio::test]
async fn test_redelivery_after_rating_answer_failure_removes_answers() {
    assert_redelivery_matches_clean_run(Capability::RatingAnswer, "delete_by_parent").await;
}

#[tokio::test]
async fn test_redelivery_after_page_revision_failure_removes_revisions() {
    assert_redelivery_matches_clean_run(Capability::PageRevision, "delete_by_parent").await;
}

#[tokio::test]
async fn test_redelivery_after_child_failures_removes_children() {
    for (capability, operation) in [
        (Capability::Workflow, "delete_by_reference"),
        (Capability::Flow, "delete_by_reference"),
        (Capability::Invitation, "delete_by_reference"),
        (Capability::SearchEngineService, "delete"),
    ] {
        assert_redelivery_matches_clean_run(capability, operation).await;
    }
}

#[tokio::test]
async fn test_disable_failure_is_reported_at_disable() {
    let store = populated_store();
    let audit = AuditLogger::in_memory();
    let registry = registry(&store, audit.clone());
    store.fail_on(Capability::ApiStateService, "stop");

    let reply = registry.dispatch(&delete_environment("cmd-1", ENV_EXT)).await.unwrap();
    assert_eq!(reply.status, CommandStatus::Error);

    let events = audit.for_command("cmd-1").await.unwrap();
    assert_eq!(events.last().unwrap().stage.as_deref(), Some("DISABLE"));
    assert_eq!(store.count(Capability::Api), 3);
}
