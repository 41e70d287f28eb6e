//! `DELETE_ORGANIZATION` scenarios.

use super::common::*;
use keel_audit::AuditLogger;
use keel_core::{Capability, CommandStatus};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_organization_with_environments_is_refused() {
    let store = populated_store();
    let registry = registry(&store, AuditLogger::disabled());

    let reply = registry
        .dispatch(&delete_organization("cmd-org1", ORG_EXT))
        .await
        .unwrap();

    assert_eq!(reply.command_id, "cmd-org1");
    assert_eq!(reply.status, CommandStatus::Error);
    assert_eq!(
        reply.error_details.as_deref(),
        Some("Organization [cockpit-org#1] still contains 2 environment(s).")
    );
    assert!(store.mutations().is_empty());
}

#[tokio::test]
async fn test_empty_organization_is_deleted() {
    let store = populated_store();
    let registry = registry(&store, AuditLogger::disabled());

    let reply = registry
        .dispatch(&delete_organization("cmd-org9", EMPTY_ORG_EXT))
        .await
        .unwrap();
    assert!(reply.is_success());

    assert!(!store.contains(Capability::Organization, EMPTY_ORG));
    assert!(store.users().is_empty());
    assert!(store.tokens().is_empty());
    assert!(!store.contains(Capability::Membership, "membership#user1"));
    assert!(!store.contains(Capability::Membership, "membership#org9"));
    assert!(!store.contains(Capability::Role, "role#org9"));
    for capability in [Capability::Tag, Capability::Tenant, Capability::NotificationTemplate] {
        assert_eq!(store.count(capability), 0, "{capability:?}");
    }

    // The other organization keeps its data.
    assert!(store.contains(Capability::Organization, ORG));
    assert!(store.contains(Capability::Role, "role#org-user"));
    assert!(store.contains(Capability::Parameter, "parameter@env#2"));
}

#[tokio::test]
async fn test_organization_deleted_after_its_environments() {
    let store = populated_store();
    let registry = registry(&store, AuditLogger::disabled());

    for (id, external_id) in [("cmd-e2", ENV_EXT), ("cmd-e3", "cockpit-env#3")] {
        let reply = registry.dispatch(&delete_environment(id, external_id)).await.unwrap();
        assert!(reply.is_success());
    }
    let reply = registry.dispatch(&delete_organization("cmd-org1", ORG_EXT)).await.unwrap();

    assert!(reply.is_success());
    assert!(!store.contains(Capability::Organization, ORG));
    assert!(!store.contains(Capability::Role, "role#org-user"));
}

#[tokio::test]
async fn test_second_delivery_performs_no_mutation() {
    let store = populated_store();
    let registry = registry(&store, AuditLogger::disabled());

    registry.dispatch(&delete_organization("cmd-org9", EMPTY_ORG_EXT)).await;
    store.clear_journal();
    let reply = registry
        .dispatch(&delete_organization("cmd-org9", EMPTY_ORG_EXT))
        .await
        .unwrap();

    assert!(reply.is_success());
    assert!(store.mutations().is_empty());
}

#[tokio::test]
async fn test_redelivery_after_token_failure_removes_tokens() {
    let store = populated_store();
    let registry = registry(&store, AuditLogger::disabled());
    store.fail_on(Capability::Token, "delete_by_reference");

    let first = registry
        .dispatch(&delete_organization("cmd-org9", EMPTY_ORG_EXT))
        .await
        .unwrap();
    assert_eq!(first.status, CommandStatus::Error);
    // Users outlive a failed cascade so a redelivery can find their tokens.
    assert_eq!(store.users().len(), 2);

    store.clear_faults();
    let retry = registry
        .dispatch(&delete_organization("cmd-org9", EMPTY_ORG_EXT))
        .await
        .unwrap();

    assert!(retry.is_success());
    assert!(store.users().is_empty());
    assert!(store.tokens().is_empty());
    assert!(!store.contains(Capability::Membership, "membership#user1"));
    assert!(!store.contains(Capability::Organization, EMPTY_ORG));
}
