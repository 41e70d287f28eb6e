//! `PROVISION_CREDENTIAL` and its inverse, `DELETE_USER`.

use super::common::*;
use keel_audit::{AuditEventType, AuditFilter, AuditLogger};
use keel_core::{Capability, CommandStatus, CredentialScope, ReferenceType};
use pretty_assertions::assert_eq;

fn created_users(store: &keel_repository::MemoryStore) -> usize {
    store.users().iter().filter(|u| u.organization_id == ORG).count()
}

#[tokio::test]
async fn test_provision_then_delete_user() {
    let store = populated_store();
    let registry = registry(&store, AuditLogger::disabled());

    let reply = registry
        .dispatch(&provision("cmd-p1", "sa-ci", CredentialScope::ApiPublisher))
        .await
        .unwrap();
    assert_eq!(reply.status, CommandStatus::Succeeded);

    let payload = reply.payload.unwrap();
    let user_id = payload["user_id"].as_str().unwrap().to_string();
    let token = payload["token"].as_str().unwrap();
    assert_eq!(token.len(), 43);

    let memberships: Vec<_> = store
        .memberships()
        .into_iter()
        .filter(|m| m.member_id == user_id)
        .map(|m| (m.reference_type, m.reference_id, m.role_id))
        .collect();
    assert_eq!(
        memberships.len(),
        2,
        "expected an organization and an environment membership"
    );
    assert!(memberships.contains(&(
        ReferenceType::Organization,
        ORG.to_string(),
        "role#org-user".to_string()
    )));
    assert!(memberships.contains(&(
        ReferenceType::Environment,
        ENV.to_string(),
        "role#env-publisher".to_string()
    )));

    let reply = registry
        .dispatch(&delete_user("cmd-d1", ORG_EXT, "sa-ci"))
        .await
        .unwrap();
    assert!(reply.is_success());
    assert_eq!(created_users(&store), 0);
    assert!(store.memberships().iter().all(|m| m.member_id != user_id));
    assert!(store.tokens().iter().all(|t| t.reference_id != user_id));
}

#[tokio::test]
async fn test_missing_environment_role_rolls_back() {
    let store = populated_store();
    let audit = AuditLogger::in_memory();
    let registry = registry(&store, audit.clone());
    let memberships_before = store.memberships().len();

    // No environment-scoped USER role is defined.
    let reply = registry
        .dispatch(&provision("cmd-p2", "sa-ro", CredentialScope::ReadOnly))
        .await
        .unwrap();

    assert_eq!(reply.command_id, "cmd-p2");
    assert_eq!(reply.status, CommandStatus::Error);
    assert!(
        reply
            .error_details
            .as_deref()
            .unwrap()
            .contains("Failed to assign environment role.")
    );
    assert_eq!(created_users(&store), 0);
    assert_eq!(store.memberships().len(), memberships_before);

    let events = audit.for_command("cmd-p2").await.unwrap();
    let types: Vec<_> = events.iter().map(|e| e.event_type).collect();
    assert_eq!(
        types,
        vec![
            AuditEventType::CommandReceived,
            AuditEventType::StepCompensated,
            AuditEventType::StepCompensated,
            AuditEventType::CommandFailed,
        ]
    );
    assert_eq!(events[3].stage.as_deref(), Some("ASSIGN_ENVIRONMENT_ROLE"));
}

#[tokio::test]
async fn test_token_failure_compensates_every_step() {
    let store = populated_store();
    let registry = registry(&store, AuditLogger::disabled());
    let memberships_before = store.memberships().len();
    let tokens_before = store.tokens().len();
    store.fail_on(Capability::Token, "create");

    let reply = registry
        .dispatch(&provision("cmd-p3", "sa-admin", CredentialScope::ApiPublisher))
        .await
        .unwrap();

    assert_eq!(reply.error_details.as_deref(), Some("Failed to create token."));
    assert_eq!(created_users(&store), 0);
    assert_eq!(store.memberships().len(), memberships_before);
    assert_eq!(store.tokens().len(), tokens_before);
}

#[tokio::test]
async fn test_failed_compensation_does_not_stop_rollback() {
    let store = populated_store();
    let audit = AuditLogger::in_memory();
    let registry = registry(&store, audit.clone());
    store.fail_on(Capability::Token, "create");
    store.fail_on(Capability::Membership, "delete");

    let reply = registry
        .dispatch(&provision("cmd-p4", "sa-x", CredentialScope::ApiPublisher))
        .await
        .unwrap();

    assert_eq!(reply.error_details.as_deref(), Some("Failed to create token."));
    // The user compensation ran after both membership compensations failed.
    assert_eq!(created_users(&store), 0);

    let failures = audit
        .query(AuditFilter {
            command_id: Some("cmd-p4".to_string()),
            event_type: Some(AuditEventType::CompensationFailed),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(failures.len(), 2);
}

#[tokio::test]
async fn test_redelivery_replies_same_credential_without_writes() {
    let store = populated_store();
    let registry = registry(&store, AuditLogger::disabled());

    let first = registry
        .dispatch(&provision("cmd-p5", "sa-1x", CredentialScope::Admin))
        .await
        .unwrap();
    assert!(first.is_success());
    let first = first.payload.unwrap();

    store.clear_journal();
    let second = registry
        .dispatch(&provision("cmd-p5", "sa-1x", CredentialScope::Admin))
        .await
        .unwrap();

    assert_eq!(second.command_id, "cmd-p5");
    assert!(second.is_success());
    let payload = second.payload.unwrap();
    assert_eq!(payload["user_id"], first["user_id"]);
    assert_eq!(payload["token_id"], first["token_id"]);
    assert!(payload.get("token").is_none());
    assert!(store.mutations().is_empty());
}

#[tokio::test]
async fn test_existing_user_with_other_scope_is_refused_before_any_write() {
    let store = populated_store();
    let registry = registry(&store, AuditLogger::disabled());

    let first = registry
        .dispatch(&provision("cmd-p6", "sa-1x", CredentialScope::Admin))
        .await
        .unwrap();
    assert!(first.is_success());

    store.clear_journal();
    let second = registry
        .dispatch(&provision("cmd-p7", "sa-1x", CredentialScope::ReadOnly))
        .await
        .unwrap();

    assert_eq!(second.status, CommandStatus::Error);
    assert_eq!(
        second.error_details.as_deref(),
        Some("A credential has already been provisioned for user [sa-1x].")
    );
    assert!(store.mutations().is_empty());
}

#[tokio::test]
async fn test_delete_unknown_user_succeeds() {
    let store = populated_store();
    let registry = registry(&store, AuditLogger::disabled());

    let reply = registry
        .dispatch(&delete_user("cmd-d2", ORG_EXT, "nobody"))
        .await
        .unwrap();

    assert!(reply.is_success());
    assert!(store.mutations().is_empty());
}
