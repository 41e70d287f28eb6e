//! Declared capabilities against what handlers actually call.

use super::common::*;
use keel_audit::AuditLogger;
use keel_core::{Capability, Command, CredentialScope};
use keel_runtime::{ConsistencyAudit, EXEMPTIONS};
use pretty_assertions::assert_eq;

#[test]
fn test_standard_registry_passes_consistency_audit() {
    let store = populated_store();
    let report = ConsistencyAudit::run(&registry(&store, AuditLogger::disabled()));

    assert!(report.orphaned.is_empty(), "orphaned: {:?}", report.orphaned);
    assert!(report.stale_exemptions.is_empty(), "stale: {:?}", report.stale_exemptions);
    for (capability, _) in EXEMPTIONS {
        assert!(report.owners[capability].is_empty());
    }
}

/// Run `command` on a fresh populated store and compare the journal with the
/// handler's declaration.
async fn assert_touches_declared(command: Command) {
    let store = populated_store();
    let registry = registry(&store, AuditLogger::disabled());

    let reply = registry.dispatch(&command).await.unwrap();
    assert!(reply.is_success(), "{reply:?}");

    assert_eq!(
        store.touched_capabilities(),
        declared(&registry, &command),
        "{}",
        command.command_type()
    );
}

#[tokio::test]
async fn test_environment_cascade_touches_declared_capabilities() {
    assert_touches_declared(delete_environment("cmd-1", ENV_EXT)).await;
}

#[tokio::test]
async fn test_organization_cascade_touches_declared_capabilities() {
    assert_touches_declared(delete_organization("cmd-2", EMPTY_ORG_EXT)).await;
}

#[tokio::test]
async fn test_user_cascade_touches_declared_capabilities() {
    assert_touches_declared(delete_user("cmd-3", EMPTY_ORG_EXT, "sa-1")).await;
}

#[tokio::test]
async fn test_provisioning_touches_declared_capabilities() {
    assert_touches_declared(provision("cmd-4", "sa-new", CredentialScope::ApiPublisher)).await;
}

#[tokio::test]
async fn test_exempt_capabilities_are_removed_by_their_services() {
    let store = populated_store();
    let reply = registry(&store, AuditLogger::disabled())
        .dispatch(&delete_environment("cmd-5", ENV_EXT))
        .await
        .unwrap();
    assert!(reply.is_success());

    for event in ["event@env#2", "event@api#1", "event@api#2"] {
        assert!(!store.contains(Capability::EventLatest, event), "{event}");
    }
    for alert in ["alert#env", "alert#api1", "alert#app1"] {
        assert!(!store.contains(Capability::AlertTrigger, alert), "{alert}");
    }
    assert!(store.contains(Capability::EventLatest, "event@env#3"));
    assert!(store.contains(Capability::AlertTrigger, "alert#env9"));
}
