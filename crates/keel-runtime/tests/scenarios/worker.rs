//! The worker over the standard registry.

use super::common::*;
use keel_audit::AuditLogger;
use keel_core::{CommandStatus, CredentialScope, Reply, RuntimeConfig};
use keel_runtime::{CommandWorker, DispatchRegistry};
use std::collections::HashMap;
use tokio::sync::mpsc;

#[tokio::test]
async fn test_mixed_commands_each_get_one_correlated_reply() {
    let store = populated_store();
    let config = RuntimeConfig {
        max_in_flight: 3,
        parallel_subcascades: true,
        ..Default::default()
    };
    let repos = store.repositories();
    let registry = DispatchRegistry::standard(repos, AuditLogger::disabled(), &config);
    let worker = CommandWorker::new(registry, &config).unwrap();

    let commands = vec![
        delete_environment("w-1", "cockpit-env#3"),
        delete_organization("w-2", EMPTY_ORG_EXT),
        provision("w-3", "sa-worker", CredentialScope::ApiPublisher),
        delete_environment("w-4", "cockpit-env#404"),
        delete_user("w-5", ORG_EXT, "nobody"),
    ];
    let expected = commands.len();

    let (command_tx, command_rx) = mpsc::channel(expected);
    let (reply_tx, mut reply_rx) = mpsc::channel(expected);
    for command in commands {
        command_tx.send(command).await.unwrap();
    }
    drop(command_tx);

    assert_eq!(worker.run(command_rx, reply_tx).await, expected);

    let mut replies: HashMap<String, Reply> = HashMap::new();
    while let Some(reply) = reply_rx.recv().await {
        assert!(replies.insert(reply.command_id.clone(), reply).is_none());
    }
    assert_eq!(replies.len(), expected);
    for reply in replies.values() {
        assert_eq!(reply.status, CommandStatus::Succeeded, "{reply:?}");
    }
    assert!(replies["w-3"].payload.is_some());
}
