//! `keel dispatch` - run one command against a fixture store.

use anyhow::Context;
use keel_core::{Command, KeelConfig, Reply};
use keel_repository::JournalEntry;
use keel_runtime::DispatchRegistry;
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Serialize)]
struct DispatchOutput {
    /// `None` when no handler accepts the command type.
    reply: Option<Reply>,
    #[serde(skip_serializing_if = "Option::is_none")]
    journal: Option<Vec<JournalEntry>>,
}

pub async fn run(
    config: &KeelConfig,
    store: &Path,
    command: &Path,
    journal: bool,
) -> anyhow::Result<()> {
    let output = execute(config, store, command, journal).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn execute(
    config: &KeelConfig,
    store: &Path,
    command: &Path,
    journal: bool,
) -> anyhow::Result<DispatchOutput> {
    let command = read_command(command)?;
    let store = super::load_store(Some(store))?;
    let audit = super::audit_logger(config)?;
    let registry = DispatchRegistry::standard(store.repositories(), audit, &config.runtime);

    let reply = registry.dispatch(&command).await;
    if reply.is_none() {
        tracing::warn!(command_id = %command.id, "No handler accepted the command");
    }

    Ok(DispatchOutput {
        reply,
        journal: journal.then(|| store.journal()),
    })
}

fn read_command(path: &Path) -> anyhow::Result<Command> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("{} is not a valid command", path.display()))
}
