//! CLI command implementations for `keel`.

pub mod check_config;
pub mod consistency;
pub mod dispatch;
pub mod serve;

use anyhow::Context;
use keel_audit::AuditLogger;
use keel_core::KeelConfig;
use keel_repository::{MemoryStore, StoreFixture};
use std::path::Path;

/// Seed a store from `fixture`, or start empty.
pub(crate) fn load_store(fixture: Option<&Path>) -> anyhow::Result<MemoryStore> {
    let Some(path) = fixture else {
        return Ok(MemoryStore::new());
    };
    let fixture = StoreFixture::from_file(path)
        .with_context(|| format!("failed to load store fixture {}", path.display()))?;
    Ok(MemoryStore::from_fixture(fixture))
}

pub(crate) fn audit_logger(config: &KeelConfig) -> anyhow::Result<AuditLogger> {
    AuditLogger::new(config.audit.clone()).context("failed to open audit log")
}
