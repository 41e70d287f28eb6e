//! Checks that every capability is either wired into a handler or exempt.
//!
//! A capability no handler declares means a delete cascade forgot an entity
//! kind, which would leave orphaned rows behind. The check is static: it reads
//! the handlers' declarations and never touches storage.

use crate::error::ConsistencyError;
use crate::registry::DispatchRegistry;
use keel_core::{Capability, CommandType};
use std::collections::BTreeMap;

/// Capabilities deliberately referenced by no handler, with the reason.
pub const EXEMPTIONS: &[(Capability, &str)] = &[
    (
        Capability::EventLatest,
        "owned by the event service's delete-or-update operation",
    ),
    (Capability::AlertTrigger, "owned by the alert services"),
    (Capability::Installation, "platform-wide record, not tenant data"),
];

pub fn exemption(capability: Capability) -> Option<&'static str> {
    EXEMPTIONS
        .iter()
        .find(|(exempt, _)| *exempt == capability)
        .map(|(_, reason)| *reason)
}

#[derive(Debug, Clone, Default)]
pub struct ConsistencyReport {
    /// Handlers declaring each capability. Every capability has an entry.
    pub owners: BTreeMap<Capability, Vec<CommandType>>,
    pub orphaned: Vec<Capability>,
    pub stale_exemptions: Vec<Capability>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.orphaned.is_empty() && self.stale_exemptions.is_empty()
    }

    pub fn into_result(self) -> Result<Self, ConsistencyError> {
        if !self.orphaned.is_empty() {
            return Err(ConsistencyError::Orphaned {
                orphaned: self.orphaned,
            });
        }
        if !self.stale_exemptions.is_empty() {
            return Err(ConsistencyError::StaleExemptions {
                stale: self.stale_exemptions,
            });
        }
        Ok(self)
    }
}

pub struct ConsistencyAudit;

impl ConsistencyAudit {
    pub fn run(registry: &DispatchRegistry) -> ConsistencyReport {
        let mut owners: BTreeMap<Capability, Vec<CommandType>> =
            Capability::ALL.iter().map(|c| (*c, Vec::new())).collect();

        for handler in registry.handlers() {
            for capability in handler.capabilities() {
                let entry = owners.entry(*capability).or_default();
                if !entry.contains(&handler.command_type()) {
                    entry.push(handler.command_type());
                }
            }
        }

        let mut report = ConsistencyReport::default();
        for (capability, handlers) in &owners {
            match (handlers.is_empty(), exemption(*capability).is_some()) {
                (true, false) => report.orphaned.push(*capability),
                (false, true) => report.stale_exemptions.push(*capability),
                _ => {}
            }
        }
        report.owners = owners;

        if report.is_consistent() {
            tracing::debug!(capabilities = report.owners.len(), "Consistency audit passed");
        } else {
            tracing::error!(
                orphaned = ?report.orphaned,
                stale_exemptions = ?report.stale_exemptions,
                "Consistency audit failed"
            );
        }
        report
    }
}
