//! `keel consistency` - print which handler owns each capability.

use keel_audit::AuditLogger;
use keel_core::RuntimeConfig;
use keel_repository::MemoryStore;
use keel_runtime::consistency::exemption;
use keel_runtime::{ConsistencyAudit, ConsistencyReport, DispatchRegistry};

/// Print the capability table. Returns `false` when the audit fails.
pub fn run() -> anyhow::Result<bool> {
    let registry = DispatchRegistry::standard(
        MemoryStore::new().repositories(),
        AuditLogger::disabled(),
        &RuntimeConfig::default(),
    );
    let report = ConsistencyAudit::run(&registry);
    print!("{}", render(&report));

    if report.is_consistent() {
        println!("✔ {} capabilities checked, all accounted for.", report.owners.len());
    } else {
        for capability in &report.orphaned {
            eprintln!("✗ {capability}: no handler references it and it is not exempt");
        }
        for capability in &report.stale_exemptions {
            eprintln!("✗ {capability}: exempt but referenced by a handler");
        }
    }
    Ok(report.is_consistent())
}

fn render(report: &ConsistencyReport) -> String {
    let width = report
        .owners
        .keys()
        .map(|c| c.to_string().len())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for (capability, handlers) in &report.owners {
        let owners = match exemption(*capability) {
            Some(reason) if handlers.is_empty() => format!("(exempt: {reason})"),
            _ => handlers
                .iter()
                .map(|h| h.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        };
        out.push_str(&format!("{:<width$}  {owners}\n", capability.to_string()));
    }
    out
}
