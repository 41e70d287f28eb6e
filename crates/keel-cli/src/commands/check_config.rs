//! `keel check-config` - validate a configuration file.

use anyhow::Context;
use keel_core::KeelConfig;
use std::path::Path;

pub fn run(path: &Path) -> anyhow::Result<()> {
    let yaml = effective_config(path)?;
    println!("✔ {} is valid. Effective configuration:", path.display());
    println!();
    print!("{yaml}");
    Ok(())
}

/// Parse `path` and render it back with every default filled in.
fn effective_config(path: &Path) -> anyhow::Result<String> {
    let config = KeelConfig::from_file(path)
        .with_context(|| format!("invalid configuration {}", path.display()))?;
    Ok(serde_yaml::to_string(&config)?)
}
