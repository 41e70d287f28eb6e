use clap::{Parser, Subcommand};
use keel_core::KeelConfig;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "keel", version, about = "Keel lifecycle command engine")]
struct Cli {
    /// Path to keel.yaml. Defaults apply when omitted.
    #[arg(long, global = true, env = "KEEL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Dispatch a single command against a store seeded from a fixture.
    Dispatch {
        /// YAML fixture seeding the in-memory store.
        #[arg(long)]
        store: PathBuf,

        /// JSON file holding one command.
        command: PathBuf,

        /// Also print every collaborator call the handler made.
        #[arg(long, default_value_t = false)]
        journal: bool,
    },

    /// Read JSON Lines commands from stdin and write JSON Lines replies to stdout.
    Serve {
        /// YAML fixture seeding the in-memory store.
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Check that every capability is owned by a handler or explicitly exempt.
    Consistency,

    /// Parse a configuration file and print the effective settings.
    CheckConfig {
        /// Path to keel.yaml.
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config);

    match cli.cmd {
        Command::Dispatch {
            store,
            command,
            journal,
        } => commands::dispatch::run(&config, &store, &command, journal).await?,

        Command::Serve { store } => commands::serve::run(&config, store.as_deref()).await?,

        Command::Consistency => {
            if !commands::consistency::run()? {
                std::process::exit(1);
            }
        }

        Command::CheckConfig { path } => commands::check_config::run(&path)?,
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<KeelConfig> {
    match path {
        Some(path) => KeelConfig::from_file(path)
            .map_err(|e| anyhow::anyhow!("failed to load {}: {e}", path.display())),
        None => Ok(KeelConfig::default()),
    }
}

/// Logs go to stderr so stdout stays free for replies.
fn init_tracing(config: &KeelConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if config.observability.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
