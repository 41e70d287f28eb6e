//! `keel serve` - JSON Lines command loop over stdin/stdout.
//!
//! Each stdin line is one command. Each reply is written as one stdout line,
//! in completion order. Lines that do not parse are logged and skipped.

use anyhow::Context;
use keel_core::{Command, KeelConfig, Reply};
use keel_runtime::{CommandWorker, DispatchRegistry};
use std::path::Path;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

pub async fn run(config: &KeelConfig, store: Option<&Path>) -> anyhow::Result<()> {
    let store = super::load_store(store)?;
    let audit = super::audit_logger(config)?;
    let registry = DispatchRegistry::standard(store.repositories(), audit, &config.runtime);
    let worker = CommandWorker::new(registry, &config.runtime).context("consistency audit failed")?;

    let handled = serve(
        &worker,
        config.runtime.max_in_flight,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await?;
    tracing::info!(handled, "Input closed, worker stopped");
    Ok(())
}

/// Feed `input` to `worker` and write replies to `output`. Returns the reply count.
async fn serve<R, W>(
    worker: &CommandWorker,
    capacity: usize,
    input: R,
    mut output: W,
) -> anyhow::Result<usize>
where
    R: AsyncBufRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin,
{
    let (command_tx, command_rx) = mpsc::channel(capacity.max(1));
    let (reply_tx, mut reply_rx) = mpsc::channel::<Reply>(capacity.max(1));

    let reader = tokio::spawn(read_commands(input, command_tx));

    let writer = async {
        while let Some(reply) = reply_rx.recv().await {
            let mut line = serde_json::to_vec(&reply)?;
            line.push(b'\n');
            output.write_all(&line).await?;
            output.flush().await?;
        }
        Ok::<(), anyhow::Error>(())
    };

    let (sent, written) = tokio::join!(worker.run(command_rx, reply_tx), writer);
    written?;
    reader.await.context("stdin reader panicked")??;
    Ok(sent)
}

async fn read_commands<R>(input: R, commands: mpsc::Sender<Command>) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut line_number = 0usize;
    while let Some(line) = lines.next_line().await? {
        line_number += 1;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Command>(&line) {
            Ok(command) => {
                if commands.send(command).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::warn!(line = line_number, error = %e, "Skipping unparseable command")
            }
        }
    }
    Ok(())
}
