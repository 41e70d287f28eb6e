//! Channel-fed command worker.

use crate::consistency::ConsistencyAudit;
use crate::error::ConsistencyError;
use crate::registry::DispatchRegistry;
use keel_core::{Command, Reply, RuntimeConfig};
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::{JoinError, JoinSet};

/// Handles commands from a channel, each in its own task.
///
/// At most `max_in_flight` commands run at once. Replies are sent in
/// completion order; each carries its command's id.
pub struct CommandWorker {
    registry: Arc<DispatchRegistry>,
    max_in_flight: usize,
}

impl CommandWorker {
    /// Fails when `strict_consistency` is set and the registry leaves a
    /// capability unowned.
    pub fn new(
        registry: DispatchRegistry,
        config: &RuntimeConfig,
    ) -> Result<Self, ConsistencyError> {
        if config.strict_consistency {
            ConsistencyAudit::run(&registry).into_result()?;
        }
        Ok(Self {
            registry: Arc::new(registry),
            max_in_flight: config.max_in_flight.max(1),
        })
    }

    /// Run until `commands` closes and every in-flight command has replied.
    ///
    /// Returns the number of replies sent.
    pub async fn run(
        &self,
        mut commands: mpsc::Receiver<Command>,
        replies: mpsc::Sender<Reply>,
    ) -> usize {
        tracing::info!(max_in_flight = self.max_in_flight, "Command worker started");

        let permits = Arc::new(Semaphore::new(self.max_in_flight));
        let mut tasks = JoinSet::new();
        let mut sent = 0;

        while let Some(command) = commands.recv().await {
            let Ok(permit) = permits.clone().acquire_owned().await else {
                break;
            };
            let registry = self.registry.clone();
            let replies = replies.clone();

            tasks.spawn(async move {
                let _permit = permit;
                let command_id = command.id.clone();
                match registry.dispatch(&command).await {
                    Some(reply) => {
                        if replies.send(reply).await.is_err() {
                            tracing::warn!(
                                command_id = %command_id,
                                "Reply channel closed, dropping reply"
                            );
                            return false;
                        }
                        true
                    }
                    None => false,
                }
            });

            // Reap finished tasks so the set does not grow with the stream.
            while let Some(result) = tasks.try_join_next() {
                sent += tally(result);
            }
        }

        tracing::debug!(in_flight = tasks.len(), "Inbound channel closed, draining");
        while let Some(result) = tasks.join_next().await {
            sent += tally(result);
        }

        tracing::info!("Command worker stopped");
        sent
    }
}

/// 1 when the task sent a reply.
fn tally(result: Result<bool, JoinError>) -> usize {
    match result {
        Ok(replied) => usize::from(replied),
        Err(e) => {
            tracing::error!(error = %e, "Command task failed");
            0
        }
    }
}
