//! The handler seam.

use crate::error::HandlerError;
use crate::reply::Outcome;
use async_trait::async_trait;
use keel_core::{Capability, Command, CommandType};

/// Handles one command type.
///
/// A handler never replies itself; it returns an [`Outcome`] and the
/// dispatch registry builds the reply.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    fn command_type(&self) -> CommandType;

    /// Every capability this handler may call, for the consistency audit.
    fn capabilities(&self) -> &'static [Capability];

    async fn handle(&self, command: &Command) -> Outcome;
}

/// Outcome for a command routed to a handler of another type.
pub(crate) fn unexpected_payload(expected: CommandType, command: &Command) -> Outcome {
    let error = HandlerError::Invalid(format!(
        "expected a {expected} payload, got {}",
        command.command_type()
    ));
    Outcome::error(error.to_string())
}
