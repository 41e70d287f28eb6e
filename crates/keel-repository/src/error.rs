//! Error type shared by every repository and service collaborator.

use keel_core::Capability;
use thiserror::Error;

/// A collaborator call failed. Calls never partially apply.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The backing store or service could not be reached.
    #[error("{capability} unavailable: {message}")]
    Unavailable {
        capability: Capability,
        message: String,
    },

    /// The write clashed with existing data.
    #[error("{capability} conflict: {message}")]
    Conflict {
        capability: Capability,
        message: String,
    },

    /// A single-record operation addressed a record that does not exist.
    #[error("{capability} [{id}] not found")]
    NotFound { capability: Capability, id: String },

    /// Any other collaborator-internal failure.
    #[error(transparent)]
    Technical(#[from] anyhow::Error),
}

impl RepositoryError {
    pub fn unavailable(capability: Capability, message: impl Into<String>) -> Self {
        Self::Unavailable {
            capability,
            message: message.into(),
        }
    }

    pub fn conflict(capability: Capability, message: impl Into<String>) -> Self {
        Self::Conflict {
            capability,
            message: message.into(),
        }
    }

    pub fn not_found(capability: Capability, id: impl Into<String>) -> Self {
        Self::NotFound {
            capability,
            id: id.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
