//! Failure taxonomy for target resolution and writes.

use std::{io, path::PathBuf};

pub type Result<T> = std::result::Result<T, TargetError>;

/// Errors returned by [`TargetWriter::try_write`](crate::TargetWriter::try_write).
///
/// None of these are retried. A creation failure leaves the name unresolved, so a later
/// write attempts creation again.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TargetError {
    /// The administrative gate is off.
    #[error("target logging is disabled")]
    Disabled,

    /// A file (plain or for the current rotation period) could not be opened.
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The command behind a `|` target could not be spawned.
    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// A `|` target with nothing after the sigil.
    #[error("pipe target has an empty command")]
    EmptyCommand,

    /// A rotating template that cannot drive rotation.
    #[error("invalid rotation template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },

    /// The message could not be written in full to an open handle.
    #[error("failed to write to '{target}': {source}")]
    Write {
        target: String,
        #[source]
        source: io::Error,
    },
}

impl TargetError {
    /// Whether the failure happened while creating a handle, as opposed to writing to one.
    pub fn is_creation_failure(&self) -> bool {
        matches!(
            self,
            TargetError::Open { .. }
                | TargetError::Spawn { .. }
                | TargetError::EmptyCommand
                | TargetError::InvalidTemplate { .. }
        )
    }
}
