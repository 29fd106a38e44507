//! Error types for the session fixture manager

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::phase::Phase;
use crate::role::Role;

/// Result type alias using [`FixtureError`].
pub type FixtureResult<T> = std::result::Result<T, FixtureError>;

#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("no credential registered for role '{role}'")]
    MissingCredential { role: Role },

    #[error("authentication as '{role}' timed out after {waited:?} waiting for redirect to {expected}")]
    AuthenticationTimeout {
        role: Role,
        expected: String,
        waited: Duration,
    },

    #[error("authentication as '{role}' rejected: landed on '{location}' instead of {expected}")]
    AuthenticationRejected {
        role: Role,
        expected: String,
        location: String,
    },

    #[error("failed to write snapshot for '{role}' to {path}: {source}")]
    StorageWrite {
        role: Role,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read snapshot for '{role}' from {path}: {source}")]
    StorageRead {
        role: Role,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no persisted session for role '{role}' at {path} (run the setup phase first)")]
    SessionNotFound { role: Role, path: PathBuf },

    #[error("snapshot for '{role}' is not valid storage-state JSON: {source}")]
    SnapshotFormat {
        role: Role,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot enter phase '{attempted}' from '{current}'")]
    PhaseOrder { attempted: Phase, current: Phase },

    #[error("browser driver error: {0}")]
    Driver(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
