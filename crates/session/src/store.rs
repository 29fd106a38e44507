//! Persistent session storage, one snapshot file per role

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{FixtureError, FixtureResult};
use crate::role::Role;
use crate::snapshot::SessionSnapshot;

/// Default storage directory, matching the automation layer's
/// conventional auth-state location.
pub const DEFAULT_AUTH_DIR: &str = "playwright/.auth";

/// Filesystem-backed store of persisted session snapshots.
///
/// The directory is an explicit constructor argument rather than an
/// ambient default so concurrent runners in separate processes can be
/// pointed at isolated directories. The store exclusively owns the
/// files under its directory.
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Deterministic path of the snapshot file for `role`.
    pub fn path_for(&self, role: Role) -> PathBuf {
        self.dir.join(role.storage_file())
    }

    /// Write `snapshot` to the role's path, overwriting any prior
    /// content. There is at most one live snapshot per role; a new
    /// authentication run supersedes the old file.
    pub fn save(&self, role: Role, snapshot: &SessionSnapshot) -> FixtureResult<PathBuf> {
        let path = self.path_for(role);
        let json = snapshot
            .to_json()
            .map_err(|source| FixtureError::SnapshotFormat { role, source })?;

        let write = || -> std::io::Result<()> {
            std::fs::create_dir_all(&self.dir)?;
            std::fs::write(&path, json.as_bytes())
        };
        write().map_err(|source| FixtureError::StorageWrite {
            role,
            path: path.clone(),
            source,
        })?;

        debug!(role = %role, path = %path.display(), "session snapshot saved");
        Ok(path)
    }

    /// Read the role's persisted snapshot. A missing file means the
    /// setup phase has not run (or was cleared) and is reported as
    /// [`FixtureError::SessionNotFound`].
    pub fn load(&self, role: Role) -> FixtureResult<SessionSnapshot> {
        let path = self.path_for(role);
        let json = std::fs::read_to_string(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                FixtureError::SessionNotFound {
                    role,
                    path: path.clone(),
                }
            } else {
                FixtureError::StorageRead {
                    role,
                    path: path.clone(),
                    source,
                }
            }
        })?;

        SessionSnapshot::from_json(&json)
            .map_err(|source| FixtureError::SnapshotFormat { role, source })
    }

    /// Delete every file in the storage directory, logging each
    /// deletion. A missing directory is a no-op, not an error, so
    /// calling `clear` twice in a row is idempotent.
    ///
    /// Returns the number of files removed.
    pub fn clear(&self) -> FixtureResult<usize> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(dir = %self.dir.display(), "no session directory to clear");
                return Ok(0);
            }
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        for entry in entries {
            let path = entry?.path();
            if path.is_file() {
                std::fs::remove_file(&path)?;
                info!(path = %path.display(), "deleted session snapshot");
                removed += 1;
            }
        }
        Ok(removed)
    }
}
