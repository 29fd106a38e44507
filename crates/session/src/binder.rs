//! Read-only binding of test groups to persisted sessions

use std::path::PathBuf;
use tracing::debug;

use crate::error::FixtureResult;
use crate::role::Role;
use crate::snapshot::SessionSnapshot;
use crate::store::SessionStore;

/// A role's persisted session, resolved for one test run.
///
/// The binder never owns the underlying file; the path is handed to
/// the browser layer to initialize a fresh context, and the parsed
/// snapshot is available for assertions.
#[derive(Debug, Clone)]
pub struct BoundSession {
    pub role: Role,
    pub path: PathBuf,
    pub snapshot: SessionSnapshot,
}

/// Resolves a test group's declared role to its stored session before
/// any test body executes, replacing per-test login.
///
/// Binding is read-only and has no side effects on the store; a test
/// group declares its role once and every test in the group starts
/// already authenticated.
#[derive(Debug, Clone)]
pub struct FixtureBinder {
    store: SessionStore,
}

impl FixtureBinder {
    pub fn new(store: SessionStore) -> Self {
        Self { store }
    }

    /// Resolve `role` to its persisted snapshot. Fails with
    /// `SessionNotFound` when the setup phase has not produced one.
    pub fn bind(&self, role: Role) -> FixtureResult<BoundSession> {
        let snapshot = self.store.load(role)?;
        let path = self.store.path_for(role);
        debug!(role = %role, path = %path.display(), "bound test group to persisted session");
        Ok(BoundSession {
            role,
            path,
            snapshot,
        })
    }
}
