//! Explicit lifecycle ordering for the harness
//!
//! The three phases (setup, tests, cleanup) must run in order, each
//! strictly after the previous one completes. Rather than relying on
//! the surrounding test runner's implicit lifecycle, the ordering is a
//! declared dependency checked at runtime.

use std::fmt;

use crate::error::{FixtureError, FixtureResult};

/// Lifecycle phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    /// Nothing has run yet.
    Pending,
    /// Authenticate every role and persist the snapshots.
    Setup,
    /// Run the role-bound test groups.
    Tests,
    /// Delete all persisted snapshots.
    Cleanup,
}

impl Phase {
    fn next(&self) -> Option<Phase> {
        match self {
            Phase::Pending => Some(Phase::Setup),
            Phase::Setup => Some(Phase::Tests),
            Phase::Tests => Some(Phase::Cleanup),
            Phase::Cleanup => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Pending => "pending",
            Phase::Setup => "setup",
            Phase::Tests => "tests",
            Phase::Cleanup => "cleanup",
        };
        f.write_str(name)
    }
}

/// Tracks the current phase and rejects out-of-order transitions.
#[derive(Debug, Default)]
pub struct Lifecycle {
    current: Option<Phase>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Phase {
        self.current.unwrap_or(Phase::Pending)
    }

    /// Enter `phase`, failing unless it is the immediate successor of
    /// the current phase.
    pub fn enter(&mut self, phase: Phase) -> FixtureResult<()> {
        let current = self.current();
        if current.next() == Some(phase) {
            self.current = Some(phase);
            Ok(())
        } else {
            Err(FixtureError::PhaseOrder {
                attempted: phase,
                current,
            })
        }
    }
}
