//! Couponly E2E Test Harness
//!
//! Rust-controlled end-to-end tests for the Couponly web app:
//! - Spawns the frontend preview server as a subprocess
//! - Controls Playwright through a long-lived Node bridge speaking
//!   JSON lines over stdio
//! - Parses declarative YAML test specs, each optionally bound to a
//!   user role's persisted session
//! - Runs the three lifecycle phases in order: authenticate every
//!   role once (setup), execute the role-bound test groups (tests),
//!   delete all persisted sessions (cleanup)
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                  E2E Suite Runner (Rust)                   │
//! ├────────────────────────────────────────────────────────────┤
//! │  SuiteRunner                                               │
//! │    ├── setup()    -> AppServer + per-role session files    │
//! │    ├── run()      -> SuiteResult (specs grouped by role)   │
//! │    └── cleanup()  -> SessionStore::clear()                 │
//! ├────────────────────────────────────────────────────────────┤
//! │  couponly-session                                          │
//! │    ├── Authenticator  (login flow per role, rate-spaced)   │
//! │    ├── SessionStore   (playwright/.auth/<role>.json)       │
//! │    └── FixtureBinder  (role -> storage-state path)         │
//! ├────────────────────────────────────────────────────────────┤
//! │  PlaywrightPage  (JSON-line bridge to a node controller)   │
//! └────────────────────────────────────────────────────────────┘
//! ```

pub mod cli;
pub mod error;
pub mod playwright;
pub mod runner;
pub mod server;
pub mod spec;

pub use error::{E2eError, E2eResult};
pub use runner::{RunnerConfig, SuiteResult, SuiteRunner};
pub use spec::{TestSpec, TestStep};
