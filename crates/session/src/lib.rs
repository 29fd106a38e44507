//! Couponly Session Fixture Manager
//!
//! Authenticates once per user role, persists each resulting session
//! snapshot to durable storage, hands the right snapshot to each test
//! group, and clears everything at the end of a run.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 Session Fixture Manager                  │
//! ├──────────────────────────────────────────────────────────┤
//! │  CredentialRegistry   role -> (email, password)          │
//! │  Authenticator        login flow -> SessionSnapshot      │
//! │    └── BrowserPage    trait seam to the automation layer │
//! │  SessionStore         <dir>/<role>.json, save/load/clear │
//! │  FixtureBinder        role -> BoundSession (read-only)   │
//! │  Lifecycle            setup -> tests -> cleanup, ordered │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The browser automation layer is injected through [`BrowserPage`];
//! this crate never links an automation library itself.

pub mod auth;
pub mod binder;
pub mod credentials;
pub mod driver;
pub mod error;
pub mod phase;
pub mod role;
pub mod snapshot;
pub mod store;
pub mod wait;

pub use auth::{Authenticator, RoleSetup, MIN_ATTEMPT_SPACING, REDIRECT_TIMEOUT};
pub use binder::{BoundSession, FixtureBinder};
pub use credentials::{Credential, CredentialRegistry};
pub use driver::{BrowserPage, LoginPage};
pub use error::{FixtureError, FixtureResult};
pub use phase::{Lifecycle, Phase};
pub use role::Role;
pub use snapshot::SessionSnapshot;
pub use store::{SessionStore, DEFAULT_AUTH_DIR};
