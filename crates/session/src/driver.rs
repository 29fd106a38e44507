//! Browser abstraction consumed by the authenticator and binder
//!
//! The fixture manager never talks to an automation library directly;
//! it drives whatever implements [`BrowserPage`]. The e2e crate
//! provides the Playwright-backed implementation, tests provide
//! scripted fakes.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::FixtureResult;
use crate::role::Role;
use crate::snapshot::SessionSnapshot;

/// One browsing context with a single page. All operations carry an
/// implicit driver-side timeout; exceeding it surfaces as an error,
/// never a hang.
#[async_trait]
pub trait BrowserPage: Send {
    /// Navigate to a path relative to the application base URL.
    async fn goto(&mut self, path: &str) -> FixtureResult<()>;

    /// Wait until the page has no in-flight network requests.
    async fn wait_network_idle(&mut self, timeout: Duration) -> FixtureResult<()>;

    async fn click(&mut self, selector: &str) -> FixtureResult<()>;

    async fn fill(&mut self, selector: &str, value: &str) -> FixtureResult<()>;

    /// Current location path (no scheme/host), e.g. `/customer/coupons`.
    async fn current_path(&mut self) -> FixtureResult<String>;

    /// Capture the full browsing-context state (cookies + storage).
    async fn storage_state(&mut self) -> FixtureResult<SessionSnapshot>;

    /// Release the browsing context. Implementations holding external
    /// resources (a browser process, a socket) override this so the
    /// browser shuts down cleanly instead of being killed on drop.
    async fn close(&mut self) -> FixtureResult<()> {
        Ok(())
    }
}

/// Selectors of the login page the application exposes.
///
/// One actionable role-tab per role, an email input, a password input
/// and a submit control.
#[derive(Debug, Clone)]
pub struct LoginPage {
    pub path: String,
    pub email_input: String,
    pub password_input: String,
    pub submit_button: String,
    role_tab_prefix: String,
}

impl LoginPage {
    pub fn role_tab(&self, role: Role) -> String {
        format!("{}{}\"]", self.role_tab_prefix, role.as_str())
    }
}

impl Default for LoginPage {
    fn default() -> Self {
        Self {
            path: "/login".to_string(),
            email_input: "[data-testid=\"login-email\"]".to_string(),
            password_input: "[data-testid=\"login-password\"]".to_string(),
            submit_button: "[data-testid=\"login-submit\"]".to_string(),
            role_tab_prefix: "[data-testid=\"role-".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_tab_selector_embeds_role_name() {
        let page = LoginPage::default();
        assert_eq!(page.role_tab(Role::Company), "[data-testid=\"role-company\"]");
    }
}
