//! Per-role login flow and session capture

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::credentials::{Credential, CredentialRegistry};
use crate::driver::{BrowserPage, LoginPage};
use crate::error::{FixtureError, FixtureResult};
use crate::role::Role;
use crate::snapshot::SessionSnapshot;
use crate::store::SessionStore;
use crate::wait::Poller;

/// Bound on waiting for the post-login redirect.
pub const REDIRECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Bound on waiting for a quiescent network state.
pub const NETWORK_IDLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Minimum spacing between consecutive login attempts. The login
/// endpoint rate-limits aggressively; back-to-back attempts from the
/// setup phase trip it. The first attempt of a run is exempt.
pub const MIN_ATTEMPT_SPACING: Duration = Duration::from_secs(2);

/// Drives the login flow for one role at a time and captures the
/// resulting session snapshot.
///
/// Holds no browser state itself; each call operates on a caller-owned
/// [`BrowserPage`]. Attempt spacing is tracked across calls on the
/// same authenticator, which is why the setup phase uses a single
/// instance for all roles.
pub struct Authenticator {
    login_page: LoginPage,
    redirect_timeout: Duration,
    idle_timeout: Duration,
    min_spacing: Duration,
    last_attempt: Option<Instant>,
}

impl Default for Authenticator {
    fn default() -> Self {
        Self::new(LoginPage::default())
    }
}

impl Authenticator {
    pub fn new(login_page: LoginPage) -> Self {
        Self {
            login_page,
            redirect_timeout: REDIRECT_TIMEOUT,
            idle_timeout: NETWORK_IDLE_TIMEOUT,
            min_spacing: MIN_ATTEMPT_SPACING,
            last_attempt: None,
        }
    }

    #[cfg(test)]
    fn with_timeouts(mut self, redirect: Duration, spacing: Duration) -> Self {
        self.redirect_timeout = redirect;
        self.min_spacing = spacing;
        self
    }

    /// Log in as `role` and return the captured session snapshot.
    ///
    /// Failure is fatal for this role's setup step; there is no
    /// automatic retry. The attempt still counts toward the spacing of
    /// the next one.
    pub async fn authenticate<P: BrowserPage>(
        &mut self,
        page: &mut P,
        role: Role,
        credential: &Credential,
    ) -> FixtureResult<SessionSnapshot> {
        self.space_out().await;

        debug!(role = %role, "starting login flow");
        page.goto(&self.login_page.path).await?;
        // The login form renders asynchronously; interacting before the
        // page settles races the role-selector mount.
        page.wait_network_idle(self.idle_timeout).await?;

        page.click(&self.login_page.role_tab(role)).await?;
        page.fill(&self.login_page.email_input, &credential.email).await?;
        page.fill(&self.login_page.password_input, &credential.password).await?;
        page.click(&self.login_page.submit_button).await?;

        self.await_landing(page, role).await?;

        // A transient redirect can still bounce back to /login; only
        // trust the location once the network settles.
        page.wait_network_idle(self.idle_timeout).await?;
        let location = page.current_path().await?;
        if !role.is_landing(&location) {
            return Err(FixtureError::AuthenticationRejected {
                role,
                expected: role.landing_path(),
                location,
            });
        }

        let snapshot = page.storage_state().await?;
        info!(role = %role, cookies = snapshot.cookies.len(), "authenticated");
        Ok(snapshot)
    }

    /// Authenticate every role in `roles` sequentially, persisting each
    /// success to `store` immediately. One role's failure is recorded
    /// and does not block the remaining roles; a missing credential
    /// aborts the whole setup since the role set is closed and a hole
    /// in it is a configuration bug.
    pub async fn setup_roles<P, F, Fut>(
        &mut self,
        registry: &CredentialRegistry,
        store: &SessionStore,
        roles: &[Role],
        mut new_page: F,
    ) -> FixtureResult<Vec<RoleSetup>>
    where
        P: BrowserPage,
        F: FnMut(Role) -> Fut,
        Fut: Future<Output = FixtureResult<P>>,
    {
        let mut results = Vec::with_capacity(roles.len());
        for &role in roles {
            let credential = registry.lookup(role)?;
            let outcome = match new_page(role).await {
                Ok(mut page) => {
                    let attempt = self.authenticate(&mut page, role, credential).await;
                    // Close the page either way; a close failure must
                    // not mask the authentication outcome.
                    if let Err(e) = page.close().await {
                        warn!(role = %role, error = %e, "setup page did not close cleanly");
                    }
                    match attempt {
                        Ok(snapshot) => store.save(role, &snapshot),
                        Err(e) => Err(e),
                    }
                }
                Err(e) => Err(e),
            };

            if let Err(e) = &outcome {
                warn!(role = %role, error = %e, "role setup failed; continuing with remaining roles");
            }
            results.push(RoleSetup { role, outcome });
        }
        Ok(results)
    }

    /// Enforce the minimum delay between consecutive attempts. The
    /// very first attempt of a run proceeds immediately.
    async fn space_out(&mut self) {
        if let Some(last) = self.last_attempt {
            let resume_at = last + self.min_spacing;
            if resume_at > Instant::now() {
                debug!("spacing login attempt to respect rate limit");
                tokio::time::sleep_until(resume_at).await;
            }
        }
        self.last_attempt = Some(Instant::now());
    }

    /// Poll the browser location until it matches the role's landing
    /// path, bounded by the redirect timeout.
    async fn await_landing<P: BrowserPage>(
        &self,
        page: &mut P,
        role: Role,
    ) -> FixtureResult<()> {
        let mut poller = Poller::with_timeout(self.redirect_timeout);
        while poller.next().await {
            if role.is_landing(&page.current_path().await?) {
                return Ok(());
            }
        }
        Err(FixtureError::AuthenticationTimeout {
            role,
            expected: role.landing_path(),
            waited: self.redirect_timeout,
        })
    }
}

/// Outcome of one role's setup step: the saved snapshot path on
/// success, the surfaced failure otherwise.
#[derive(Debug)]
pub struct RoleSetup {
    pub role: Role,
    pub outcome: FixtureResult<PathBuf>,
}
