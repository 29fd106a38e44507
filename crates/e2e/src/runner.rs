//! Main test runner orchestrating the three lifecycle phases
//!
//! Setup authenticates every role once and persists the snapshots;
//! the test phase binds each spec group to its role's snapshot and
//! executes the steps; cleanup deletes all snapshots so the next full
//! run authenticates fresh.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use couponly_session::wait::Poller;
use couponly_session::{
    Authenticator, BrowserPage, CredentialRegistry, FixtureBinder, FixtureError, Lifecycle, Phase,
    Role, SessionStore, DEFAULT_AUTH_DIR,
};

use crate::error::{E2eError, E2eResult};
use crate::playwright::{PlaywrightConfig, PlaywrightPage};
use crate::server::{AppServer, ServerConfig};
use crate::spec::{TestSpec, TestStep};

const PATH_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Result of executing a single step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    pub label: String,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Passed,
    Failed,
    /// The role's setup step failed, so this group never ran.
    Skipped,
}

/// Result of running a single test spec.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestOutcome {
    pub name: String,
    pub role: Option<Role>,
    pub status: TestStatus,
    pub duration_ms: u64,
    pub steps: Vec<StepReport>,
    pub error: Option<String>,
}

/// Result of running the whole suite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub outcomes: Vec<TestOutcome>,
}

/// Configuration for the suite runner.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Preview server to spawn; `None` targets an already-running app
    /// at `playwright.base_url`.
    pub server: Option<ServerConfig>,
    pub playwright: PlaywrightConfig,
    pub auth_dir: PathBuf,
    pub specs_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            server: Some(ServerConfig::default()),
            playwright: PlaywrightConfig::default(),
            auth_dir: PathBuf::from(DEFAULT_AUTH_DIR),
            specs_dir: PathBuf::from("specs"),
            output_dir: PathBuf::from("test-results"),
        }
    }
}

/// Orchestrates setup, test, and cleanup phases over the session
/// fixture manager and the Playwright bridge.
pub struct SuiteRunner {
    registry: CredentialRegistry,
    store: SessionStore,
    binder: FixtureBinder,
    lifecycle: Lifecycle,
    server_config: Option<ServerConfig>,
    playwright_config: PlaywrightConfig,
    specs_dir: PathBuf,
    output_dir: PathBuf,
    server: Option<AppServer>,
    setup_failures: HashMap<Role, String>,
}

impl SuiteRunner {
    pub fn with_config(config: RunnerConfig) -> Self {
        let store = SessionStore::new(config.auth_dir);
        Self {
            registry: CredentialRegistry::from_env(),
            binder: FixtureBinder::new(store.clone()),
            store,
            lifecycle: Lifecycle::new(),
            server_config: config.server,
            playwright_config: config.playwright,
            specs_dir: config.specs_dir,
            output_dir: config.output_dir,
            server: None,
            setup_failures: HashMap::new(),
        }
    }

    /// Setup phase: start the app server (if configured) and
    /// authenticate every role, persisting each session snapshot.
    ///
    /// Per-role authentication failures are recorded, not propagated;
    /// the corresponding test groups are skipped later with the cause
    /// attached. A missing credential still aborts the whole setup.
    pub async fn setup(&mut self) -> E2eResult<()> {
        self.lifecycle.enter(Phase::Setup)?;

        if let Some(server_config) = self.server_config.clone() {
            let server = AppServer::spawn(server_config).await?;
            self.playwright_config.base_url = server.base_url().to_string();
            self.server = Some(server);
        }

        let mut authenticator = Authenticator::default();
        let playwright = self.playwright_config.clone();
        let results = authenticator
            .setup_roles(&self.registry, &self.store, &Role::ALL, |_role| {
                let config = playwright.clone();
                async move {
                    PlaywrightPage::launch(&config)
                        .await
                        .map_err(|e| FixtureError::Driver(e.to_string()))
                }
            })
            .await?;

        for result in results {
            match result.outcome {
                Ok(path) => debug!(role = %result.role, path = %path.display(), "role ready"),
                Err(e) => {
                    self.setup_failures.insert(result.role, e.to_string());
                }
            }
        }

        info!(
            authenticated = Role::ALL.len() - self.setup_failures.len(),
            failed = self.setup_failures.len(),
            "setup phase complete"
        );
        Ok(())
    }

    /// Test phase: run every spec in the specs directory, optionally
    /// filtered by tag or name.
    pub async fn run(&mut self, tag: Option<&str>, name: Option<&str>) -> E2eResult<SuiteResult> {
        self.lifecycle.enter(Phase::Tests)?;

        let started_at = chrono::Utc::now();
        let start = Instant::now();

        let mut specs = TestSpec::load_all(&self.specs_dir)?;
        if let Some(tag) = tag {
            specs.retain(|s| s.has_tag(tag));
        }
        if let Some(name) = name {
            specs.retain(|s| s.name == name);
        }

        info!("Running {} test(s)...", specs.len());

        let mut outcomes = Vec::with_capacity(specs.len());
        let (mut passed, mut failed, mut skipped) = (0, 0, 0);

        for spec in &specs {
            let outcome = self.run_spec(spec).await?;
            match outcome.status {
                TestStatus::Passed => {
                    passed += 1;
                    info!("✓ {} ({} ms)", outcome.name, outcome.duration_ms);
                }
                TestStatus::Failed => {
                    failed += 1;
                    error!(
                        "✗ {} - {}",
                        outcome.name,
                        outcome.error.as_deref().unwrap_or("unknown error")
                    );
                }
                TestStatus::Skipped => {
                    skipped += 1;
                    warn!(
                        "- {} skipped: {}",
                        outcome.name,
                        outcome.error.as_deref().unwrap_or("setup failed")
                    );
                }
            }
            outcomes.push(outcome);
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Test Results: {} passed, {} failed, {} skipped ({} ms)",
            passed, failed, skipped, duration_ms
        );

        Ok(SuiteResult {
            started_at,
            total: specs.len(),
            passed,
            failed,
            skipped,
            duration_ms,
            outcomes,
        })
    }

    /// Cleanup phase: delete every persisted snapshot so the next full
    /// run authenticates fresh. Failures surface; they do not
    /// invalidate already-reported test results.
    pub async fn cleanup(&mut self) -> E2eResult<usize> {
        self.lifecycle.enter(Phase::Cleanup)?;

        if let Some(mut server) = self.server.take() {
            server.stop()?;
        }

        let removed = self.store.clear()?;
        info!(removed, "cleanup phase complete");
        Ok(removed)
    }

    /// Reason this spec cannot run, if its declared role failed setup.
    fn blocked_reason(&self, spec: &TestSpec) -> Option<String> {
        let role = spec.role?;
        self.setup_failures
            .get(&role)
            .map(|cause| format!("setup failed for role '{role}': {cause}"))
    }

    async fn run_spec(&mut self, spec: &TestSpec) -> E2eResult<TestOutcome> {
        let start = Instant::now();
        debug!("Running test: {}", spec.name);

        if let Some(reason) = self.blocked_reason(spec) {
            return Ok(TestOutcome {
                name: spec.name.clone(),
                role: spec.role,
                status: TestStatus::Skipped,
                duration_ms: 0,
                steps: vec![],
                error: Some(reason),
            });
        }

        // Bind the declared role to its persisted session before any
        // step executes; the test starts already authenticated.
        let storage_state = match spec.role {
            Some(role) => match self.binder.bind(role) {
                Ok(bound) => Some(bound.path),
                Err(e) => {
                    return Ok(TestOutcome {
                        name: spec.name.clone(),
                        role: spec.role,
                        status: TestStatus::Failed,
                        duration_ms: start.elapsed().as_millis() as u64,
                        steps: vec![],
                        error: Some(e.to_string()),
                    })
                }
            },
            None => None,
        };

        let mut playwright = self.playwright_config.clone();
        playwright.storage_state = storage_state;
        playwright.viewport_width = spec.viewport.width;
        playwright.viewport_height = spec.viewport.height;

        let mut page = PlaywrightPage::launch(&playwright).await?;

        let mut steps = Vec::with_capacity(spec.steps.len());
        let mut test_error = None;

        for step in &spec.steps {
            let step_start = Instant::now();
            let result = execute_step(&mut page, step).await;
            let duration_ms = step_start.elapsed().as_millis() as u64;

            match result {
                Ok(()) => steps.push(StepReport {
                    label: step.label(),
                    success: true,
                    duration_ms,
                    error: None,
                }),
                Err(e) => {
                    let reason = e.to_string();
                    steps.push(StepReport {
                        label: step.label(),
                        success: false,
                        duration_ms,
                        error: Some(reason.clone()),
                    });
                    test_error = Some(format!("{}: {reason}", step.label()));
                    break; // Stop on first failure
                }
            }
        }

        page.close().await?;

        let status = if test_error.is_none() {
            TestStatus::Passed
        } else {
            TestStatus::Failed
        };

        Ok(TestOutcome {
            name: spec.name.clone(),
            role: spec.role,
            status,
            duration_ms: start.elapsed().as_millis() as u64,
            steps,
            error: test_error,
        })
    }

    /// Write suite results to a JSON file under the output directory.
    pub fn write_results(&self, results: &SuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;

        let path = self.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

impl Drop for SuiteRunner {
    fn drop(&mut self) {
        if let Some(mut server) = self.server.take() {
            let _ = server.stop();
        }
    }
}

async fn execute_step(page: &mut PlaywrightPage, step: &TestStep) -> E2eResult<()> {
    match step {
        TestStep::Navigate { path } => {
            page.goto(path).await?;
        }
        TestStep::Click {
            selector,
            timeout_ms,
        } => match timeout_ms {
            Some(ms) => page.click_with_timeout(selector, *ms).await?,
            None => page.click(selector).await?,
        },
        TestStep::Fill { selector, value } => {
            page.fill(selector, value).await?;
        }
        TestStep::ExpectPath {
            pattern,
            timeout_ms,
        } => {
            expect_path(page, pattern, Duration::from_millis(*timeout_ms)).await?;
        }
        TestStep::ExpectVisible {
            selector,
            timeout_ms,
        } => {
            page.wait_visible(selector, *timeout_ms).await?;
        }
        TestStep::ExpectText {
            text,
            match_case,
            timeout_ms,
        } => {
            page.wait_text(text, *match_case, *timeout_ms).await?;
        }
        TestStep::Sleep { ms } => {
            tokio::time::sleep(Duration::from_millis(*ms)).await;
        }
    }
    Ok(())
}

/// Poll the location path until it matches `pattern`, bounded by
/// `timeout`. The wait is an explicit retry loop with a declared
/// success predicate rather than an automation-library call.
async fn expect_path(page: &mut PlaywrightPage, pattern: &str, timeout: Duration) -> E2eResult<()> {
    let re = regex::Regex::new(pattern).map_err(|source| E2eError::UrlPattern {
        pattern: pattern.to_string(),
        source,
    })?;

    let mut last = String::new();
    let mut poller = Poller::new(timeout, PATH_POLL_INTERVAL);
    while poller.next().await {
        last = page.current_path().await?;
        if re.is_match(&last) {
            return Ok(());
        }
    }

    Err(E2eError::StepFailed {
        step: format!("expect_path:{pattern}"),
        reason: format!("location stayed at '{last}' after {timeout:?}"),
    })
}
