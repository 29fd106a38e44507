//! Playwright browser automation
//!
//! Rather than spawning one Node process per step, the harness keeps a
//! single long-lived controller process per browsing context. The
//! controller script reads one JSON command per stdin line and writes
//! one JSON reply per stdout line, so a login flow and the tests that
//! follow it run inside one consistent browser session.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command as TokioCommand};
use tracing::{debug, warn};

use couponly_session::{BrowserPage, FixtureError, FixtureResult, SessionSnapshot};

use crate::error::{E2eError, E2eResult};

/// Default per-command timeout on the Rust side of the bridge. Browser
/// waits carry their own (shorter) timeouts inside the command.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

/// Default timeout for element interactions.
const CLICK_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, Copy, Default)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

/// Configuration for one browsing context.
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub base_url: String,
    pub browser: Browser,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,

    /// Persisted storage-state file to initialize the context from.
    /// `None` starts an unauthenticated context.
    pub storage_state: Option<PathBuf>,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:4173".to_string(),
            browser: Browser::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            storage_state: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Reply {
    // i64 because the controller answers unparseable requests with -1.
    id: i64,
    ok: bool,
    #[serde(default)]
    value: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// One page in one browsing context, backed by a controller process.
pub struct PlaywrightPage {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    next_id: u64,
    // The controller script lives here for the lifetime of the page.
    _workdir: tempfile::TempDir,
}

impl PlaywrightPage {
    /// Spawn a controller process and open a page.
    pub async fn launch(config: &PlaywrightConfig) -> E2eResult<Self> {
        check_playwright_installed()?;

        let workdir = tempfile::tempdir()?;
        let script_path = workdir.path().join("controller.js");
        std::fs::write(&script_path, controller_script(config))?;

        debug!(script = %script_path.display(), "spawning browser controller");

        let mut child = TokioCommand::new("node")
            .arg(&script_path)
            .current_dir(workdir.path())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| E2eError::Bridge(format!("failed to spawn node: {e}")))?;

        let stdin = child.stdin.take().ok_or(E2eError::BridgeClosed)?;
        let stdout = child.stdout.take().ok_or(E2eError::BridgeClosed)?;

        let mut page = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            next_id: 0,
            _workdir: workdir,
        };

        // The controller reports once the browser and context are up.
        let ready = page.read_reply().await?;
        if !ready.ok {
            return Err(E2eError::Bridge(
                ready.error.unwrap_or_else(|| "controller failed to start".into()),
            ));
        }

        Ok(page)
    }

    /// Send one command and wait for its reply.
    async fn send(&mut self, mut cmd: Value) -> E2eResult<Option<Value>> {
        self.next_id += 1;
        let id = self.next_id;
        cmd["id"] = json!(id);

        let mut line = serde_json::to_string(&cmd)?;
        line.push('\n');
        self.stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| E2eError::Bridge(format!("bridge write failed: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| E2eError::Bridge(format!("bridge flush failed: {e}")))?;

        let reply = self.read_reply().await?;
        if reply.id != id as i64 {
            return Err(E2eError::Bridge(format!(
                "out-of-order reply: expected id {id}, got {}",
                reply.id
            )));
        }
        if reply.ok {
            Ok(reply.value)
        } else {
            Err(E2eError::Bridge(
                reply.error.unwrap_or_else(|| "unknown bridge error".into()),
            ))
        }
    }

    async fn read_reply(&mut self) -> E2eResult<Reply> {
        let line = tokio::time::timeout(COMMAND_TIMEOUT, self.stdout.next_line())
            .await
            .map_err(|_| E2eError::Timeout("browser bridge reply".into()))?
            .map_err(|e| E2eError::Bridge(format!("bridge read failed: {e}")))?
            .ok_or(E2eError::BridgeClosed)?;
        Ok(serde_json::from_str(&line)?)
    }

    /// Click with an explicit element timeout.
    pub async fn click_with_timeout(&mut self, selector: &str, timeout_ms: u64) -> E2eResult<()> {
        self.send(json!({ "cmd": "click", "selector": selector, "timeoutMs": timeout_ms }))
            .await?;
        Ok(())
    }

    /// Wait for an element to become visible.
    pub async fn wait_visible(&mut self, selector: &str, timeout_ms: u64) -> E2eResult<()> {
        self.send(json!({ "cmd": "visible", "selector": selector, "timeoutMs": timeout_ms }))
            .await?;
        Ok(())
    }

    /// Wait for the given text to become visible anywhere on the page.
    /// Matching is case-insensitive unless `match_case` is set.
    pub async fn wait_text(
        &mut self,
        text: &str,
        match_case: bool,
        timeout_ms: u64,
    ) -> E2eResult<()> {
        self.send(json!({
            "cmd": "textVisible",
            "text": text,
            "matchCase": match_case,
            "timeoutMs": timeout_ms,
        }))
        .await?;
        Ok(())
    }

    /// Close the browser and let the controller exit cleanly, falling
    /// back to killing the process if the bridge is already gone.
    async fn shutdown(&mut self) -> E2eResult<()> {
        if let Err(e) = self.send(json!({ "cmd": "close" })).await {
            warn!(error = %e, "browser controller did not close cleanly");
            let _ = self.child.start_kill();
        }
        let _ = self.child.wait().await;
        Ok(())
    }
}

#[async_trait]
impl BrowserPage for PlaywrightPage {
    async fn goto(&mut self, path: &str) -> FixtureResult<()> {
        self.send(json!({ "cmd": "goto", "path": path }))
            .await
            .map_err(driver_err)?;
        Ok(())
    }

    async fn wait_network_idle(&mut self, timeout: Duration) -> FixtureResult<()> {
        self.send(json!({ "cmd": "idle", "timeoutMs": timeout.as_millis() as u64 }))
            .await
            .map_err(driver_err)?;
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> FixtureResult<()> {
        self.click_with_timeout(selector, CLICK_TIMEOUT_MS)
            .await
            .map_err(driver_err)
    }

    async fn fill(&mut self, selector: &str, value: &str) -> FixtureResult<()> {
        self.send(json!({ "cmd": "fill", "selector": selector, "value": value }))
            .await
            .map_err(driver_err)?;
        Ok(())
    }

    async fn current_path(&mut self) -> FixtureResult<String> {
        let value = self
            .send(json!({ "cmd": "path" }))
            .await
            .map_err(driver_err)?
            .ok_or_else(|| FixtureError::Driver("path command returned no value".into()))?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| FixtureError::Driver("path command returned a non-string".into()))
    }

    async fn storage_state(&mut self) -> FixtureResult<SessionSnapshot> {
        let value = self
            .send(json!({ "cmd": "storageState" }))
            .await
            .map_err(driver_err)?
            .ok_or_else(|| FixtureError::Driver("storageState returned no value".into()))?;
        serde_json::from_value(value)
            .map_err(|e| FixtureError::Driver(format!("bad storage state: {e}")))
    }

    async fn close(&mut self) -> FixtureResult<()> {
        self.shutdown().await.map_err(driver_err)
    }
}

fn driver_err(e: E2eError) -> FixtureError {
    FixtureError::Driver(e.to_string())
}

/// Check if Playwright is installed.
fn check_playwright_installed() -> E2eResult<()> {
    let output = std::process::Command::new("npx")
        .args(["playwright", "--version"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match output {
        Ok(status) if status.success() => Ok(()),
        _ => Err(E2eError::PlaywrightNotFound),
    }
}

/// Anchor a snapshot path to the harness working directory. The
/// controller process runs from a scratch dir, so a relative path
/// handed straight to Playwright would resolve against the wrong
/// place and the snapshot would never be found.
fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

/// Build the controller script for one browsing context.
fn controller_script(config: &PlaywrightConfig) -> String {
    let base_url = json!(config.base_url);
    let storage_state = match &config.storage_state {
        Some(path) => {
            let path = absolutize(path);
            format!(",\n    storageState: {}", json!(path.to_string_lossy()))
        }
        None => String::new(),
    };

    format!(
        r#"
const {{ chromium, firefox, webkit }} = require('playwright');
const readline = require('readline');

const reply = (msg) => process.stdout.write(JSON.stringify(msg) + '\n');

(async () => {{
  const browser = await {browser}.launch({{ headless: {headless} }});
  const context = await browser.newContext({{
    baseURL: {base_url},
    viewport: {{ width: {width}, height: {height} }}{storage_state}
  }});
  const page = await context.newPage();
  reply({{ id: 0, ok: true }});

  const rl = readline.createInterface({{ input: process.stdin }});
  for await (const line of rl) {{
    let req;
    try {{
      req = JSON.parse(line);
    }} catch (error) {{
      reply({{ id: -1, ok: false, error: 'bad request: ' + error.message }});
      continue;
    }}
    try {{
      switch (req.cmd) {{
        case 'goto':
          await page.goto(req.path, {{ waitUntil: 'load' }});
          reply({{ id: req.id, ok: true }});
          break;
        case 'idle':
          await page.waitForLoadState('networkidle', {{ timeout: req.timeoutMs }});
          reply({{ id: req.id, ok: true }});
          break;
        case 'click':
          await page.click(req.selector, {{ timeout: req.timeoutMs }});
          reply({{ id: req.id, ok: true }});
          break;
        case 'fill':
          await page.fill(req.selector, req.value);
          reply({{ id: req.id, ok: true }});
          break;
        case 'path':
          reply({{ id: req.id, ok: true, value: new URL(page.url()).pathname }});
          break;
        case 'visible':
          await page.waitForSelector(req.selector, {{ state: 'visible', timeout: req.timeoutMs }});
          reply({{ id: req.id, ok: true }});
          break;
        case 'textVisible': {{
          const escaped = req.text.replace(/[.*+?^${{}}()|[\]\\]/g, '\\$&');
          const pattern = new RegExp(escaped, req.matchCase ? '' : 'i');
          await page.getByText(pattern).first().waitFor({{ state: 'visible', timeout: req.timeoutMs }});
          reply({{ id: req.id, ok: true }});
          break;
        }}
        case 'storageState':
          reply({{ id: req.id, ok: true, value: await context.storageState() }});
          break;
        case 'close':
          reply({{ id: req.id, ok: true }});
          await browser.close();
          process.exit(0);
        default:
          reply({{ id: req.id, ok: false, error: 'unknown command: ' + req.cmd }});
      }}
    }} catch (error) {{
      reply({{ id: req.id, ok: false, error: error.message }});
    }}
  }}
}})().catch((error) => {{
  reply({{ id: 0, ok: false, error: error.message }});
  process.exit(1);
}});
"#,
        browser = config.browser.as_str(),
        headless = config.headless,
        base_url = base_url,
        width = config.viewport_width,
        height = config.viewport_height,
        storage_state = storage_state,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn controller_script_wires_config() {
        let config = PlaywrightConfig {
            base_url: "http://127.0.0.1:9999".into(),
            browser: Browser::Firefox,
            headless: false,
            viewport_width: 1920,
            viewport_height: 1080,
            storage_state: None,
        };
        let script = controller_script(&config);
        assert!(script.contains("firefox.launch({ headless: false })"));
        assert!(script.contains(r#"baseURL: "http://127.0.0.1:9999""#));
        assert!(script.contains("width: 1920, height: 1080"));
        assert!(!script.contains("storageState: \""));
    }

    #[test]
    fn controller_script_injects_storage_state() {
        let config = PlaywrightConfig {
            storage_state: Some(PathBuf::from("/srv/auth/customer.json")),
            ..Default::default()
        };
        let script = controller_script(&config);
        assert!(script.contains(r#"storageState: "/srv/auth/customer.json""#));
        // The restored context must not re-run the login flow.
        assert!(script.contains("case 'storageState'"));
    }

    #[test]
    fn relative_storage_state_is_anchored_to_harness_cwd() {
        let config = PlaywrightConfig {
            storage_state: Some(PathBuf::from("playwright/.auth/customer.json")),
            ..Default::default()
        };
        let script = controller_script(&config);

        let marker = "storageState: \"";
        let start = script.find(marker).expect("storageState missing") + marker.len();
        let end = start + script[start..].find('"').expect("unterminated path");
        let embedded = Path::new(&script[start..end]);

        // The controller runs from a scratch dir; only an absolute
        // path survives that.
        assert!(embedded.is_absolute(), "embedded path: {}", embedded.display());
        assert!(embedded.ends_with("playwright/.auth/customer.json"));
    }

    #[test]
    fn default_config_is_headless_chromium() {
        let config = PlaywrightConfig::default();
        assert!(config.headless);
        assert!(matches!(config.browser, Browser::Chromium));
        assert!(config.storage_state.is_none());
    }
}
