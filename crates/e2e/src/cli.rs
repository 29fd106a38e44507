//! CLI surface of the e2e entry point
//!
//! Lives in the library so the argument contract is covered by unit
//! tests; the `harness = false` test binary only parses and dispatches.

use std::path::PathBuf;
use clap::Parser;

use crate::playwright::{Browser, PlaywrightConfig};
use crate::runner::RunnerConfig;
use crate::server::ServerConfig;

#[derive(Parser, Debug)]
#[command(name = "couponly-e2e")]
#[command(about = "E2E test runner for Couponly")]
pub struct Args {
    /// Path to test specs directory
    #[arg(short, long, default_value = "specs")]
    pub specs: PathBuf,

    /// Run only tests matching this tag
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Run only a specific test by name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Directory holding the persisted per-role sessions
    #[arg(long, default_value = "playwright/.auth")]
    pub auth_dir: PathBuf,

    /// Target an already-running app instead of spawning the preview
    /// server
    #[arg(long)]
    pub no_server: bool,

    /// Base URL of the app when --no-server is set
    #[arg(long, default_value = "http://127.0.0.1:4173")]
    pub base_url: String,

    /// Command that starts the preview server
    #[arg(long, default_value = "npm")]
    pub server_command: String,

    /// Working directory of the frontend build
    #[arg(long, default_value = ".")]
    pub app_dir: PathBuf,

    /// Port to run the server on (0 = auto)
    #[arg(long, default_value = "0")]
    pub port: u16,

    /// Browser to use (chromium, firefox, webkit)
    #[arg(long, default_value = "chromium")]
    pub browser: String,

    /// Run in headless mode (pass `--headless false` for a visible
    /// browser)
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub headless: bool,

    /// Keep persisted sessions after the run (skips the cleanup phase)
    #[arg(long)]
    pub keep_sessions: bool,

    /// Output directory for results
    #[arg(short, long, default_value = "test-results")]
    pub output: PathBuf,
}

impl Args {
    /// Translate the parsed arguments into a runner configuration.
    pub fn runner_config(&self) -> RunnerConfig {
        let browser = match self.browser.as_str() {
            "firefox" => Browser::Firefox,
            "webkit" => Browser::Webkit,
            _ => Browser::Chromium,
        };

        let server = if self.no_server {
            None
        } else {
            Some(ServerConfig {
                command: self.server_command.clone(),
                workdir: self.app_dir.clone(),
                port: if self.port == 0 { None } else { Some(self.port) },
                ..Default::default()
            })
        };

        RunnerConfig {
            server,
            playwright: PlaywrightConfig {
                base_url: self.base_url.clone(),
                browser,
                headless: self.headless,
                ..Default::default()
            },
            auth_dir: self.auth_dir.clone(),
            specs_dir: self.specs.clone(),
            output_dir: self.output.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_defaults_on_and_can_be_disabled() {
        let args = Args::try_parse_from(["couponly-e2e"]).unwrap();
        assert!(args.headless);
        assert!(args.runner_config().playwright.headless);

        let args = Args::try_parse_from(["couponly-e2e", "--headless", "false"]).unwrap();
        assert!(!args.headless);
        assert!(!args.runner_config().playwright.headless);
    }

    #[test]
    fn no_server_targets_running_app() {
        let args = Args::try_parse_from([
            "couponly-e2e",
            "--no-server",
            "--base-url",
            "http://127.0.0.1:5000",
        ])
        .unwrap();
        let config = args.runner_config();
        assert!(config.server.is_none());
        assert_eq!(config.playwright.base_url, "http://127.0.0.1:5000");
    }

    #[test]
    fn browser_and_port_flow_into_config() {
        let args = Args::try_parse_from([
            "couponly-e2e",
            "--browser",
            "firefox",
            "--port",
            "8080",
        ])
        .unwrap();
        let config = args.runner_config();
        assert!(matches!(config.playwright.browser, Browser::Firefox));
        let server = config.server.expect("server expected by default");
        assert_eq!(server.port, Some(8080));
    }
}
