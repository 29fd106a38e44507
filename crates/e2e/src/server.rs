//! App server management - spawning and readiness-checking the
//! frontend preview server

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{E2eError, E2eResult};

/// Handle to a running preview server process.
pub struct AppServer {
    child: Child,
    pub base_url: String,
    pub port: u16,
}

impl AppServer {
    /// Spawn the preview server and wait until it serves the readiness
    /// path.
    pub async fn spawn(config: ServerConfig) -> E2eResult<Self> {
        let port = config.port.unwrap_or_else(find_free_port);
        let base_url = format!("http://127.0.0.1:{port}");

        info!(port, command = %config.command, "spawning preview server");

        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args)
            .arg("--host")
            .arg("127.0.0.1")
            .arg("--port")
            .arg(port.to_string())
            .current_dir(&config.workdir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let child = cmd.spawn().map_err(|e| {
            E2eError::ServerStartup(format!("failed to spawn '{}': {e}", config.command))
        })?;

        let server = AppServer {
            child,
            base_url: base_url.clone(),
            port,
        };

        server
            .wait_for_ready(&config.readiness_path, config.startup_timeout)
            .await?;

        info!(%base_url, "preview server is ready");
        Ok(server)
    }

    /// Poll the readiness path until the server answers with a success
    /// status.
    async fn wait_for_ready(&self, path: &str, timeout: Duration) -> E2eResult<()> {
        let url = format!("{}{path}", self.base_url);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;

        let start = std::time::Instant::now();
        let mut attempts = 0;

        while start.elapsed() < timeout {
            attempts += 1;

            match client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => return Ok(()),
                Ok(resp) => {
                    warn!(status = %resp.status(), "readiness check not passing yet");
                }
                Err(e) => {
                    if attempts == 1 {
                        info!("waiting for preview server to start...");
                    }
                    // Connection refused is expected while it boots.
                    if !e.is_connect() {
                        warn!(error = %e, "readiness check error");
                    }
                }
            }

            sleep(Duration::from_millis(100)).await;
        }

        Err(E2eError::ServerHealthCheck(attempts))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Stop the server, SIGTERM first, then kill.
    pub fn stop(&mut self) -> E2eResult<()> {
        info!(pid = self.child.id(), "stopping preview server");

        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let pid = Pid::from_raw(self.child.id() as i32);
            if kill(pid, Signal::SIGTERM).is_ok() {
                std::thread::sleep(Duration::from_millis(500));
            }
        }

        let _ = self.child.kill();
        let _ = self.child.wait();

        Ok(())
    }
}

impl Drop for AppServer {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Configuration for spawning the preview server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Command that starts the server.
    pub command: String,

    /// Arguments before the generated `--host`/`--port` pair.
    pub args: Vec<String>,

    /// Working directory holding the frontend build.
    pub workdir: PathBuf,

    /// Port to listen on (None = find a free port).
    pub port: Option<u16>,

    /// Path that must answer 2xx before tests start.
    pub readiness_path: String,

    /// Timeout for server startup.
    pub startup_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            command: "npm".to_string(),
            args: vec!["run".into(), "preview".into(), "--".into()],
            workdir: PathBuf::from("."),
            port: None,
            readiness_path: "/login".to_string(),
            startup_timeout: Duration::from_secs(30),
        }
    }
}

/// Find a free port to use.
fn find_free_port() -> u16 {
    use std::net::TcpListener;

    TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to find free port")
        .local_addr()
        .expect("Failed to get local addr")
        .port()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_free_port() {
        let port1 = find_free_port();
        let port2 = find_free_port();

        assert!(port1 > 1024);
        assert!(port2 > 1024);
    }

    #[test]
    fn default_config_targets_the_preview_build() {
        let config = ServerConfig::default();
        assert_eq!(config.command, "npm");
        assert_eq!(config.readiness_path, "/login");
        assert!(config.port.is_none());
    }
}
