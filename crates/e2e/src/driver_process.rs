//! WebDriver process management - spawning and health checking geckodriver

use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::WebDriverConfig;
use crate::error::{E2eError, E2eResult};

/// Handle to a running WebDriver process
pub struct DriverProcess {
    child: Option<Child>,
    url: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    value: StatusValue,
}

#[derive(Debug, Deserialize)]
struct StatusValue {
    ready: bool,
    #[serde(default)]
    message: String,
}

impl DriverProcess {
    /// Spawn the configured driver binary and wait until it accepts sessions
    pub async fn spawn(config: &WebDriverConfig) -> E2eResult<Self> {
        let port = match config.port {
            Some(port) => port,
            None => find_free_port()?,
        };
        let url = format!("http://127.0.0.1:{}", port);

        info!("Spawning {} on port {}", config.binary_path.display(), port);

        let child = Command::new(&config.binary_path)
            .arg("--port")
            .arg(port.to_string())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                E2eError::DriverStartup(format!(
                    "Failed to spawn {}: {}",
                    config.binary_path.display(),
                    e
                ))
            })?;

        let handle = DriverProcess {
            child: Some(child),
            url,
            port,
        };

        handle
            .wait_for_ready(Duration::from_millis(config.startup_timeout_ms))
            .await?;

        info!("WebDriver is ready at {}", handle.url);
        Ok(handle)
    }

    /// Poll `/status` until the driver reports ready
    async fn wait_for_ready(&self, timeout_duration: Duration) -> E2eResult<()> {
        let status_url = format!("{}/status", self.url);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;

        let start = Instant::now();
        let mut attempts = 0;

        while start.elapsed() < timeout_duration {
            attempts += 1;

            match client.get(&status_url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    match resp.json::<StatusResponse>().await {
                        Ok(status) if status.value.ready => return Ok(()),
                        Ok(status) => {
                            warn!("WebDriver not ready yet: {}", status.value.message);
                        }
                        Err(e) => warn!("Unreadable status response: {}", e),
                    }
                }
                Ok(resp) => {
                    warn!("Status check returned {}", resp.status());
                }
                Err(e) => {
                    if attempts == 1 {
                        info!("Waiting for WebDriver to start...");
                    }
                    // Connection refused is expected while the driver is starting
                    if !e.is_connect() {
                        warn!("Status check error: {}", e);
                    }
                }
            }

            sleep(Duration::from_millis(100)).await;
        }

        Err(E2eError::DriverHealthCheck(attempts))
    }

    /// Base URL for WebDriver sessions
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Stop the process from async code. Failures are logged, never returned,
    /// so a finished run keeps its outcome.
    pub async fn shutdown(&mut self) {
        if self.terminate() {
            sleep(Duration::from_millis(500)).await;
        }
        if let Err(e) = self.reap() {
            warn!("WebDriver did not stop cleanly: {}", e);
        }
    }

    /// Stop the process. Safe to call more than once.
    pub fn stop(&mut self) -> E2eResult<()> {
        if self.terminate() {
            std::thread::sleep(Duration::from_millis(500));
        }
        self.reap()
    }

    /// Ask the process to exit; true when SIGTERM was delivered
    fn terminate(&self) -> bool {
        let Some(child) = &self.child else {
            return false;
        };
        info!("Stopping WebDriver (pid: {})", child.id());

        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let pid = Pid::from_raw(child.id() as i32);
            if kill(pid, Signal::SIGTERM).is_ok() {
                return true;
            }
        }
        false
    }

    /// Force kill if still running
    fn reap(&mut self) -> E2eResult<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let _ = child.kill();
        child.wait()?;
        Ok(())
    }
}

impl Drop for DriverProcess {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Find a free port to use
fn find_free_port() -> E2eResult<u16> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|e| E2eError::DriverStartup(format!("No free port available: {}", e)))?;
    Ok(listener.local_addr()?.port())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_free_port() {
        let port1 = find_free_port().unwrap();
        let port2 = find_free_port().unwrap();

        // Ports should be in valid range
        assert!(port1 > 1024);
        assert!(port2 > 1024);
    }

    #[tokio::test]
    async fn test_missing_binary_fails_startup() {
        let dir = tempfile::tempdir().unwrap();
        let config = WebDriverConfig {
            binary_path: dir.path().join("geckodriver"),
            startup_timeout_ms: 200,
            ..WebDriverConfig::default()
        };

        assert!(matches!(
            DriverProcess::spawn(&config).await,
            Err(E2eError::DriverStartup(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shutdown_stops_child_and_is_repeatable() {
        let child = Command::new("sleep").arg("30").spawn().unwrap();
        let mut process = DriverProcess {
            child: Some(child),
            url: "http://127.0.0.1:0".to_string(),
            port: 0,
        };

        process.shutdown().await;
        assert!(process.child.is_none());

        process.shutdown().await;
        assert!(process.stop().is_ok());
    }

    #[test]
    fn test_status_payload() {
        let status: StatusResponse =
            serde_json::from_str(r#"{"value":{"ready":true,"message":""}}"#).unwrap();
        assert!(status.value.ready);
    }
}
