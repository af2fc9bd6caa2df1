//! Browser executor - wraps the agent-browser CLI
//!
//! Implements [`Browser`] by shelling out to `agent-browser`, one named
//! session per run.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::browser::traits::Browser;
use crate::core::config::BrowserConfig;
use crate::core::{Coordinates, InspectorError, Result, ScrollDirection, VariableString};

/// Pixels moved by one scroll step
const SCROLL_STEP_PX: u32 = 500;

/// Executor for browser automation via agent-browser CLI
pub struct AgentBrowser {
    /// Session name for isolation
    session_name: String,
    /// Whether to run in headed mode
    headed: bool,
    /// Minimum settling time before a page is considered stable
    min_page_load: Duration,
    /// Upper bound for a single CLI call
    timeout: Duration,
}

impl AgentBrowser {
    /// Create a new browser executor
    pub fn new(session_name: impl Into<String>) -> Self {
        Self {
            session_name: session_name.into(),
            headed: false,
            min_page_load: Duration::from_millis(600),
            timeout: Duration::from_secs(30),
        }
    }

    /// Create an executor from browser settings
    pub fn from_config(config: &BrowserConfig) -> Self {
        Self {
            session_name: config.session_name.clone(),
            headed: config.headed,
            min_page_load: Duration::from_millis(config.min_page_load_ms),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    /// Use a different session name, keeping every other setting
    pub fn with_session(mut self, session_name: impl Into<String>) -> Self {
        self.session_name = session_name.into();
        self
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    /// Check if agent-browser is installed
    pub async fn is_available() -> bool {
        Command::new("agent-browser")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Run an agent-browser command
    async fn run_command(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new("agent-browser");
        cmd.args(["--session", &self.session_name]);

        if self.headed {
            cmd.arg("--headed");
        }

        cmd.args(args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        tracing::trace!(session = %self.session_name, command = args.first().copied().unwrap_or(""), "agent-browser");

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| {
                InspectorError::browser(format!(
                    "agent-browser '{}' timed out after {:?}",
                    args.first().copied().unwrap_or(""),
                    self.timeout
                ))
            })?
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    InspectorError::AgentBrowserNotFound
                } else {
                    InspectorError::browser(format!("Failed to run agent-browser: {}", e))
                }
            })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(InspectorError::browser(format!(
                "agent-browser command failed: {}",
                stderr.trim()
            )))
        }
    }

    /// Run a command and unwrap the `--json` envelope
    async fn run_json_command(&self, args: &[&str]) -> Result<serde_json::Value> {
        let mut full_args: Vec<&str> = args.to_vec();
        full_args.push("--json");
        let output = self.run_command(&full_args).await?;
        parse_envelope(&output)
    }

    async fn mouse_click(&self, at: Coordinates) -> Result<()> {
        let x = format!("{:.0}", at.x);
        let y = format!("{:.0}", at.y);
        self.run_command(&["mouse", "move", &x, &y]).await?;
        self.run_command(&["mouse", "down"]).await?;
        self.run_command(&["mouse", "up"]).await?;
        Ok(())
    }
}

/// Unwrap the `{"success", "data", "error"}` envelope printed in `--json` mode.
/// Output without an envelope is returned as-is.
fn parse_envelope(output: &str) -> Result<serde_json::Value> {
    let trimmed = output.trim();
    let value: serde_json::Value = match serde_json::from_str(trimmed) {
        Ok(value) => value,
        Err(_) => return Ok(serde_json::Value::String(trimmed.to_string())),
    };

    let Some(success) = value.get("success").and_then(|s| s.as_bool()) else {
        return Ok(value);
    };

    if !success {
        let error = value
            .get("error")
            .and_then(|e| e.as_str())
            .unwrap_or("agent-browser reported failure");
        return Err(InspectorError::browser(error));
    }

    let data = value.get("data").cloned().unwrap_or(serde_json::Value::Null);
    Ok(match data.get("result") {
        Some(result) => result.clone(),
        None => data,
    })
}

/// Arguments for typing `text`. Everything after `--` is positional, so text
/// starting with `-` is never read as a flag.
fn keyboard_type_args(text: &str) -> [&str; 4] {
    ["keyboard", "type", "--", text]
}

#[async_trait]
impl Browser for AgentBrowser {
    async fn launch(&self, url: &str) -> Result<()> {
        tracing::info!(session = %self.session_name, "Launching browser session");
        self.run_command(&["open", url]).await?;
        // networkidle never arrives on pages with long polling
        if let Err(e) = self.run_command(&["wait", "--load", "networkidle"]).await {
            tracing::debug!(error = %e, "Page did not reach network idle");
        }
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        self.run_command(&["get", "url"])
            .await
            .map(|s| s.trim().to_string())
    }

    async fn wait_for_stable(&self) -> Result<()> {
        let load = self.run_command(&["wait", "--load", "domcontentloaded"]);
        let (load, _) = tokio::join!(load, tokio::time::sleep(self.min_page_load));
        load.map(|_| ())
    }

    async fn click(&self, at: Coordinates) -> Result<()> {
        tracing::debug!(%at, "Clicking");
        self.mouse_click(at).await
    }

    async fn type_at(&self, at: Coordinates, text: &VariableString) -> Result<()> {
        tracing::debug!(%at, text = %text.masked_value(), "Typing");
        self.mouse_click(at).await?;

        let resolved = text.resolved_value();
        self.run_command(&keyboard_type_args(&resolved)).await?;
        Ok(())
    }

    async fn scroll(&self, direction: ScrollDirection) -> Result<()> {
        let px = SCROLL_STEP_PX.to_string();
        let dir = direction.to_string();
        self.run_command(&["scroll", &dir, &px]).await?;
        tokio::time::sleep(Duration::from_millis(300)).await;
        Ok(())
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        self.run_command(&["open", url]).await?;
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        self.run_json_command(&["eval", script]).await
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        let path = std::env::temp_dir().join(format!(
            "{}-{:016x}.png",
            self.session_name,
            rand::random::<u64>()
        ));
        let path_str = path.to_string_lossy().into_owned();

        self.run_command(&["screenshot", &path_str]).await?;
        let bytes = tokio::fs::read(&path).await?;
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::debug!(error = %e, path = %path_str, "Could not remove screenshot file");
        }
        Ok(bytes)
    }

    async fn close(&self) -> Result<()> {
        tracing::info!(session = %self.session_name, "Closing browser session");
        self.run_command(&["close"]).await?;
        Ok(())
    }
}

impl Default for AgentBrowser {
    fn default() -> Self {
        Self::new("webinspector")
    }
}
