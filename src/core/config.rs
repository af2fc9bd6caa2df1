//! Configuration management for webinspector
//!
//! Supports environment variables, config files, and runtime overrides.
//!
//! Config file location: ~/.config/webinspector/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::core::error::{InspectorError, Result};

/// Main configuration for webinspector
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ollama configuration
    pub ollama: OllamaConfig,
    /// Model configuration
    pub models: ModelConfig,
    /// Browser configuration
    pub browser: BrowserConfig,
    /// Agent configuration
    pub agent: AgentConfig,
    /// Batch runner configuration
    pub batch: BatchConfig,
}

/// Ollama server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Host address (default: localhost)
    pub host: String,
    /// Port number (default: 11434)
    pub port: u16,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Vision model that plans the next actions
    pub planner: String,
    /// Vision model that gives the final verdict
    pub evaluator: String,
    /// Sampling temperature used for both models
    pub temperature: f32,
}

/// Browser automation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Session name for agent-browser
    pub session_name: String,
    /// Whether to run in headed mode (visible browser)
    pub headed: bool,
    /// Default timeout for browser operations in ms
    pub timeout_ms: u64,
    /// Minimum time to wait for a page to settle before observing it
    pub min_page_load_ms: u64,
    /// Extra pixels around the viewport in which elements stay addressable.
    /// `0` restricts to the visible viewport, `-1` disables the spatial filter.
    pub viewport_expansion: i64,
    /// Draw numbered boxes over addressable elements
    pub highlight: bool,
}

/// Agent behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Consecutive failures tolerated before the run is failed
    /// Default: 5
    pub max_retries: usize,
    /// Maximum actions executed from a single plan
    /// Default: 5
    pub max_actions_per_task: usize,
    /// Pause after every successful action, in ms
    pub settle_delay_ms: u64,
    /// Cancel the rest of a plan when the page changed underneath it
    pub replan_on_dom_change: bool,
    /// Optional wall-clock limit for a whole run
    pub run_timeout_secs: Option<u64>,
    /// Whether to show debug output
    pub debug: bool,
}

/// Batch runner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Number of cases run at the same time, each with its own browser session
    pub concurrency: usize,
}

fn default_temperature() -> f32 {
    0.1
}

fn parsed<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(variable = name, value = %raw, "Ignoring unparseable environment override");
            None
        }
    }
}

fn parse_flag(value: &str) -> bool {
    value == "true" || value == "1"
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 11434,
            timeout_secs: 180,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            planner: "qwen2.5vl:7b".to_string(),
            evaluator: "qwen2.5vl:7b".to_string(),
            temperature: default_temperature(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            session_name: "webinspector".to_string(),
            headed: false,
            timeout_ms: 30000,
            min_page_load_ms: 600,
            viewport_expansion: 0,
            highlight: true,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            max_actions_per_task: 5,
            settle_delay_ms: 1000,
            replan_on_dom_change: true,
            run_timeout_secs: None,
            debug: false,
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { concurrency: 1 }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("webinspector")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > env vars > config file > defaults
    ///
    /// A missing file means defaults. An unreadable or malformed file is
    /// reported and ignored. Validation is left to the caller, after CLI
    /// overrides have been applied.
    pub fn load() -> Self {
        let _ = dotenvy::dotenv();

        let mut config = match Self::load_from_file() {
            Ok(Some(config)) => config,
            Ok(None) => Self::default(),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    path = %Self::config_file().display(),
                    "Ignoring config file"
                );
                Self::default()
            }
        };
        config.apply_env();
        config
    }

    /// Load configuration from file only. `Ok(None)` when there is no file.
    pub fn load_from_file() -> Result<Option<Self>> {
        let config_path = Self::config_file();

        if !config_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| InspectorError::config(format!("Failed to read config: {}", e)))?;

        Self::from_toml(&content).map(Some)
    }

    /// Parse a config file; absent sections and fields take their defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| InspectorError::config(format!("Failed to parse config: {}", e)))
    }

    /// Apply `WEBINSPECTOR_*` and `OLLAMA_*` overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_with(|name| env::var(name).ok());
    }

    /// Apply environment overrides read through `lookup`.
    /// Unparseable numbers are reported and skipped.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("OLLAMA_HOST") {
            self.ollama.host = host;
        }
        if let Some(port) = parsed(&lookup, "OLLAMA_PORT") {
            self.ollama.port = port;
        }
        if let Some(model) = lookup("WEBINSPECTOR_PLANNER_MODEL") {
            self.models.planner = model;
        }
        if let Some(model) = lookup("WEBINSPECTOR_EVALUATOR_MODEL") {
            self.models.evaluator = model;
        }
        if let Some(session) = lookup("WEBINSPECTOR_BROWSER_SESSION") {
            self.browser.session_name = session;
        }
        if let Some(headed) = lookup("WEBINSPECTOR_BROWSER_HEADED") {
            self.browser.headed = parse_flag(&headed);
        }
        if let Some(max_retries) = parsed(&lookup, "WEBINSPECTOR_MAX_RETRIES") {
            self.agent.max_retries = max_retries;
        }
        if let Some(debug) = lookup("WEBINSPECTOR_DEBUG") {
            self.agent.debug = parse_flag(&debug);
        }
    }

    /// Write this configuration to the config file, creating its directory
    pub fn save(&self) -> Result<PathBuf> {
        let config_dir = Self::config_dir();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir).map_err(|e| {
                InspectorError::config(format!("Failed to create config dir: {}", e))
            })?;
        }

        let path = Self::config_file();
        fs::write(&path, self.to_toml()?)
            .map_err(|e| InspectorError::config(format!("Failed to write config: {}", e)))?;

        Ok(path)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| InspectorError::config(format!("Failed to serialize config: {}", e)))
    }

    /// Reject settings the agent cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.agent.max_retries == 0 {
            return Err(InspectorError::config("agent.max_retries must be at least 1"));
        }
        if self.agent.max_actions_per_task == 0 {
            return Err(InspectorError::config(
                "agent.max_actions_per_task must be at least 1",
            ));
        }
        if self.batch.concurrency == 0 {
            return Err(InspectorError::config("batch.concurrency must be at least 1"));
        }
        if self.browser.viewport_expansion < -1 {
            return Err(InspectorError::config(
                "browser.viewport_expansion must be -1 (disabled) or a pixel count",
            ));
        }
        Ok(())
    }

    /// Get the full Ollama API URL
    pub fn ollama_url(&self) -> String {
        format!("http://{}:{}", self.ollama.host, self.ollama.port)
    }

}
