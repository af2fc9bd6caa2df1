//! Custom error types for webinspector
//!
//! Provides a unified error handling system across all modules.

use thiserror::Error;

/// Main error type for webinspector operations
#[derive(Error, Debug)]
pub enum InspectorError {
    /// Ollama connection or API errors
    #[error("Ollama error: {0}")]
    Ollama(String),

    /// Browser automation errors
    #[error("Browser error: {0}")]
    Browser(String),

    /// The planner returned nothing usable
    #[error("Planner error: {0}")]
    Planner(String),

    /// The evaluator returned nothing usable
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A highlight index that is not part of the current snapshot
    #[error("Element index {0} not found in the current page snapshot")]
    UnknownIndex(usize),

    /// Ledger update for a task that was never appended
    #[error("Task '{0}' is not in the ledger")]
    UnknownTask(String),

    /// Ledger append with an id that is already present
    #[error("Task '{0}' is already in the ledger")]
    DuplicateTask(String),

    /// The end goal can only be set once per run
    #[error("End goal has already been set for this run")]
    EndGoalAlreadySet,

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Agent-browser not installed
    #[error("agent-browser not found. Install with: npm install -g agent-browser && agent-browser install")]
    AgentBrowserNotFound,

    /// Model not available
    #[error("Model '{0}' not available in Ollama. Run: ollama pull {0}")]
    ModelNotFound(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Convenience Result type for webinspector operations
pub type Result<T> = std::result::Result<T, InspectorError>;

impl InspectorError {
    /// Create an Ollama error
    pub fn ollama(msg: impl Into<String>) -> Self {
        Self::Ollama(msg.into())
    }

    /// Create a browser error
    pub fn browser(msg: impl Into<String>) -> Self {
        Self::Browser(msg.into())
    }

    /// Create a planner error
    pub fn planner(msg: impl Into<String>) -> Self {
        Self::Planner(msg.into())
    }

    /// Create an evaluation error
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Wrap an error with additional context
    pub fn with_context<E>(context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::WithContext {
            context: context.into(),
            source: Box::new(error),
        }
    }
}
