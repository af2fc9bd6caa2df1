//! webinspector - Autonomous QA agent for web applications
//!
//! Give it a user story and a start URL; it drives a real browser step by step,
//! without pre-written selectors, until it can say whether the story passes.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, error handling and secret-safe variables
//! - **LLM**: LLM provider abstraction with Ollama implementation
//! - **Browser**: Browser and screenshot traits with an agent-browser backend
//! - **DOM**: Page capture, classification, indexing and hashing
//! - **Agent**: Controller state machine, task ledger, planner and evaluator
//! - **CLI**: Case runner and terminal reporter
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use webinspector::cli::{Runner, TestCase};
//! use webinspector::Config;
//!
//! #[tokio::main]
//! async fn main() {
//!     let runner = Runner::new(Config::load()).unwrap();
//!     let case = TestCase {
//!         start_url: "https://example.com".to_string(),
//!         user_story: "Open the 'More information' link. It works if IANA is shown.".to_string(),
//!     };
//!     let report = runner
//!         .run_case(1, "example".to_string(), case, Arc::from(Vec::new()))
//!         .await;
//!     println!("{}: {}", report.result.status, report.result.reason);
//! }
//! ```

pub mod agent;
pub mod browser;
pub mod cli;
pub mod core;
pub mod dom;
pub mod llm;

// Re-export commonly used items
pub use agent::AgentController;
pub use cli::Runner;
pub use core::{Config, InspectorError, Result, TestResult};
