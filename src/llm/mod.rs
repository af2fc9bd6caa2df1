//! LLM module - Language Model integrations
//!
//! Provides the provider abstraction used by the planner and evaluator, with
//! Ollama as the bundled backend.

pub mod ollama;
pub mod traits;

pub use ollama::OllamaClient;
pub use traits::{GenerateOptions, LLMProvider, LLMResponse, TokenUsage};
