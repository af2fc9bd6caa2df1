//! Core module - shared infrastructure for webinspector
//!
//! This module contains foundational types, configuration, error handling
//! and the secret-safe variable templating used throughout the application.

pub mod config;
pub mod error;
pub mod types;
pub mod variable;

pub use config::Config;
pub use error::{InspectorError, Result};
pub use types::*;
pub use variable::{redact_secrets, Variable, VariableSet, VariableString};
