//! CLI module - command-line interface
//!
//! Contains the case runner and the terminal reporter.

pub mod commands;
pub mod reporter;

pub use commands::{CaseFile, CaseReport, Runner, TestCase};
pub use reporter::ConsoleReporter;
