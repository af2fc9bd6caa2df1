//! Terminal progress output

use crate::agent::Reporter;

/// Prints progress lines to stderr, prefixed with the case label
#[derive(Debug, Clone)]
pub struct ConsoleReporter {
    label: String,
    quiet: bool,
}

impl ConsoleReporter {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            quiet: false,
        }
    }

    /// Only print failures
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    fn print(&self, symbol: &str, message: &str) {
        eprintln!("[{}] {} {}", self.label, symbol, message);
    }
}

impl Reporter for ConsoleReporter {
    fn loading(&self, message: &str) {
        if !self.quiet {
            self.print("…", message);
        }
    }

    fn success(&self, message: &str) {
        if !self.quiet {
            self.print("✓", message);
        }
    }

    fn failure(&self, message: &str) {
        self.print("✗", message);
    }

    fn info(&self, message: &str) {
        if !self.quiet {
            self.print("•", message);
        }
    }
}
