//! Progress reporting
//!
//! Reporters are passive observers. Messages never contain resolved secrets.

pub trait Reporter: Send + Sync {
    /// A step started
    fn loading(&self, message: &str);

    /// A step finished well
    fn success(&self, message: &str);

    /// A step failed
    fn failure(&self, message: &str);

    fn info(&self, message: &str);
}

/// Discards every message
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

impl Reporter for NoopReporter {
    fn loading(&self, _message: &str) {}
    fn success(&self, _message: &str) {}
    fn failure(&self, _message: &str) {}
    fn info(&self, _message: &str) {}
}
