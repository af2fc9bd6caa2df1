//! Shared types used across webinspector modules
//!
//! Contains model messages, page coordinates, and the test verdict.

use serde::{Deserialize, Serialize};

/// A message sent to a language model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender (user, assistant, system)
    pub role: String,
    /// Content of the message
    pub content: String,
    /// Attached images as URIs (usually `data:image/png;base64,...`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

impl Message {
    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
            images: Vec::new(),
        }
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
            images: Vec::new(),
        }
    }

    /// Attach an image URI to the message
    pub fn with_image(mut self, uri: impl Into<String>) -> Self {
        self.images.push(uri.into());
        self
    }
}

/// A point in the page viewport, in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
}

impl Coordinates {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.0}, {:.0})", self.x, self.y)
    }
}

/// Direction of a page scroll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    Down,
    Up,
}

impl std::fmt::Display for ScrollDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScrollDirection::Down => write!(f, "down"),
            ScrollDirection::Up => write!(f, "up"),
        }
    }
}

/// Outcome of a test run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Passed,
    Failed,
}

impl std::fmt::Display for TestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestStatus::Passed => write!(f, "passed"),
            TestStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Final verdict of one run. Produced exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    pub status: TestStatus,
    pub reason: String,
}

impl TestResult {
    /// Create a passed result
    pub fn passed(reason: impl Into<String>) -> Self {
        Self {
            status: TestStatus::Passed,
            reason: reason.into(),
        }
    }

    /// Create a failed result
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: TestStatus::Failed,
            reason: reason.into(),
        }
    }

    pub fn is_passed(&self) -> bool {
        self.status == TestStatus::Passed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_images_skipped_when_empty() {
        let json = serde_json::to_string(&Message::user("hi")).unwrap();
        assert!(!json.contains("images"));

        let json = serde_json::to_string(&Message::user("hi").with_image("data:x")).unwrap();
        assert!(json.contains("\"images\":[\"data:x\"]"));
    }

    #[test]
    fn test_result_wire_format() {
        let result: TestResult =
            serde_json::from_str(r#"{"status":"passed","reason":"Logged in"}"#).unwrap();
        assert!(result.is_passed());
        assert_eq!(result.reason, "Logged in");

        let json = serde_json::to_string(&TestResult::failed("nope")).unwrap();
        assert_eq!(json, r#"{"status":"failed","reason":"nope"}"#);
    }
}
