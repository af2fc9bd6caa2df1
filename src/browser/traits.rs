//! Browser and screenshot collaborator traits
//!
//! The agent drives exactly one browser session per run through these traits.
//! Coordinates are CSS pixels in the same viewport the page snapshot was taken in.

use async_trait::async_trait;

use crate::core::{Coordinates, Result, ScrollDirection, VariableString};

/// A single browser session
#[async_trait]
pub trait Browser: Send + Sync {
    /// Start the session and open the first page
    async fn launch(&self, url: &str) -> Result<()>;

    /// URL of the current page
    async fn current_url(&self) -> Result<String>;

    /// Wait until the page has settled enough to be observed
    async fn wait_for_stable(&self) -> Result<()>;

    /// Click at a viewport position
    async fn click(&self, at: Coordinates) -> Result<()>;

    /// Focus the element at a position and type into it.
    ///
    /// Implementations must send `text.resolved_value()` to the page and must
    /// only ever log `text.masked_value()`.
    async fn type_at(&self, at: Coordinates, text: &VariableString) -> Result<()>;

    /// Scroll the page by one step
    async fn scroll(&self, direction: ScrollDirection) -> Result<()>;

    /// Navigate the current tab
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Evaluate a script in the page and return its JSON result
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value>;

    /// Capture the viewport as PNG bytes
    async fn screenshot(&self) -> Result<Vec<u8>>;

    /// End the session
    async fn close(&self) -> Result<()>;
}

/// Turns the current page into an image URI a model can consume
#[async_trait]
pub trait Screenshotter: Send + Sync {
    async fn take_screenshot(&self, browser: &dyn Browser) -> Result<String>;
}
