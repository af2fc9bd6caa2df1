//! Screenshot store that keeps images inline
//!
//! Screenshots are handed to the models as `data:` URIs, so nothing has to be
//! persisted between the capture and the model call.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::browser::traits::{Browser, Screenshotter};
use crate::core::{InspectorError, Result};

/// Encodes PNG screenshots as `data:image/png;base64,...`
#[derive(Debug, Clone, Default)]
pub struct InlineScreenshotter;

impl InlineScreenshotter {
    pub fn new() -> Self {
        Self
    }

    /// Encode raw PNG bytes as a data URI
    pub fn to_data_uri(png: &[u8]) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(png))
    }
}

#[async_trait]
impl Screenshotter for InlineScreenshotter {
    async fn take_screenshot(&self, browser: &dyn Browser) -> Result<String> {
        let png = browser.screenshot().await?;
        if png.is_empty() {
            return Err(InspectorError::browser("Screenshot was empty"));
        }
        tracing::debug!(bytes = png.len(), "Captured screenshot");
        Ok(Self::to_data_uri(&png))
    }
}
