//! Typed `ScreenshotManager` façade

use bridge_traits::contracts::screenshot_manager::TAKE_SCREENSHOT;
use core_registry::ModuleProxy;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::{CoreError, Result};

/// Capture target naming the whole application window.
pub const WINDOW_TARGET: &str = "window";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
}

/// Capture options passed through to the native module.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenshotOptions {
    pub format: ImageFormat,
    /// Compression quality in `0.0..=1.0`; only meaningful for JPEG
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<f64>,
}

impl ScreenshotOptions {
    pub fn jpeg(quality: f64) -> Self {
        Self {
            format: ImageFormat::Jpeg,
            quality: Some(quality),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self.quality {
            Some(q) if !(0.0..=1.0).contains(&q) => Err(CoreError::InvalidInput(format!(
                "screenshot quality must be within 0.0..=1.0 (got {})",
                q
            ))),
            _ => Ok(()),
        }
    }

    fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(|e| CoreError::InvalidInput(e.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct ScreenshotManager {
    proxy: Arc<ModuleProxy>,
}

impl ScreenshotManager {
    pub fn new(proxy: Arc<ModuleProxy>) -> Self {
        Self { proxy }
    }

    pub fn proxy(&self) -> &Arc<ModuleProxy> {
        &self.proxy
    }

    /// Capture `target` and return the URI of the stored image.
    pub async fn take_screenshot(
        &self,
        target: &str,
        options: &ScreenshotOptions,
    ) -> Result<String> {
        options.validate()?;
        let value = self
            .proxy
            .call(TAKE_SCREENSHOT, vec![json!(target), options.to_value()?])
            .await?;
        screenshot_uri(value)
    }
}

fn screenshot_uri(value: Value) -> Result<String> {
    match value {
        Value::String(uri) => Ok(uri),
        other => Err(CoreError::UnexpectedResponse(format!(
            "{} returned {} instead of a URI",
            TAKE_SCREENSHOT, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_wire_format() {
        let value = ScreenshotOptions::jpeg(0.8).to_value().unwrap();
        assert_eq!(value, json!({ "format": "jpeg", "quality": 0.8 }));

        let value = ScreenshotOptions::default().to_value().unwrap();
        assert_eq!(value, json!({ "format": "png" }));
    }

    #[test]
    fn test_non_string_uri_is_an_error() {
        assert_eq!(
            screenshot_uri(json!("file:///tmp/a.png")).unwrap(),
            "file:///tmp/a.png"
        );
        let err = screenshot_uri(json!({ "uri": "file:///tmp/a.png" })).unwrap_err();
        assert!(matches!(
            err,
            CoreError::UnexpectedResponse(msg) if msg.contains("takeScreenshot")
        ));
    }

    #[test]
    fn test_quality_out_of_range() {
        let err = ScreenshotOptions::jpeg(1.5).validate().unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(msg) if msg.contains("quality")));
    }
}
