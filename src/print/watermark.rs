//! Watermark configuration and scoped application

use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use super::document::DocumentCore;

/// Text drawn diagonally across the middle of every page
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiagonalWatermark {
    pub font_size: f32,
    pub font_family: String,
    pub color: String,
    /// 0 to 100
    pub opacity: u8,
    pub text: String,
}

/// Text drawn along the top edge of every page
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HeaderWatermark {
    pub font_size: f32,
    pub font_family: String,
    pub color: String,
    /// 0 to 100
    pub opacity: u8,
    #[serde(default)]
    pub left: String,
    #[serde(default)]
    pub center: String,
    #[serde(default)]
    pub right: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WatermarkConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagonal: Option<DiagonalWatermark>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<HeaderWatermark>,
}

impl WatermarkConfig {
    /// The cleared watermark
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.diagonal.is_none() && self.header.is_none()
    }

    /// Shown while the watermark settings are open
    #[must_use]
    pub fn preview() -> Self {
        Self {
            diagonal: Some(DiagonalWatermark {
                font_size: 25.0,
                font_family: "sans-serif".to_string(),
                color: "red".to_string(),
                opacity: 50,
                text: "Watermark".to_string(),
            }),
            header: Some(HeaderWatermark {
                font_size: 10.0,
                font_family: "sans-serif".to_string(),
                color: "red".to_string(),
                opacity: 70,
                left: "left watermark".to_string(),
                center: "center watermark".to_string(),
                right: String::new(),
            }),
        }
    }
}

/// True when nothing is drawn, i.e. absent or empty
#[must_use]
pub fn is_unset(watermark: Option<&WatermarkConfig>) -> bool {
    watermark.is_none_or(WatermarkConfig::is_empty)
}

/// Applies a watermark for as long as the guard lives and puts back whatever
/// was active before, on every exit path
pub struct WatermarkGuard {
    core: Arc<dyn DocumentCore>,
    previous: Option<WatermarkConfig>,
}

impl WatermarkGuard {
    #[must_use]
    pub fn apply(core: Arc<dyn DocumentCore>, watermark: Option<WatermarkConfig>) -> Self {
        let previous = core.watermark();
        debug!(
            "Applying print watermark (set: {}, previous set: {})",
            !is_unset(watermark.as_ref()),
            !is_unset(previous.as_ref())
        );
        core.set_watermark(watermark);
        Self { core, previous }
    }

    /// Watermark that will be restored
    #[must_use]
    pub fn previous(&self) -> Option<&WatermarkConfig> {
        self.previous.as_ref()
    }
}

impl Drop for WatermarkGuard {
    fn drop(&mut self) {
        debug!("Restoring watermark after print");
        self.core.set_watermark(self.previous.take());
    }
}
